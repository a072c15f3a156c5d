//! Abstract evaluation of expressions.
//!
//! Evaluation computes the shape of what an expression produces (a number,
//! an object with known members, a function with a known return value)
//! rather than a concrete value. Anything that cannot be determined comes
//! out as `unknown`.

use tracing::debug;

use qmljs_ast::{Ast, BinaryOp, NodeId, NodeKind, UnaryOp, Visitor};

use crate::reference_context::{ReferenceContext, ReferenceContextHandle};
use crate::scope_chain::ScopeChain;
use crate::value::ValueRef;
use crate::value_owner::shared;

/// How many references may be resolved inside one another before
/// evaluation gives up.
///
/// This bounds precision, not correctness: cycles are caught by the
/// in-flight stack, but each nested reference evaluates its initializer on
/// the native stack. An acyclic chain deeper than this comes out `unknown`.
const MAX_REFERENCE_DEPTH: usize = 96;

/// Evaluates expressions in the scopes of a [`ScopeChain`].
pub struct Evaluate<'a> {
    chain: &'a ScopeChain,
    rc: ReferenceContextHandle<'a>,
    result: Option<ValueRef>,
    depth: u32,
}

impl<'a> Evaluate<'a> {
    pub fn new(chain: &'a ScopeChain) -> Self {
        Self {
            rc: ReferenceContextHandle::Owned(ReferenceContext::new(chain.context().clone())),
            chain,
            result: None,
            depth: 0,
        }
    }

    /// Share the in-flight references of `rc`, so that an expression that
    /// depends on the reference being resolved stops instead of recursing.
    pub fn with_reference_context(chain: &'a ScopeChain, rc: &'a ReferenceContext) -> Self {
        Self {
            chain,
            rc: ReferenceContextHandle::Borrowed(rc),
            result: None,
            depth: 0,
        }
    }

    pub fn scope_chain(&self) -> &ScopeChain {
        self.chain
    }

    /// The value of `node` with references resolved; `unknown` when it
    /// cannot be determined.
    pub fn value(&mut self, node: Option<NodeId>) -> ValueRef {
        let Some(result) = self.reference(node) else {
            return shared().unknown();
        };
        if !result.is_reference() {
            return result;
        }
        if self.rc.depth() >= MAX_REFERENCE_DEPTH {
            debug!(depth = self.rc.depth(), "reference nesting too deep");
            return shared().unknown();
        }
        match self.rc.lookup_reference(&result) {
            Some(value) if !value.is_reference() => value,
            _ => shared().unknown(),
        }
    }

    /// The value of `node` as found, possibly a reference. `None` when
    /// nothing is known about it.
    pub fn reference(&mut self, node: Option<NodeId>) -> Option<ValueRef> {
        let previous = self.switch_result(None);
        let chain = self.chain;
        chain.document().ast().accept(node, self);
        self.switch_result(previous)
    }

    /// Replace the pending result, returning the old one.
    pub fn switch_result(&mut self, result: Option<ValueRef>) -> Option<ValueRef> {
        std::mem::replace(&mut self.result, result)
    }

    fn evaluate(&mut self, ast: &Ast, node: NodeId) -> Option<ValueRef> {
        let builtins = shared();
        match ast.kind(node)? {
            NodeKind::UiQualifiedId(qualified_id) => self.qualified_id(&qualified_id.segments),
            NodeKind::UiScriptBinding(binding) => self.reference(binding.statement),
            NodeKind::UiPublicMember(member) => self.reference(member.statement),
            NodeKind::ExpressionStatement { expression } => self.reference(*expression),
            NodeKind::NestedExpression { expression } => self.reference(*expression),
            NodeKind::Expression { right, .. } => self.reference(*right),

            NodeKind::IdentifierExpression { name } => Some(self.chain.lookup(name)),
            NodeKind::ThisExpression => None,
            NodeKind::NullExpression => Some(builtins.null()),
            NodeKind::TrueLiteral | NodeKind::FalseLiteral => Some(builtins.boolean()),
            NodeKind::StringLiteral { .. } => Some(builtins.string()),
            NodeKind::NumericLiteral { .. } => Some(builtins.number()),
            NodeKind::RegExpLiteral { .. } => builtins.regexp_ctor().as_function().map(|f| f.return_value()),
            NodeKind::ArrayLiteral { .. } => Some(builtins.array_instance()),
            NodeKind::ObjectLiteral { .. } => None,

            NodeKind::FunctionExpression(_) | NodeKind::FunctionDeclaration(_) => {
                self.chain.document().bind().find_function(node)
            }

            NodeKind::FieldMemberExpression { base, name } => {
                if name.is_empty() {
                    return None;
                }
                let base = self.value(*base);
                let object = self.chain.context().value_owner().convert_to_object(&base)?;
                object.lookup_member(name, Some(self.chain.context()))
            }
            NodeKind::ArrayMemberExpression { .. } => None,

            NodeKind::CallExpression(call) | NodeKind::NewMemberExpression(call) => {
                let callee = self.value(call.base);
                callee.as_function().map(|f| f.return_value())
            }
            NodeKind::NewExpression { expression } => {
                let callee = self.value(*expression);
                callee.as_function().map(|f| f.return_value())
            }

            NodeKind::UnaryExpression { op, .. } => Some(match op {
                UnaryOp::TypeOf => builtins.string(),
                UnaryOp::Not | UnaryOp::Delete => builtins.boolean(),
                UnaryOp::Void => builtins.undefined(),
                UnaryOp::Plus
                | UnaryOp::Minus
                | UnaryOp::Tilde
                | UnaryOp::PreIncrement
                | UnaryOp::PreDecrement
                | UnaryOp::PostIncrement
                | UnaryOp::PostDecrement => builtins.number(),
            }),
            NodeKind::BinaryExpression(binary) => self.binary(binary.op, binary.left, binary.right),
            NodeKind::ConditionalExpression { .. } => None,

            _ => None,
        }
    }

    fn qualified_id(&mut self, segments: &[String]) -> Option<ValueRef> {
        let (first, rest) = segments.split_first()?;
        if first.is_empty() {
            return None;
        }
        let mut value = self.chain.lookup(first);
        for segment in rest {
            if segment.is_empty() {
                return None;
            }
            let object = self.rc.lookup_reference(&value).filter(|v| v.is_object())?;
            value = object.lookup_member(segment, Some(self.chain.context()))?;
        }
        Some(value)
    }

    fn binary(&mut self, op: BinaryOp, left: Option<NodeId>, right: Option<NodeId>) -> Option<ValueRef> {
        let builtins = shared();
        let result = match op {
            BinaryOp::Add | BinaryOp::InplaceAdd => {
                let lhs = self.value(left);
                let rhs = self.value(right);
                if lhs.is_string() || rhs.is_string() {
                    builtins.string()
                } else {
                    builtins.number()
                }
            }
            BinaryOp::Sub
            | BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Mod
            | BinaryOp::Exp
            | BinaryOp::LShift
            | BinaryOp::RShift
            | BinaryOp::URShift
            | BinaryOp::BitAnd
            | BinaryOp::BitOr
            | BinaryOp::BitXor
            | BinaryOp::InplaceSub
            | BinaryOp::InplaceMul
            | BinaryOp::InplaceDiv
            | BinaryOp::InplaceMod
            | BinaryOp::InplaceExp
            | BinaryOp::InplaceLeftShift
            | BinaryOp::InplaceRightShift
            | BinaryOp::InplaceURightShift
            | BinaryOp::InplaceAnd
            | BinaryOp::InplaceOr
            | BinaryOp::InplaceXor => builtins.number(),
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::StrictEqual
            | BinaryOp::StrictNotEqual
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge
            | BinaryOp::In
            | BinaryOp::InstanceOf => builtins.boolean(),
            // Either operand may be the result.
            BinaryOp::And | BinaryOp::Or | BinaryOp::Coalesce => builtins.unknown(),
            BinaryOp::Assign => return self.reference(right),
        };
        Some(result)
    }
}

impl Visitor for Evaluate<'_> {
    fn recursion_depth(&mut self) -> &mut u32 {
        &mut self.depth
    }

    fn visit(&mut self, ast: &Ast, node: NodeId) -> bool {
        self.result = self.evaluate(ast, node);
        false
    }

    fn throw_recursion_depth_error(&mut self) {
        debug!("expression nests too deeply to evaluate");
        self.result = None;
    }
}
