//! Node definitions for QML documents and the JavaScript they embed.
//!
//! Children are referenced by [`NodeId`]. Every child slot that a parser
//! could fail to fill during error recovery is an `Option`, and all
//! consumers check it.

use crate::types::*;
use qmljs_core::text::TextRange;

/// A node: its kind-specific payload and its source range.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub range: TextRange,
}

// ============================================================================
// QML nodes
// ============================================================================

/// The root of a QML document.
#[derive(Debug, Clone, Default)]
pub struct UiProgram {
    /// `import` and `pragma` lines.
    pub headers: Vec<NodeId>,
    /// The root object definition (normally exactly one).
    pub members: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct UiPragma {
    pub name: String,
}

/// `import QtQuick 2.15 as QQ` or `import "dir" as D`.
#[derive(Debug, Clone, Default)]
pub struct UiImport {
    /// The module uri, as a qualified id node.
    pub import_uri: Option<NodeId>,
    /// A quoted file or directory path.
    pub file_name: Option<String>,
    /// The version text as written, e.g. `2.15`.
    pub version: Option<String>,
    pub import_id: Option<String>,
}

/// A dotted name such as `anchors.left` or `Controls.Button`.
#[derive(Debug, Clone)]
pub struct UiQualifiedId {
    pub segments: Vec<String>,
}

impl UiQualifiedId {
    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn to_dotted(&self) -> String {
        self.segments.join(".")
    }
}

/// `Rectangle { ... }`
#[derive(Debug, Clone)]
pub struct UiObjectDefinition {
    pub qualified_type_name_id: Option<NodeId>,
    pub initializer: Option<NodeId>,
}

/// `contentItem: Rectangle { ... }` or `Behavior on x { ... }`.
#[derive(Debug, Clone)]
pub struct UiObjectBinding {
    pub qualified_id: Option<NodeId>,
    pub qualified_type_name_id: Option<NodeId>,
    pub initializer: Option<NodeId>,
    pub has_on_token: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UiObjectInitializer {
    pub members: Vec<NodeId>,
}

/// `width: parent.width / 2`
#[derive(Debug, Clone)]
pub struct UiScriptBinding {
    pub qualified_id: Option<NodeId>,
    /// An expression statement or a block.
    pub statement: Option<NodeId>,
}

/// `states: [ State {}, State {} ]`
#[derive(Debug, Clone)]
pub struct UiArrayBinding {
    pub qualified_id: Option<NodeId>,
    pub members: Vec<NodeId>,
}

/// A parameter of a QML `signal` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiParameter {
    pub name: String,
    pub type_name: String,
}

/// `property int count: 0`, `readonly property var model`, `signal clicked(int x)`.
#[derive(Debug, Clone)]
pub struct UiPublicMember {
    pub kind: PublicMemberKind,
    pub name: String,
    /// `int`, `var`, `Item`, `alias`, ...; `None` for signals.
    pub member_type: Option<String>,
    /// `list` in `property list<Item> items`.
    pub type_modifier: Option<String>,
    pub parameters: Vec<UiParameter>,
    pub statement: Option<NodeId>,
    /// An object initializer (`property Item foo: Item {}`).
    pub binding: Option<NodeId>,
    pub flags: MemberFlags,
}

impl UiPublicMember {
    pub fn is_readonly(&self) -> bool {
        self.flags.contains(MemberFlags::READONLY)
    }

    pub fn is_default(&self) -> bool {
        self.flags.contains(MemberFlags::DEFAULT)
    }
}

/// A JavaScript function or variable declaration inside a QML object.
#[derive(Debug, Clone)]
pub struct UiSourceElement {
    pub source_element: Option<NodeId>,
}

/// `component Badge: Rectangle { ... }`
#[derive(Debug, Clone)]
pub struct UiInlineComponent {
    pub name: String,
    pub component: Option<NodeId>,
}

// ============================================================================
// JavaScript nodes
// ============================================================================

/// Shared payload of function declarations and function expressions.
#[derive(Debug, Clone, Default)]
pub struct FunctionNode {
    pub name: Option<String>,
    pub formals: Vec<String>,
    /// A `Block` holding the function body.
    pub body: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub name: String,
    pub kind: VariableKind,
    pub initializer: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct BinaryExpression {
    pub op: BinaryOp,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct CallExpression {
    pub base: Option<NodeId>,
    pub arguments: Vec<NodeId>,
}

// ============================================================================
// NodeKind
// ============================================================================

#[derive(Debug, Clone)]
pub enum NodeKind {
    // -- QML --
    UiProgram(UiProgram),
    UiPragma(UiPragma),
    UiImport(UiImport),
    UiQualifiedId(UiQualifiedId),
    UiObjectDefinition(UiObjectDefinition),
    UiObjectBinding(UiObjectBinding),
    UiObjectInitializer(UiObjectInitializer),
    UiScriptBinding(UiScriptBinding),
    UiArrayBinding(UiArrayBinding),
    UiPublicMember(UiPublicMember),
    UiSourceElement(UiSourceElement),
    UiInlineComponent(UiInlineComponent),

    // -- JavaScript statements --
    Program { elements: Vec<NodeId> },
    Block { statements: Vec<NodeId> },
    VariableStatement { declarations: Vec<NodeId> },
    VariableDeclaration(VariableDeclaration),
    FunctionDeclaration(FunctionNode),
    ExpressionStatement { expression: Option<NodeId> },
    ReturnStatement { expression: Option<NodeId> },
    IfStatement {
        condition: Option<NodeId>,
        ok: Option<NodeId>,
        ko: Option<NodeId>,
    },

    // -- JavaScript expressions --
    FunctionExpression(FunctionNode),
    IdentifierExpression { name: String },
    ThisExpression,
    NullExpression,
    TrueLiteral,
    FalseLiteral,
    StringLiteral { value: String },
    NumericLiteral { value: f64 },
    RegExpLiteral { pattern: String, flags: String },
    ArrayLiteral { elements: Vec<NodeId> },
    ObjectLiteral { properties: Vec<NodeId> },
    PropertyAssignment { name: String, value: Option<NodeId> },
    FieldMemberExpression { base: Option<NodeId>, name: String },
    ArrayMemberExpression { base: Option<NodeId>, expression: Option<NodeId> },
    CallExpression(CallExpression),
    NewMemberExpression(CallExpression),
    NewExpression { expression: Option<NodeId> },
    BinaryExpression(BinaryExpression),
    UnaryExpression { op: UnaryOp, expression: Option<NodeId> },
    ConditionalExpression {
        condition: Option<NodeId>,
        ok: Option<NodeId>,
        ko: Option<NodeId>,
    },
    /// The comma operator.
    Expression { left: Option<NodeId>, right: Option<NodeId> },
    NestedExpression { expression: Option<NodeId> },
}

fn push_opt(out: &mut Vec<NodeId>, id: Option<NodeId>) {
    if let Some(id) = id {
        out.push(id);
    }
}

impl NodeKind {
    /// Direct children in source order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self {
            NodeKind::UiProgram(n) => {
                out.extend_from_slice(&n.headers);
                out.extend_from_slice(&n.members);
            }
            NodeKind::UiImport(n) => push_opt(&mut out, n.import_uri),
            NodeKind::UiObjectDefinition(n) => {
                push_opt(&mut out, n.qualified_type_name_id);
                push_opt(&mut out, n.initializer);
            }
            NodeKind::UiObjectBinding(n) => {
                push_opt(&mut out, n.qualified_id);
                push_opt(&mut out, n.qualified_type_name_id);
                push_opt(&mut out, n.initializer);
            }
            NodeKind::UiObjectInitializer(n) => out.extend_from_slice(&n.members),
            NodeKind::UiScriptBinding(n) => {
                push_opt(&mut out, n.qualified_id);
                push_opt(&mut out, n.statement);
            }
            NodeKind::UiArrayBinding(n) => {
                push_opt(&mut out, n.qualified_id);
                out.extend_from_slice(&n.members);
            }
            NodeKind::UiPublicMember(n) => {
                push_opt(&mut out, n.statement);
                push_opt(&mut out, n.binding);
            }
            NodeKind::UiSourceElement(n) => push_opt(&mut out, n.source_element),
            NodeKind::UiInlineComponent(n) => push_opt(&mut out, n.component),
            NodeKind::Program { elements } => out.extend_from_slice(elements),
            NodeKind::Block { statements } => out.extend_from_slice(statements),
            NodeKind::VariableStatement { declarations } => out.extend_from_slice(declarations),
            NodeKind::VariableDeclaration(n) => push_opt(&mut out, n.initializer),
            NodeKind::FunctionDeclaration(n) | NodeKind::FunctionExpression(n) => {
                push_opt(&mut out, n.body)
            }
            NodeKind::ExpressionStatement { expression }
            | NodeKind::ReturnStatement { expression }
            | NodeKind::NewExpression { expression }
            | NodeKind::NestedExpression { expression }
            | NodeKind::UnaryExpression { expression, .. } => push_opt(&mut out, *expression),
            NodeKind::IfStatement { condition, ok, ko }
            | NodeKind::ConditionalExpression { condition, ok, ko } => {
                push_opt(&mut out, *condition);
                push_opt(&mut out, *ok);
                push_opt(&mut out, *ko);
            }
            NodeKind::ArrayLiteral { elements } => out.extend_from_slice(elements),
            NodeKind::ObjectLiteral { properties } => out.extend_from_slice(properties),
            NodeKind::PropertyAssignment { value, .. } => push_opt(&mut out, *value),
            NodeKind::FieldMemberExpression { base, .. } => push_opt(&mut out, *base),
            NodeKind::ArrayMemberExpression { base, expression } => {
                push_opt(&mut out, *base);
                push_opt(&mut out, *expression);
            }
            NodeKind::CallExpression(n) | NodeKind::NewMemberExpression(n) => {
                push_opt(&mut out, n.base);
                out.extend_from_slice(&n.arguments);
            }
            NodeKind::BinaryExpression(n) => {
                push_opt(&mut out, n.left);
                push_opt(&mut out, n.right);
            }
            NodeKind::Expression { left, right } => {
                push_opt(&mut out, *left);
                push_opt(&mut out, *right);
            }
            NodeKind::UiPragma(_)
            | NodeKind::UiQualifiedId(_)
            | NodeKind::IdentifierExpression { .. }
            | NodeKind::ThisExpression
            | NodeKind::NullExpression
            | NodeKind::TrueLiteral
            | NodeKind::FalseLiteral
            | NodeKind::StringLiteral { .. }
            | NodeKind::NumericLiteral { .. }
            | NodeKind::RegExpLiteral { .. } => {}
        }
        out
    }

    /// A short name of the node kind, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::UiProgram(_) => "UiProgram",
            NodeKind::UiPragma(_) => "UiPragma",
            NodeKind::UiImport(_) => "UiImport",
            NodeKind::UiQualifiedId(_) => "UiQualifiedId",
            NodeKind::UiObjectDefinition(_) => "UiObjectDefinition",
            NodeKind::UiObjectBinding(_) => "UiObjectBinding",
            NodeKind::UiObjectInitializer(_) => "UiObjectInitializer",
            NodeKind::UiScriptBinding(_) => "UiScriptBinding",
            NodeKind::UiArrayBinding(_) => "UiArrayBinding",
            NodeKind::UiPublicMember(_) => "UiPublicMember",
            NodeKind::UiSourceElement(_) => "UiSourceElement",
            NodeKind::UiInlineComponent(_) => "UiInlineComponent",
            NodeKind::Program { .. } => "Program",
            NodeKind::Block { .. } => "Block",
            NodeKind::VariableStatement { .. } => "VariableStatement",
            NodeKind::VariableDeclaration(_) => "VariableDeclaration",
            NodeKind::FunctionDeclaration(_) => "FunctionDeclaration",
            NodeKind::ExpressionStatement { .. } => "ExpressionStatement",
            NodeKind::ReturnStatement { .. } => "ReturnStatement",
            NodeKind::IfStatement { .. } => "IfStatement",
            NodeKind::FunctionExpression(_) => "FunctionExpression",
            NodeKind::IdentifierExpression { .. } => "IdentifierExpression",
            NodeKind::ThisExpression => "ThisExpression",
            NodeKind::NullExpression => "NullExpression",
            NodeKind::TrueLiteral => "TrueLiteral",
            NodeKind::FalseLiteral => "FalseLiteral",
            NodeKind::StringLiteral { .. } => "StringLiteral",
            NodeKind::NumericLiteral { .. } => "NumericLiteral",
            NodeKind::RegExpLiteral { .. } => "RegExpLiteral",
            NodeKind::ArrayLiteral { .. } => "ArrayLiteral",
            NodeKind::ObjectLiteral { .. } => "ObjectLiteral",
            NodeKind::PropertyAssignment { .. } => "PropertyAssignment",
            NodeKind::FieldMemberExpression { .. } => "FieldMemberExpression",
            NodeKind::ArrayMemberExpression { .. } => "ArrayMemberExpression",
            NodeKind::CallExpression(_) => "CallExpression",
            NodeKind::NewMemberExpression(_) => "NewMemberExpression",
            NodeKind::NewExpression { .. } => "NewExpression",
            NodeKind::BinaryExpression(_) => "BinaryExpression",
            NodeKind::UnaryExpression { .. } => "UnaryExpression",
            NodeKind::ConditionalExpression { .. } => "ConditionalExpression",
            NodeKind::Expression { .. } => "Expression",
            NodeKind::NestedExpression { .. } => "NestedExpression",
        }
    }

    /// Object definitions and object bindings both instantiate a QML object.
    pub fn is_object_node(&self) -> bool {
        matches!(self, NodeKind::UiObjectDefinition(_) | NodeKind::UiObjectBinding(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self, NodeKind::FunctionDeclaration(_) | NodeKind::FunctionExpression(_))
    }

    pub fn as_function(&self) -> Option<&FunctionNode> {
        match self {
            NodeKind::FunctionDeclaration(f) | NodeKind::FunctionExpression(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_qualified_id(&self) -> Option<&UiQualifiedId> {
        match self {
            NodeKind::UiQualifiedId(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_public_member(&self) -> Option<&UiPublicMember> {
        match self {
            NodeKind::UiPublicMember(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_script_binding(&self) -> Option<&UiScriptBinding> {
        match self {
            NodeKind::UiScriptBinding(b) => Some(b),
            _ => None,
        }
    }

    /// `(type name id, initializer)` for object definitions and bindings.
    pub fn object_parts(&self) -> Option<(Option<NodeId>, Option<NodeId>)> {
        match self {
            NodeKind::UiObjectDefinition(d) => Some((d.qualified_type_name_id, d.initializer)),
            NodeKind::UiObjectBinding(b) => Some((b.qualified_type_name_id, b.initializer)),
            _ => None,
        }
    }
}
