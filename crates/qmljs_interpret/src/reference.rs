//! Values computed on demand.
//!
//! A [`Reference`] stands in for a value that depends on the linked context:
//! the prototype named by a QML type name, a declared property, a JavaScript
//! variable. It is resolved through a
//! [`ReferenceContext`](crate::reference_context::ReferenceContext), which
//! guards against references that depend on themselves.

use std::sync::{Arc, Weak};

use qmljs_ast::{Ast, NodeId, UiPublicMember, VariableDeclaration};

use crate::document::Document;
use crate::evaluate::Evaluate;
use crate::member_processor::generated_slot_name;
use crate::reference_context::ReferenceContext;
use crate::scope_ast_path::ScopeAstPath;
use crate::scope_builder::ScopeBuilder;
use crate::scope_chain::ScopeChain;
use crate::value::ValueRef;
use crate::value_owner::shared;

pub enum Reference {
    /// The type named after an object definition, e.g. `Rectangle`.
    QmlPrototype(QmlPrototypeReference),
    /// A `property` declared in a QML document.
    AstProperty(AstPropertyReference),
    /// A JavaScript `var`, `let` or `const`.
    AstVariable(AstVariableReference),
    /// The prototype of the global `Qt` object: the C++ `Qt` namespace.
    QtObjectPrototype,
}

impl Reference {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Reference::QmlPrototype(_) => "qml prototype",
            Reference::AstProperty(_) => "property",
            Reference::AstVariable(_) => "variable",
            Reference::QtObjectPrototype => "Qt prototype",
        }
    }

    pub fn as_qml_prototype(&self) -> Option<&QmlPrototypeReference> {
        match self {
            Reference::QmlPrototype(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_ast_property(&self) -> Option<&AstPropertyReference> {
        match self {
            Reference::AstProperty(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_ast_variable(&self) -> Option<&AstVariableReference> {
        match self {
            Reference::AstVariable(r) => Some(r),
            _ => None,
        }
    }

    /// Compute the referenced value. Call through
    /// [`ReferenceContext::lookup_reference`] so that cycles are caught.
    pub(crate) fn value(&self, rc: &ReferenceContext) -> Option<ValueRef> {
        match self {
            Reference::QmlPrototype(r) => r.value(rc),
            Reference::AstProperty(r) => r.value(rc),
            Reference::AstVariable(r) => r.value(rc),
            Reference::QtObjectPrototype => rc
                .context()
                .value_owner()
                .cpp_qml_types()
                .object_by_cpp_name("Qt"),
        }
    }
}

/// Evaluate `node` of `doc` in the scope it appears in.
fn evaluate_in_place(doc: &Arc<Document>, node: NodeId, rc: &ReferenceContext) -> ValueRef {
    let chain = ScopeChain::new(doc.clone(), rc.context().clone());
    let mut builder = ScopeBuilder::with_reference_context(chain, rc);
    let offset = doc.ast().range(node).pos;
    builder.push_path(&ScopeAstPath::new(doc).path_at(offset));
    Evaluate::with_reference_context(builder.scope_chain(), rc).value(Some(node))
}

pub struct QmlPrototypeReference {
    doc: Weak<Document>,
    type_name: Vec<String>,
}

impl QmlPrototypeReference {
    pub fn new(doc: Weak<Document>, type_name: Vec<String>) -> Self {
        Self { doc, type_name }
    }

    pub fn document(&self) -> Option<Arc<Document>> {
        self.doc.upgrade()
    }

    /// Segments of the type name, e.g. `["Controls", "Button"]`.
    pub fn type_name(&self) -> &[String] {
        &self.type_name
    }

    fn value(&self, rc: &ReferenceContext) -> Option<ValueRef> {
        let doc = self.doc.upgrade()?;
        rc.context().lookup_type(&doc, &self.type_name)
    }
}

pub struct AstPropertyReference {
    doc: Weak<Document>,
    node: NodeId,
    name: String,
    member_type: Option<String>,
    type_modifier: Option<String>,
    is_readonly: bool,
    statement: Option<NodeId>,
    on_changed_slot_name: String,
}

impl AstPropertyReference {
    pub fn new(doc: Weak<Document>, node: NodeId, member: &UiPublicMember) -> Self {
        Self {
            doc,
            node,
            name: member.name.clone(),
            member_type: member.member_type.clone(),
            type_modifier: member.type_modifier.clone(),
            is_readonly: member.is_readonly(),
            statement: member.statement,
            on_changed_slot_name: format!("{}Changed", generated_slot_name(&member.name)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn member_type(&self) -> Option<&str> {
        self.member_type.as_deref()
    }

    pub fn type_modifier(&self) -> Option<&str> {
        self.type_modifier.as_deref()
    }

    pub fn is_readonly(&self) -> bool {
        self.is_readonly
    }

    pub fn is_list(&self) -> bool {
        self.type_modifier.as_deref() == Some("list")
    }

    pub fn on_changed_slot_name(&self) -> &str {
        &self.on_changed_slot_name
    }

    fn value(&self, rc: &ReferenceContext) -> Option<ValueRef> {
        let doc = self.doc.upgrade()?;
        let untyped = matches!(
            self.member_type.as_deref(),
            None | Some("var") | Some("variant") | Some("alias")
        );
        if let Some(statement) = self.statement {
            if untyped {
                return Some(evaluate_in_place(&doc, statement, rc));
            }
        }

        let Some(member_type) = self.member_type.as_deref() else {
            return Some(shared().undefined());
        };
        if self.is_list() {
            return Some(shared().array_instance());
        }
        let builtin = shared().default_value_for_builtin_type(member_type);
        if !builtin.is_undefined() {
            return Some(builtin);
        }
        if self.type_modifier.is_none() {
            let segments: Vec<String> = member_type.split('.').map(str::to_string).collect();
            if let Some(type_value) = rc.context().lookup_type(&doc, &segments) {
                return Some(type_value);
            }
        }
        Some(shared().undefined())
    }
}

pub struct AstVariableReference {
    doc: Weak<Document>,
    node: NodeId,
    name: String,
    initializer: Option<NodeId>,
}

impl AstVariableReference {
    pub fn new(doc: Weak<Document>, node: NodeId, declaration: &VariableDeclaration) -> Self {
        Self {
            doc,
            node,
            name: declaration.name.clone(),
            initializer: declaration.initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn initializer(&self) -> Option<NodeId> {
        self.initializer
    }

    fn value(&self, rc: &ReferenceContext) -> Option<ValueRef> {
        // Without an initializer the variable may be assigned anywhere.
        let Some(initializer) = self.initializer else {
            return Some(shared().unknown());
        };
        let doc = self.doc.upgrade()?;
        Some(evaluate_in_place(&doc, initializer, rc))
    }
}

/// The dotted type name of an object node, split into segments.
pub(crate) fn type_name_segments(ast: &Ast, type_name_id: Option<NodeId>) -> Vec<String> {
    ast.qualified_id(type_name_id)
        .map(|q| q.segments.clone())
        .unwrap_or_default()
}
