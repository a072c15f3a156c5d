//! Values created from the syntax of one document: QML objects, their
//! declared signals, and JavaScript functions.

use std::sync::{Arc, Weak};

use qmljs_ast::{Ast, NodeId, NodeKind, PublicMemberKind, UiParameter};

use crate::document::Document;
use crate::function_value::FunctionKind;
use crate::member_processor::{generated_slot_name, MemberProcessor};
use crate::object_value::PropertyInfo;
use crate::reference::{AstPropertyReference, Reference};
use crate::value::ValueRef;
use crate::value_owner::{shared, ValueOwner};

/// A JavaScript function declared in a document.
pub struct AstFunction {
    doc: Weak<Document>,
    node: NodeId,
    name: Option<String>,
    formals: Vec<String>,
}

impl AstFunction {
    pub fn new(doc: Weak<Document>, node: NodeId, name: Option<String>, formals: Vec<String>) -> Self {
        Self {
            doc,
            node,
            name,
            formals,
        }
    }

    pub fn document(&self) -> Option<Arc<Document>> {
        self.doc.upgrade()
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn formals(&self) -> &[String] {
        &self.formals
    }
}

/// A `signal` declared in a QML document.
pub struct AstSignal {
    doc: Weak<Document>,
    node: NodeId,
    name: String,
    slot_name: String,
    parameters: Vec<UiParameter>,
    /// The parameters, as seen from the body of an `on<Signal>` handler.
    body_scope: ValueRef,
}

impl AstSignal {
    fn new(owner: &ValueOwner, doc: Weak<Document>, node: NodeId, name: &str, parameters: &[UiParameter]) -> Self {
        let body_scope = owner.new_object(None);
        if let Some(scope) = body_scope.as_object() {
            for parameter in parameters {
                let value = shared().default_value_for_builtin_type(&parameter.type_name);
                scope.set_member(parameter.name.clone(), &value);
            }
        }
        Self {
            doc,
            node,
            name: name.to_string(),
            slot_name: generated_slot_name(name),
            parameters: parameters.to_vec(),
            body_scope,
        }
    }

    pub fn document(&self) -> Option<Arc<Document>> {
        self.doc.upgrade()
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `on<Name>`
    pub fn slot_name(&self) -> &str {
        &self.slot_name
    }

    pub fn parameters(&self) -> &[UiParameter] {
        &self.parameters
    }

    pub fn body_scope(&self) -> &ValueRef {
        &self.body_scope
    }
}

/// An object instantiated in a QML document, with the properties and
/// signals it declares.
pub struct AstObjectValue {
    doc: Weak<Document>,
    node: NodeId,
    type_name: Option<NodeId>,
    initializer: Option<NodeId>,
    /// `AstProperty` references, in declaration order.
    properties: Vec<ValueRef>,
    /// `Signal` function values, in declaration order.
    signals: Vec<ValueRef>,
    default_property: Option<String>,
}

impl AstObjectValue {
    /// Collect the declarations of the object at `node`. The created values
    /// are registered with `owner`.
    pub(crate) fn new(owner: &ValueOwner, doc: &Weak<Document>, ast: &Ast, node: NodeId) -> Self {
        let (type_name, initializer) = ast
            .kind(node)
            .and_then(NodeKind::object_parts)
            .unwrap_or((None, None));

        let mut properties = Vec::new();
        let mut signals = Vec::new();
        let mut default_property = None;
        for &member in ast.object_members(node) {
            let Some(declaration) = ast.kind(member).and_then(NodeKind::as_public_member) else {
                continue;
            };
            if declaration.name.is_empty() {
                continue;
            }
            match declaration.kind {
                PublicMemberKind::Property => {
                    if declaration.is_default() {
                        default_property = Some(declaration.name.clone());
                    }
                    let reference = AstPropertyReference::new(doc.clone(), member, declaration);
                    properties.push(owner.new_reference(Reference::AstProperty(reference)));
                }
                PublicMemberKind::Signal => {
                    let signal = AstSignal::new(owner, doc.clone(), member, &declaration.name, &declaration.parameters);
                    signals.push(owner.new_function_value(FunctionKind::Signal(signal)));
                }
            }
        }

        Self {
            doc: doc.clone(),
            node,
            type_name,
            initializer,
            properties,
            signals,
            default_property,
        }
    }

    pub fn document(&self) -> Option<Arc<Document>> {
        self.doc.upgrade()
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn type_name_id(&self) -> Option<NodeId> {
        self.type_name
    }

    pub fn initializer(&self) -> Option<NodeId> {
        self.initializer
    }

    pub fn properties(&self) -> &[ValueRef] {
        &self.properties
    }

    pub fn signals(&self) -> &[ValueRef] {
        &self.signals
    }

    /// The `default property` declared by this object, if any.
    pub fn default_property_name(&self) -> Option<&str> {
        self.default_property.as_deref()
    }

    pub(crate) fn process_members(&self, processor: &mut dyn MemberProcessor) -> bool {
        for property in &self.properties {
            let Some(reference) = property.as_reference().and_then(|r| r.as_ast_property()) else {
                continue;
            };
            let mut info = PropertyInfo::READABLE;
            if !reference.is_readonly() {
                info |= PropertyInfo::WRITEABLE;
            }
            if reference.is_list() {
                info |= PropertyInfo::LIST_TYPE;
            }
            if !processor.process_property(reference.name(), property, info) {
                return false;
            }
            if !processor.process_generated_slot(reference.on_changed_slot_name(), &shared().unknown()) {
                return false;
            }
        }

        for signal in &self.signals {
            let Some(ast_signal) = signal.as_function().and_then(|f| f.as_signal()) else {
                continue;
            };
            if !processor.process_signal(ast_signal.name(), signal) {
                return false;
            }
            if !processor.process_generated_slot(ast_signal.slot_name(), signal) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member_processor::{CollectMembers, MemberKind};
    use crate::object_value::{ObjectKind, ObjectValue};
    use qmljs_ast::{AstBuilder, MemberFlags};

    fn rectangle_with_declarations() -> (Ast, NodeId) {
        let mut b = AstBuilder::new();
        let count = b.property("int", "count", None);
        let flags = MemberFlags::READONLY | MemberFlags::DEFAULT;
        let items = b.property_with("Item", Some("list"), "items", None, flags);
        let clicked = b.signal("clicked", &[("int", "x"), ("string", "label")]);
        let root = b.object_definition("Rectangle", vec![count, items, clicked]);
        let ast = b.finish_qml(vec![], root);
        (ast, root)
    }

    #[test]
    fn test_declared_members() {
        let owner = ValueOwner::new();
        let (ast, root) = rectangle_with_declarations();
        let object = AstObjectValue::new(&owner, &Weak::new(), &ast, root);
        assert_eq!(object.properties().len(), 2);
        assert_eq!(object.signals().len(), 1);
        assert_eq!(object.default_property_name(), Some("items"));

        let value = owner.new_object_value(ObjectValue::with_kind("Rectangle", ObjectKind::AstObject(object)));
        let mut collect = CollectMembers::new();
        value.as_object().unwrap().process_members(&mut collect);
        let listed: Vec<(&str, MemberKind)> = collect
            .members
            .iter()
            .map(|m| (m.name.as_str(), m.kind))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("count", MemberKind::Property),
                ("onCountChanged", MemberKind::GeneratedSlot),
                ("items", MemberKind::Property),
                ("onItemsChanged", MemberKind::GeneratedSlot),
                ("clicked", MemberKind::Signal),
                ("onClicked", MemberKind::GeneratedSlot),
            ]
        );

        let items = &collect.members[2];
        assert!(!items.info.is_writeable());
        assert!(items.info.is_list());
        assert!(collect.members[0].info.is_writeable());
    }

    #[test]
    fn test_signal_body_scope() {
        let owner = ValueOwner::new();
        let (ast, root) = rectangle_with_declarations();
        let object = AstObjectValue::new(&owner, &Weak::new(), &ast, root);
        let signal = object.signals()[0].as_function().unwrap();
        let ast_signal = signal.as_signal().unwrap();
        assert_eq!(ast_signal.slot_name(), "onClicked");
        assert!(ast_signal.body_scope().lookup_member("x", None).unwrap().is_number());
        assert!(ast_signal.body_scope().lookup_member("label", None).unwrap().is_string());
        assert!(signal.return_value().is_undefined());
        assert_eq!(signal.argument_name(1).as_deref(), Some("label"));
    }
}
