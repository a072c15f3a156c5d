//! Value integration tests: prototype chains across documents, member
//! enumeration and value visitors on linked values.

mod common;

use std::sync::Arc;

use common::*;
use qmljs_interpret::{
    CollectMembers, FunctionValue, MemberKind, ObjectValue, PrototypeError, PrototypeIterator, ValueVisitor,
};

fn root_with_type(file_name: &str, type_name: &str) -> Arc<qmljs_interpret::Document> {
    qml(file_name, |b| {
        let import = import_qtquick(b);
        let root = b.object_definition(type_name, vec![]);
        (vec![import], root)
    })
}

// ============================================================================
// Prototype chains
// ============================================================================

#[test]
fn test_document_prototype_chain() {
    let fancy = root_with_type("/proj/Fancy.qml", "Rectangle");
    let main = root_with_type("/proj/Main.qml", "Fancy");
    let context = link(&[main.clone(), fancy.clone()]);

    let start = main.bind().root_object_value().cloned();
    let mut prototypes = PrototypeIterator::new(start, Some(&context));
    let chain: Vec<_> = prototypes.by_ref().collect();
    assert_eq!(chain.len(), 5);
    assert!(Arc::ptr_eq(&chain[1], fancy.bind().root_object_value().unwrap()));
    assert!(chain[2].as_cpp_component().is_some());
    assert_eq!(prototypes.error(), PrototypeError::NoError);
}

#[test]
fn test_prototype_cycle_between_documents() {
    let a = root_with_type("/proj/A.qml", "B");
    let b = root_with_type("/proj/B.qml", "A");
    let context = link(&[a.clone(), b.clone()]);

    let mut prototypes = PrototypeIterator::new(a.bind().root_object_value().cloned(), Some(&context));
    let chain: Vec<_> = prototypes.by_ref().collect();
    assert_eq!(chain.len(), 2);
    assert_eq!(prototypes.error(), PrototypeError::CycleError);
}

#[test]
fn test_unresolved_prototype() {
    let main = root_with_type("/proj/Main.qml", "Missing");
    let context = link(&[main.clone()]);

    let mut prototypes = PrototypeIterator::new(main.bind().root_object_value().cloned(), Some(&context));
    assert_eq!(prototypes.by_ref().count(), 1);
    assert_eq!(prototypes.error(), PrototypeError::ReferenceResolutionError);
}

// ============================================================================
// Members
// ============================================================================

#[test]
fn test_collect_cpp_members() {
    let main = root_with_type("/proj/Main.qml", "Item");
    let context = link(&[main.clone()]);
    let rectangle = context.lookup_type(&main, &["Rectangle".to_string()]).unwrap();

    let mut collect = CollectMembers::new();
    rectangle.as_object().unwrap().process_members(&mut collect);
    let names: Vec<&str> = collect.members.iter().map(|m| m.name.as_str()).collect();
    assert!(names.contains(&"color"));
    assert!(names.contains(&"radius"));
    assert!(names.contains(&"onColorChanged"));
    assert!(!names.contains(&"width"), "inherited members come from the prototype");

    let mut properties_only = CollectMembers::new();
    properties_only.skip_generated_slots = true;
    rectangle.as_object().unwrap().process_members(&mut properties_only);
    assert!(properties_only
        .members
        .iter()
        .all(|m| m.kind != MemberKind::GeneratedSlot));
}

#[test]
fn test_collect_qml_members() {
    let main = qml("/proj/Main.qml", |b| {
        let import = import_qtquick(b);
        let count = b.property("int", "count", None);
        let signal = b.signal("finished", &[]);
        let root = b.object_definition("Item", vec![count, signal]);
        (vec![import], root)
    });
    let _context = link(&[main.clone()]);

    let mut collect = CollectMembers::new();
    main.bind().root_object_value().unwrap().as_object().unwrap().process_members(&mut collect);
    let summary: Vec<(&str, MemberKind)> = collect.members.iter().map(|m| (m.name.as_str(), m.kind)).collect();
    assert_eq!(
        summary,
        vec![
            ("count", MemberKind::Property),
            ("onCountChanged", MemberKind::GeneratedSlot),
            ("finished", MemberKind::Signal),
            ("onFinished", MemberKind::GeneratedSlot),
        ]
    );
}

// ============================================================================
// Visitors
// ============================================================================

#[derive(Default)]
struct Describe(Vec<String>);

impl ValueVisitor for Describe {
    fn visit_number(&mut self, kind: qmljs_interpret::NumberKind) {
        self.0.push(format!("number:{:?}", kind));
    }

    fn visit_color(&mut self) {
        self.0.push("color".to_string());
    }

    fn visit_object(&mut self, object: &ObjectValue) {
        self.0.push(format!("object:{}", object.class_name()));
    }

    fn visit_function(&mut self, _function: &FunctionValue) {
        self.0.push("function".to_string());
    }
}

#[test]
fn test_visitor_sees_linked_values() {
    let main = root_with_type("/proj/Main.qml", "Item");
    let context = link(&[main.clone()]);
    let rectangle = context.lookup_type(&main, &["Rectangle".to_string()]).unwrap();

    let mut describe = Describe::default();
    rectangle.accept(&mut describe);
    for member in ["color", "radius"] {
        rectangle.lookup_member(member, Some(&context)).unwrap().accept(&mut describe);
    }
    assert_eq!(describe.0, vec!["object:Rectangle", "color", "number:Real"]);
}
