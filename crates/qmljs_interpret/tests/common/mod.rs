//! Shared fixtures for the pipeline tests: a small QtQuick type library
//! and helpers to build, link and query documents.

#![allow(dead_code)]

use std::sync::Arc;

use qmljs_ast::{AstBuilder, Dialect, NodeId};
use qmljs_interpret::{
    ContextPtr, Document, Evaluate, LibraryInfo, Link, LinkDiagnostics, ScopeAstPath, ScopeBuilder,
    ScopeChain, Snapshot, ValueRef, ViewerContext,
};

pub const QT_QML_PATH: &str = "/qt/qml";

/// The types of a tiny QtQuick module.
pub const QTQUICK_TYPES: &str = r#"{
  "components": [
    { "name": "QObject", "exports": ["QtQml/QtObject 2.0"],
      "properties": [{ "name": "objectName", "type": "QString" }] },
    { "name": "QQuickAnchors",
      "properties": [
        { "name": "fill", "type": "QQuickItem", "isPointer": true },
        { "name": "margins", "type": "double" }
      ] },
    { "name": "QQuickItem", "prototype": "QObject", "exports": ["QtQuick/Item 2.0"],
      "defaultProperty": "data",
      "properties": [
        { "name": "x", "type": "double" },
        { "name": "width", "type": "double" },
        { "name": "visible", "type": "bool" },
        { "name": "parent", "type": "QQuickItem", "isPointer": true },
        { "name": "data", "type": "QObject", "isList": true, "isPointer": true },
        { "name": "anchors", "type": "QQuickAnchors", "isPointer": true, "isReadonly": true }
      ] },
    { "name": "QQuickRectangle", "prototype": "QQuickItem", "exports": ["QtQuick/Rectangle 2.0"],
      "properties": [
        { "name": "color", "type": "QColor" },
        { "name": "radius", "type": "double" }
      ] },
    { "name": "QQuickListView", "prototype": "QQuickItem", "exports": ["QtQuick/ListView 2.0"],
      "properties": [
        { "name": "count", "type": "int", "isReadonly": true },
        { "name": "model", "type": "QVariant" }
      ] },
    { "name": "QQuickMouseEvent",
      "properties": [{ "name": "x", "type": "int" }, { "name": "y", "type": "int" }] },
    { "name": "QQuickMouseArea", "prototype": "QQuickItem", "exports": ["QtQuick/MouseArea 2.0"],
      "signals": [
        { "name": "clicked", "parameters": [{ "name": "mouse", "type": "QQuickMouseEvent" }] }
      ] },
    { "name": "QQuickListElement", "prototype": "QObject", "exports": ["QtQuick/ListElement 2.0"] },
    { "name": "QQmlConnections", "prototype": "QObject", "exports": ["QtQuick/Connections 2.0"],
      "properties": [{ "name": "target", "type": "QObject", "isPointer": true }] },
    { "name": "QQuickPropertyChanges", "prototype": "QObject", "exports": ["QtQuick/PropertyChanges 2.0"],
      "properties": [{ "name": "target", "type": "QObject", "isPointer": true }] }
  ]
}"#;

pub fn qtquick_library() -> LibraryInfo {
    let description = qmljs_metatypes::parse_type_description(QTQUICK_TYPES).expect("fixture types parse");
    LibraryInfo::from_qmldir("module QtQuick\nplugin qtquick2plugin\n").with_meta_objects(description.objects)
}

pub fn viewer_context() -> ViewerContext {
    ViewerContext {
        paths: vec![QT_QML_PATH.to_string()],
        ..ViewerContext::default()
    }
}

pub fn snapshot(documents: &[Arc<Document>]) -> Snapshot {
    let mut snapshot = Snapshot::new();
    for document in documents {
        snapshot.insert(document.clone());
    }
    snapshot.insert_library_info(&format!("{}/QtQuick", QT_QML_PATH), qtquick_library());
    snapshot
}

pub fn link(documents: &[Arc<Document>]) -> ContextPtr {
    link_with_diagnostics(documents).0
}

pub fn link_with_diagnostics(documents: &[Arc<Document>]) -> (ContextPtr, LinkDiagnostics) {
    Link::new(snapshot(documents), viewer_context(), LibraryInfo::default()).link_with_diagnostics()
}

/// Build a QML document; `build` returns the headers and the root object.
pub fn qml(file_name: &str, build: impl FnOnce(&mut AstBuilder) -> (Vec<NodeId>, NodeId)) -> Arc<Document> {
    let mut b = AstBuilder::new();
    let (headers, root) = build(&mut b);
    Document::new(file_name, Dialect::Qml, b.finish_qml(headers, root))
}

/// Build a JavaScript document from its top-level statements.
pub fn js(file_name: &str, build: impl FnOnce(&mut AstBuilder) -> Vec<NodeId>) -> Arc<Document> {
    let mut b = AstBuilder::new();
    let elements = build(&mut b);
    Document::new(file_name, Dialect::JavaScript, b.finish_program(elements))
}

pub fn import_qtquick(b: &mut AstBuilder) -> NodeId {
    b.import_module("QtQuick", Some("2.0"), None)
}

/// `id: <name>`
pub fn id(b: &mut AstBuilder, name: &str) -> NodeId {
    let value = b.identifier(name);
    b.script_expression("id", value)
}

/// The scope chain at the start of `node`.
pub fn chain_at(context: &ContextPtr, doc: &Arc<Document>, node: NodeId) -> ScopeChain {
    let chain = ScopeChain::new(doc.clone(), context.clone());
    let mut builder = ScopeBuilder::new(chain);
    builder.push_path(&ScopeAstPath::new(doc).path_at(doc.ast().range(node).pos));
    builder.into_scope_chain()
}

/// Evaluate `node` in the scope it appears in.
pub fn evaluate_at(context: &ContextPtr, doc: &Arc<Document>, node: NodeId) -> ValueRef {
    let chain = chain_at(context, doc, node);
    Evaluate::new(&chain).value(Some(node))
}
