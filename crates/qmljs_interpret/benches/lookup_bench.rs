use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qmljs_ast::{AstBuilder, Dialect, NodeId};
use qmljs_interpret::{
    Document, Evaluate, LibraryInfo, Link, ScopeAstPath, ScopeBuilder, ScopeChain, Snapshot, ViewerContext,
};

const TYPES: &str = r#"{
  "components": [
    { "name": "QObject", "exports": ["QtQml/QtObject 2.0"],
      "properties": [{ "name": "objectName", "type": "QString" }] },
    { "name": "QQuickItem", "prototype": "QObject", "exports": ["QtQuick/Item 2.0"],
      "properties": [
        { "name": "x", "type": "double" },
        { "name": "y", "type": "double" },
        { "name": "width", "type": "double" },
        { "name": "height", "type": "double" },
        { "name": "visible", "type": "bool" }
      ] },
    { "name": "QQuickRectangle", "prototype": "QQuickItem", "exports": ["QtQuick/Rectangle 2.0"],
      "properties": [{ "name": "color", "type": "QColor" }, { "name": "radius", "type": "double" }] }
  ]
}"#;

/// A root item with `count` rectangles, each bound to the width of the one
/// before it. Returns the document and the last binding expression.
fn build_document(count: usize) -> (Arc<Document>, NodeId) {
    let mut b = AstBuilder::new();
    let import = b.import_module("QtQuick", Some("2.0"), None);
    let mut children = Vec::with_capacity(count);
    let mut last = None;
    for index in 0..count {
        let id_value = b.identifier(&format!("r{}", index));
        let id = b.script_expression("id", id_value);
        let mut members = vec![id];
        if index > 0 {
            let previous = b.path(&format!("r{}.width", index - 1));
            let half = b.number(2.0);
            let expression = b.binary(qmljs_ast::BinaryOp::Div, previous, half);
            members.push(b.script_expression("width", expression));
            last = Some(previous);
        }
        children.push(b.object_definition("Rectangle", members));
    }
    let root = b.object_definition("Item", children);
    let doc = Document::new("/bench/Main.qml", Dialect::Qml, b.finish_qml(vec![import], root));
    (doc, last.unwrap_or(root))
}

fn link(doc: &Arc<Document>) -> qmljs_interpret::ContextPtr {
    let objects = qmljs_metatypes::parse_type_description(TYPES).unwrap().objects;
    let mut snapshot = Snapshot::new();
    snapshot.insert(doc.clone());
    Link::new(snapshot, ViewerContext::default(), LibraryInfo::default().with_meta_objects(objects)).link()
}

fn bench_link(c: &mut Criterion) {
    let (doc, _) = build_document(200);
    c.bench_function("link_200_objects", |b| {
        b.iter(|| black_box(link(&doc)));
    });
}

fn bench_scope_and_evaluate(c: &mut Criterion) {
    let (doc, expression) = build_document(200);
    let context = link(&doc);
    let offset = doc.ast().range(expression).pos;

    c.bench_function("scope_chain_at_offset", |b| {
        b.iter(|| {
            let mut builder = ScopeBuilder::new(ScopeChain::new(doc.clone(), context.clone()));
            builder.push_path(&ScopeAstPath::new(&doc).path_at(black_box(offset)));
            black_box(builder.into_scope_chain());
        });
    });

    let mut builder = ScopeBuilder::new(ScopeChain::new(doc.clone(), context.clone()));
    builder.push_path(&ScopeAstPath::new(&doc).path_at(offset));
    let chain = builder.into_scope_chain();
    c.bench_function("evaluate_id_member", |b| {
        b.iter(|| black_box(Evaluate::new(&chain).value(Some(expression))));
    });
    c.bench_function("lookup_global_name", |b| {
        b.iter(|| black_box(chain.lookup(black_box("Math"))));
    });
}

criterion_group!(benches, bench_link, bench_scope_and_evaluate);
criterion_main!(benches);
