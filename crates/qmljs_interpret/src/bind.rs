//! Binding a single document.
//!
//! The binder walks the AST once and creates everything that can be known
//! without looking at other documents:
//! - the import list (resolved later by [`Link`](crate::link::Link))
//! - one [`AstObjectValue`] per object definition or object binding, whose
//!   prototype is a reference to its type name
//! - the id environment of the component
//! - grouped property bindings (`anchors { ... }`)
//! - the JavaScript scopes attached to functions and block-bodied bindings
//! - function values and variable references
//! - inline components and the `.pragma library` marker

use std::sync::{Arc, Weak};

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use qmljs_ast::{Ast, Dialect, NodeId, NodeKind, Visitor};
use qmljs_core::version::ComponentVersion;
use qmljs_diagnostics::{messages, Diagnostic, DiagnosticMessage};

use crate::ast_values::{AstFunction, AstObjectValue};
use crate::context::ContextPtr;
use crate::document::Document;
use crate::function_value::FunctionKind;
use crate::imports::ImportInfo;
use crate::object_value::{ObjectKind, ObjectValue};
use crate::reference::{type_name_segments, AstVariableReference, QmlPrototypeReference, Reference};
use crate::value::ValueRef;
use crate::value_owner::ValueOwner;

/// The bound state of one document.
pub struct Bind {
    /// Owns every value created for the document.
    owner: Arc<ValueOwner>,
    imports: Vec<ImportInfo>,
    diagnostics: Vec<Diagnostic>,
    root_object: Option<ValueRef>,
    id_environment: ValueRef,
    qml_objects: FxHashMap<NodeId, ValueRef>,
    grouped_property_bindings: FxHashSet<NodeId>,
    attached_js_scopes: FxHashMap<NodeId, ValueRef>,
    functions: FxHashMap<NodeId, ValueRef>,
    inline_components: FxHashMap<String, ValueRef>,
    /// Last type-name segment -> objects instantiated with that name.
    qml_prototypes: Vec<(String, ValueRef)>,
    is_js_library: bool,
}

impl Bind {
    #[tracing::instrument(skip_all, fields(file = %file_name))]
    pub(crate) fn new(doc: Weak<Document>, ast: &Ast, dialect: Dialect, file_name: &str, component_name: &str) -> Bind {
        let owner = ValueOwner::new();
        let id_environment = owner.new_object_with_class("IdEnvironment", None);
        let mut binder = Binder {
            doc,
            owner: owner.clone(),
            dialect,
            file_name,
            document_path: qmljs_path::directory_of(file_name),
            component_name,
            current: None,
            depth: 0,
            bind: Bind {
                owner,
                imports: Vec::new(),
                diagnostics: Vec::new(),
                root_object: None,
                id_environment,
                qml_objects: FxHashMap::default(),
                grouped_property_bindings: FxHashSet::default(),
                attached_js_scopes: FxHashMap::default(),
                functions: FxHashMap::default(),
                inline_components: FxHashMap::default(),
                qml_prototypes: Vec::new(),
                is_js_library: false,
            },
        };
        ast.accept(ast.root(), &mut binder);

        let bind = binder.bind;
        debug!(
            objects = bind.qml_objects.len(),
            scopes = bind.attached_js_scopes.len(),
            imports = bind.imports.len(),
            values = bind.owner.registered_count(),
            "bound document"
        );
        bind
    }

    pub fn imports(&self) -> &[ImportInfo] {
        &self.imports
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The root object of a QML document, or the global scope of a
    /// JavaScript document.
    pub fn root_object_value(&self) -> Option<&ValueRef> {
        self.root_object.as_ref()
    }

    /// Object ids declared in the document, as members.
    pub fn id_environment(&self) -> &ValueRef {
        &self.id_environment
    }

    /// The object created for an object definition or object binding.
    pub fn find_qml_object(&self, node: NodeId) -> Option<ValueRef> {
        self.qml_objects.get(&node).cloned()
    }

    /// Whether `node` is an object definition with a lowercase type name,
    /// which groups bindings of a property instead of creating an object.
    pub fn is_grouped_property_binding(&self, node: NodeId) -> bool {
        self.grouped_property_bindings.contains(&node)
    }

    /// The JavaScript scope of a function or of a block-bodied binding.
    pub fn find_attached_js_scope(&self, node: NodeId) -> Option<ValueRef> {
        self.attached_js_scopes.get(&node).cloned()
    }

    pub fn find_function(&self, node: NodeId) -> Option<ValueRef> {
        self.functions.get(&node).cloned()
    }

    pub fn inline_component(&self, name: &str) -> Option<ValueRef> {
        self.inline_components.get(name).cloned()
    }

    pub fn inline_component_names(&self) -> impl Iterator<Item = &str> {
        self.inline_components.keys().map(String::as_str)
    }

    /// Distinct type names used to instantiate objects in the document.
    pub fn qml_prototype_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.qml_prototypes.iter().map(|(name, _)| name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Whether an object of the document is an instance of `prototype`,
    /// usually the root object of another document.
    pub fn uses_qml_prototype(&self, prototype: &ValueRef, context: &ContextPtr) -> bool {
        let Some(component_name) = prototype.as_object().map(ObjectValue::class_name) else {
            return false;
        };
        if component_name.is_empty() {
            return false;
        }
        self.qml_prototypes
            .iter()
            .filter(|(name, _)| name == component_name)
            .filter_map(|(_, object)| object.prototype(Some(context)))
            .any(|resolved| Arc::ptr_eq(&resolved, prototype))
    }

    /// `.pragma library`: the script is shared instead of being evaluated
    /// in the context of each importing component.
    pub fn is_js_library(&self) -> bool {
        self.is_js_library
    }

    pub fn value_owner(&self) -> &Arc<ValueOwner> {
        &self.owner
    }
}

struct Binder<'a> {
    doc: Weak<Document>,
    owner: Arc<ValueOwner>,
    dialect: Dialect,
    file_name: &'a str,
    document_path: String,
    component_name: &'a str,
    /// Where declarations go: a QML object or a JavaScript scope.
    current: Option<ValueRef>,
    depth: u32,
    bind: Bind,
}

impl Binder<'_> {
    fn switch_object_value(&mut self, value: Option<ValueRef>) -> Option<ValueRef> {
        std::mem::replace(&mut self.current, value)
    }

    fn error(&mut self, ast: &Ast, node: NodeId, message: &DiagnosticMessage, args: &[&str]) {
        let span = ast.range(node).to_span();
        self.bind
            .diagnostics
            .push(Diagnostic::with_location(self.file_name, span, message, args));
    }

    /// Create the object for an object definition or binding and bind its
    /// members. An inline component passes its name as `class_name`.
    fn bind_object(&mut self, ast: &Ast, node: NodeId, class_name: Option<&str>) -> ValueRef {
        let (type_name_id, initializer) = ast
            .kind(node)
            .and_then(NodeKind::object_parts)
            .unwrap_or((None, None));
        let segments = type_name_segments(ast, type_name_id);

        let is_root = class_name.is_none() && self.current.is_none() && self.bind.root_object.is_none();
        let class_name = match class_name {
            Some(name) => name.to_string(),
            None if is_root => self.component_name.to_string(),
            None => segments.last().cloned().unwrap_or_default(),
        };

        let object = AstObjectValue::new(&self.owner, &self.doc, ast, node);
        let value = self
            .owner
            .new_object_value(ObjectValue::with_kind(class_name, ObjectKind::AstObject(object)));
        let prototype = self.owner.new_reference(Reference::QmlPrototype(QmlPrototypeReference::new(
            self.doc.clone(),
            segments.clone(),
        )));
        if let Some(object) = value.as_object() {
            object.set_prototype(Some(&prototype));
        }
        if let Some(name) = segments.last().filter(|name| !name.is_empty()) {
            self.bind.qml_prototypes.push((name.clone(), value.clone()));
        }

        let parent = self.switch_object_value(Some(value.clone()));
        match &parent {
            Some(parent) => {
                if let Some(object) = value.as_object() {
                    object.set_member("parent", parent);
                }
            }
            None if is_root => self.bind.root_object = Some(value.clone()),
            None => {}
        }
        ast.accept(initializer, self);
        self.switch_object_value(parent);

        self.bind.qml_objects.insert(node, value.clone());
        value
    }

    fn bind_import(&mut self, ast: &Ast, node: NodeId) {
        let Some(NodeKind::UiImport(import)) = ast.kind(node) else {
            return;
        };
        let alias = import.import_id.as_deref();

        let version = match import.version.as_deref() {
            None => None,
            Some(text) => match text.parse::<ComponentVersion>() {
                Ok(version) => Some(version),
                Err(_) => {
                    self.error(ast, node, &messages::EXPECTED_A_VERSION_NUMBER_OF_THE_FORM_MAJOR_MINOR, &[text]);
                    return;
                }
            },
        };

        if let Some(uri) = ast.qualified_name(import.import_uri) {
            let Some(version) = version else {
                self.error(ast, node, &messages::PACKAGE_IMPORT_REQUIRES_A_VERSION_NUMBER, &[]);
                return;
            };
            self.bind
                .imports
                .push(ImportInfo::module_import(&uri, version, alias, Some(node)));
        } else if let Some(file_name) = &import.file_name {
            let version = version.unwrap_or_default();
            self.bind.imports.push(ImportInfo::path_import(
                &self.document_path,
                file_name,
                version,
                alias,
                Some(node),
            ));
        } else {
            self.error(ast, node, &messages::IMPORT_HAS_NO_URI_OR_PATH, &[]);
        }
    }

    /// Bind `statement` inside a fresh scope attached to `node`.
    fn bind_block_scope(&mut self, ast: &Ast, node: NodeId, statement: NodeId) {
        let scope = self.owner.new_object(None);
        self.bind.attached_js_scopes.insert(node, scope.clone());
        let parent = self.switch_object_value(Some(scope));
        ast.accept(Some(statement), self);
        self.switch_object_value(parent);
    }

    fn bind_id(&mut self, ast: &Ast, node: NodeId, statement: Option<NodeId>) {
        let Some(current) = self.current.clone() else {
            return;
        };
        let expression = match statement.and_then(|s| ast.kind(s)) {
            Some(NodeKind::ExpressionStatement { expression }) => *expression,
            _ => None,
        };
        let Some(NodeKind::IdentifierExpression { name }) = expression.and_then(|e| ast.kind(e)) else {
            return;
        };
        if name.is_empty() {
            return;
        }
        let Some(ids) = self.bind.id_environment.as_object() else {
            return;
        };
        if ids.own_member(name).is_some() {
            let name = name.clone();
            self.error(ast, node, &messages::DUPLICATE_ID_0, &[&name]);
            return;
        }
        ids.set_member(name.clone(), &current);
    }

    fn bind_function(&mut self, ast: &Ast, node: NodeId, is_declaration: bool) {
        let Some(function) = ast.kind(node).and_then(NodeKind::as_function) else {
            return;
        };
        let value = self.owner.new_function_value(FunctionKind::Ast(AstFunction::new(
            self.doc.clone(),
            node,
            function.name.clone(),
            function.formals.clone(),
        )));
        if let Some(object) = value.as_object() {
            object.set_member("length", &self.owner.number_value());
        }
        self.bind.functions.insert(node, value.clone());

        if is_declaration {
            if let (Some(name), Some(current)) = (function.name.as_deref(), &self.current) {
                if let Some(object) = current.as_object().filter(|_| !name.is_empty()) {
                    object.set_member(name, &value);
                }
            }
        }

        let scope = self.owner.new_object(None);
        self.bind.attached_js_scopes.insert(node, scope.clone());
        if let Some(scope_object) = scope.as_object() {
            for formal in function.formals.iter().filter(|f| !f.is_empty()) {
                scope_object.set_member(formal.clone(), &self.owner.unknown_value());
            }
            let arguments = self.owner.new_object(None);
            if let Some(arguments_object) = arguments.as_object() {
                arguments_object.set_member("callee", &value);
                arguments_object.set_member("length", &self.owner.number_value());
            }
            scope_object.set_member("arguments", &arguments);
        }

        let parent = self.switch_object_value(Some(scope));
        ast.accept(function.body, self);
        self.switch_object_value(parent);
    }
}

impl Visitor for Binder<'_> {
    fn recursion_depth(&mut self) -> &mut u32 {
        &mut self.depth
    }

    fn throw_recursion_depth_error(&mut self) {
        debug!(file = self.file_name, "document nests too deeply, subtree not bound");
    }

    fn visit(&mut self, ast: &Ast, node: NodeId) -> bool {
        let Some(kind) = ast.kind(node) else {
            return false;
        };
        match kind {
            NodeKind::Program { .. } => {
                let scope = self.owner.new_object(None);
                self.bind.root_object = Some(scope.clone());
                self.current = Some(scope);
                true
            }
            NodeKind::UiImport(_) => {
                self.bind_import(ast, node);
                false
            }
            NodeKind::UiPragma(pragma) => {
                if self.dialect == Dialect::JavaScript && pragma.name == "library" {
                    self.bind.is_js_library = true;
                }
                false
            }
            NodeKind::UiObjectDefinition(definition) => {
                let grouped = ast
                    .qualified_id(definition.qualified_type_name_id)
                    .and_then(|q| q.first())
                    .and_then(|name| name.chars().next())
                    .is_some_and(char::is_lowercase);
                if grouped {
                    trace!(%node, "grouped property binding");
                    self.bind.grouped_property_bindings.insert(node);
                    let parent = self.switch_object_value(None);
                    ast.accept(definition.initializer, self);
                    self.switch_object_value(parent);
                } else {
                    self.bind_object(ast, node, None);
                }
                false
            }
            NodeKind::UiObjectBinding(_) => {
                self.bind_object(ast, node, None);
                false
            }
            NodeKind::UiInlineComponent(inline) => {
                if let Some(component) = inline.component {
                    let parent = self.switch_object_value(None);
                    let value = self.bind_object(ast, component, Some(&inline.name));
                    self.switch_object_value(parent);
                    self.bind.inline_components.insert(inline.name.clone(), value);
                }
                false
            }
            NodeKind::UiScriptBinding(binding) => {
                if ast.qualified_name(binding.qualified_id).as_deref() == Some("id") {
                    self.bind_id(ast, node, binding.statement);
                }
                match binding.statement {
                    Some(statement) if matches!(ast.kind(statement), Some(NodeKind::Block { .. })) => {
                        self.bind_block_scope(ast, node, statement);
                        false
                    }
                    _ => true,
                }
            }
            NodeKind::UiPublicMember(member) => match member.statement {
                Some(statement) if matches!(ast.kind(statement), Some(NodeKind::Block { .. })) => {
                    self.bind_block_scope(ast, node, statement);
                    ast.accept(member.binding, self);
                    false
                }
                _ => true,
            },
            NodeKind::VariableDeclaration(declaration) => {
                if declaration.name.is_empty() {
                    return false;
                }
                let reference = self.owner.new_reference(Reference::AstVariable(AstVariableReference::new(
                    self.doc.clone(),
                    node,
                    declaration,
                )));
                if let Some(object) = self.current.as_ref().and_then(|c| c.as_object()) {
                    object.set_member(declaration.name.clone(), &reference);
                }
                true
            }
            NodeKind::FunctionDeclaration(_) => {
                self.bind_function(ast, node, true);
                false
            }
            NodeKind::FunctionExpression(_) => {
                self.bind_function(ast, node, false);
                false
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::ImportType;
    use qmljs_ast::AstBuilder;

    fn qml(build: impl FnOnce(&mut AstBuilder) -> (Vec<NodeId>, NodeId)) -> Arc<Document> {
        let mut b = AstBuilder::new();
        let (headers, root) = build(&mut b);
        Document::new("/proj/Main.qml", Dialect::Qml, b.finish_qml(headers, root))
    }

    #[test]
    fn test_objects_and_ids() {
        let mut list = None;
        let doc = qml(|b| {
            let id = b.identifier("otherId");
            let id_binding = b.script_expression("id", id);
            let list_view = b.object_definition("ListView", vec![id_binding]);
            list = Some(list_view);
            let root = b.object_definition("Item", vec![list_view]);
            (vec![], root)
        });
        let bind = doc.bind();
        let root = bind.root_object_value().unwrap();
        assert_eq!(root.as_object().unwrap().class_name(), "Main");

        let list = bind.find_qml_object(list.unwrap()).unwrap();
        assert_eq!(list.as_object().unwrap().class_name(), "ListView");
        let parent = list.as_object().unwrap().own_member("parent").unwrap();
        assert!(Arc::ptr_eq(&parent, root));

        let by_id = bind.id_environment().as_object().unwrap().own_member("otherId").unwrap();
        assert!(Arc::ptr_eq(&by_id, &list));
        assert_eq!(bind.qml_prototype_names(), vec!["Item", "ListView"]);
        assert!(bind.diagnostics().is_empty());

        let prototype = root.as_object().unwrap().raw_prototype().unwrap();
        let reference = prototype.as_reference().unwrap().as_qml_prototype().unwrap();
        assert_eq!(reference.type_name(), ["Item".to_string()]);
    }

    #[test]
    fn test_duplicate_id() {
        let doc = qml(|b| {
            let first = b.identifier("twin");
            let first = b.script_expression("id", first);
            let a = b.object_definition("Item", vec![first]);
            let second = b.identifier("twin");
            let second = b.script_expression("id", second);
            let c = b.object_definition("Item", vec![second]);
            let root = b.object_definition("Item", vec![a, c]);
            (vec![], root)
        });
        let diagnostics = doc.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, 104);
    }

    #[test]
    fn test_grouped_property_binding() {
        let mut grouped = None;
        let doc = qml(|b| {
            let fill = b.identifier("parent");
            let fill = b.script_expression("fill", fill);
            let anchors = b.object_definition("anchors", vec![fill]);
            grouped = Some(anchors);
            let root = b.object_definition("Rectangle", vec![anchors]);
            (vec![], root)
        });
        let grouped = grouped.unwrap();
        assert!(doc.bind().is_grouped_property_binding(grouped));
        assert!(doc.bind().find_qml_object(grouped).is_none());
    }

    #[test]
    fn test_imports_and_version_errors() {
        let doc = qml(|b| {
            let quick = b.import_module("QtQuick", Some("2.15"), None);
            let no_version = b.import_module("QtQml", None, None);
            let bad_version = b.import_module("QtQuick.Controls", Some("two"), None);
            let js = b.import_file("logic.js", None, Some("Logic"));
            let dir = b.import_file("../components", None, None);
            let root = b.object_definition("Item", vec![]);
            (vec![quick, no_version, bad_version, js, dir], root)
        });
        let imports = doc.bind().imports();
        assert_eq!(imports.len(), 3);
        assert_eq!(imports[0].import_type(), ImportType::Library);
        assert_eq!(imports[0].version(), ComponentVersion::new(2, 15));
        assert_eq!(imports[1].import_type(), ImportType::File);
        assert_eq!(imports[1].path(), "/proj/logic.js");
        assert_eq!(imports[1].alias(), Some("Logic"));
        assert_eq!(imports[2].import_type(), ImportType::Directory);
        assert_eq!(imports[2].path(), "/components");

        let codes: Vec<u32> = doc.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![101, 102]);
    }

    #[test]
    fn test_function_scopes() {
        let mut function = None;
        let doc = qml(|b| {
            let x = b.identifier("x");
            let ret = b.return_statement(Some(x));
            let f = b.function_declaration("twice", &["x"], vec![ret]);
            function = Some(f);
            let element = b.source_element(f);
            let root = b.object_definition("Item", vec![element]);
            (vec![], root)
        });
        let bind = doc.bind();
        let function = function.unwrap();
        let root = bind.root_object_value().unwrap();
        let member = root.as_object().unwrap().own_member("twice").unwrap();
        assert!(Arc::ptr_eq(&member, &bind.find_function(function).unwrap()));
        assert_eq!(member.as_function().unwrap().argument_name(0).as_deref(), Some("x"));

        let scope = bind.find_attached_js_scope(function).unwrap();
        assert!(scope.lookup_member("x", None).unwrap().is_unknown());
        let arguments = scope.lookup_member("arguments", None).unwrap();
        let callee = arguments.lookup_member("callee", None).unwrap();
        assert!(Arc::ptr_eq(&callee, &member));
    }

    #[test]
    fn test_js_library_and_variables() {
        let mut b = AstBuilder::new();
        let pragma = b.pragma("library");
        let one = b.number(1.0);
        let declaration = b.var_statement(vec![("counter", Some(one))]);
        let doc = Document::new("/proj/util.js", Dialect::JavaScript, b.finish_program(vec![pragma, declaration]));
        let bind = doc.bind();
        assert!(bind.is_js_library());
        let root = bind.root_object_value().unwrap();
        let counter = root.as_object().unwrap().own_member("counter").unwrap();
        assert!(counter.as_reference().unwrap().as_ast_variable().is_some());
    }

    #[test]
    fn test_inline_component() {
        let doc = qml(|b| {
            let badge = b.object_definition("Rectangle", vec![]);
            let inline = b.inline_component("Badge", badge);
            let root = b.object_definition("Item", vec![inline]);
            (vec![], root)
        });
        let badge = doc.bind().inline_component("Badge").unwrap();
        assert_eq!(badge.as_object().unwrap().class_name(), "Badge");
        assert!(badge.as_object().unwrap().own_member("parent").is_none());
        let root = doc.bind().root_object_value().unwrap();
        assert_eq!(root.as_object().unwrap().class_name(), "Main");
    }
}
