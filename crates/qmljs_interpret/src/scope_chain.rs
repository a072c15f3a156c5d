//! The ordered scopes a name is looked up in.
//!
//! From innermost to outermost a chain holds:
//! - the JavaScript scopes (function bodies, signal handler parameters)
//! - the JavaScript import scope and the QML type scope of the document
//! - the ids of the document
//! - the current QML scope objects and the root object
//! - the roots and ids of components instantiating this one
//! - the C++ context properties
//! - the global object
//!
//! Chains are persistent: [`ScopeChain::with_js_scope`] and friends return a
//! new chain that shares everything with the old one, so a builder can keep
//! every intermediate chain and pop by dropping the newest.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::context::ContextPtr;
use crate::document::Document;
use crate::value::ValueRef;
use crate::value_owner::shared;

struct JsScopeFrame {
    scope: ValueRef,
    parent: Option<Arc<JsScopeFrame>>,
}

#[derive(Clone)]
pub struct ScopeChain {
    document: Arc<Document>,
    context: ContextPtr,
    global_scope: ValueRef,
    cpp_context_properties: Option<ValueRef>,
    /// Roots and ids of instantiating components, outermost first.
    component_scopes: Arc<[ValueRef]>,
    root_object: Option<ValueRef>,
    id_environment: Option<ValueRef>,
    qml_scope_objects: Arc<[ValueRef]>,
    qml_types: Option<ValueRef>,
    js_imports: Option<ValueRef>,
    js_scopes: Option<Arc<JsScopeFrame>>,
    js_scope_count: usize,
}

impl ScopeChain {
    /// The root scope of `document`: everything but QML scope objects and
    /// function scopes.
    pub fn new(document: Arc<Document>, context: ContextPtr) -> ScopeChain {
        let (qml_types, js_imports) = match context.imports(&document) {
            Some(imports) => (
                Some(imports.type_scope().clone()),
                Some(imports.js_import_scope().clone()),
            ),
            None => (None, None),
        };
        let cpp_context_properties = context.value_owner().cpp_qml_types().cpp_context_properties();

        let mut chain = ScopeChain {
            global_scope: shared().global_object(),
            cpp_context_properties,
            component_scopes: Arc::from(Vec::new()),
            root_object: None,
            id_environment: None,
            qml_scope_objects: Arc::from(Vec::new()),
            qml_types,
            js_imports,
            js_scopes: None,
            js_scope_count: 0,
            document,
            context,
        };

        let document = chain.document.clone();
        let bind = document.bind();
        if document.is_qml_document() {
            chain.root_object = bind.root_object_value().cloned();
            chain.id_environment = Some(bind.id_environment().clone());
            chain.component_scopes = Arc::from(chain.instantiating_component_scopes());
        } else {
            chain.component_scopes = Arc::from(chain.importing_component_scopes());
            if let Some(root) = bind.root_object_value() {
                chain = chain.with_js_scope(root);
            }
        }
        chain
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn context(&self) -> &ContextPtr {
        &self.context
    }

    pub fn global_scope(&self) -> &ValueRef {
        &self.global_scope
    }

    pub fn cpp_context_properties(&self) -> Option<&ValueRef> {
        self.cpp_context_properties.as_ref()
    }

    pub fn qml_types(&self) -> Option<&ValueRef> {
        self.qml_types.as_ref()
    }

    pub fn js_imports(&self) -> Option<&ValueRef> {
        self.js_imports.as_ref()
    }

    /// The objects whose properties are visible unqualified, usually the
    /// object being edited.
    pub fn qml_scope_objects(&self) -> &[ValueRef] {
        &self.qml_scope_objects
    }

    pub fn set_qml_scope_objects(&mut self, objects: Vec<ValueRef>) {
        self.qml_scope_objects = Arc::from(objects);
    }

    pub fn with_qml_scope_objects(&self, objects: Vec<ValueRef>) -> ScopeChain {
        let mut chain = self.clone();
        chain.set_qml_scope_objects(objects);
        chain
    }

    /// The JavaScript scopes, innermost first.
    pub fn js_scopes(&self) -> Vec<ValueRef> {
        let mut scopes = Vec::with_capacity(self.js_scope_count);
        let mut frame = self.js_scopes.as_deref();
        while let Some(current) = frame {
            scopes.push(current.scope.clone());
            frame = current.parent.as_deref();
        }
        scopes
    }

    pub fn append_js_scope(&mut self, scope: &ValueRef) {
        self.js_scopes = Some(Arc::new(JsScopeFrame {
            scope: scope.clone(),
            parent: self.js_scopes.take(),
        }));
        self.js_scope_count += 1;
    }

    pub fn with_js_scope(&self, scope: &ValueRef) -> ScopeChain {
        let mut chain = self.clone();
        chain.append_js_scope(scope);
        chain
    }

    /// Every scope, innermost first.
    pub fn all(&self) -> Vec<ValueRef> {
        let mut all = self.js_scopes();
        all.extend(self.js_imports.iter().cloned());
        all.extend(self.qml_types.iter().cloned());
        all.extend(self.id_environment.iter().cloned());
        all.extend(self.qml_scope_objects.iter().rev().cloned());
        if let Some(root) = &self.root_object {
            if !self.qml_scope_objects.iter().any(|object| Arc::ptr_eq(object, root)) {
                all.push(root.clone());
            }
        }
        // A JavaScript file only sees its importers from inside a function.
        if self.document.is_qml_document() || self.js_scope_count != 1 {
            all.extend(self.component_scopes.iter().rev().cloned());
        }
        all.extend(self.cpp_context_properties.iter().cloned());
        all.push(self.global_scope.clone());
        all
    }

    /// Look `name` up scope by scope; `undefined` when no scope has it. The
    /// result may be a reference.
    pub fn lookup(&self, name: &str) -> ValueRef {
        self.lookup_with_scope(name).0
    }

    /// Like [`lookup`](Self::lookup), also returning the scope the name was
    /// found in.
    pub fn lookup_with_scope(&self, name: &str) -> (ValueRef, Option<ValueRef>) {
        for scope in self.all() {
            if let Some(value) = scope.lookup_member(name, Some(&self.context)) {
                return (value, Some(scope));
            }
        }
        (shared().undefined(), None)
    }

    /// Documents that instantiate this one, directly or through another
    /// instantiating document, contribute their root object and ids.
    fn instantiating_component_scopes(&self) -> Vec<ValueRef> {
        let mut visited = FxHashSet::default();
        visited.insert(self.document.file_name().to_string());
        let mut scopes = Vec::new();
        self.collect_instantiating(&self.document, &mut visited, &mut scopes);
        scopes
    }

    fn collect_instantiating(
        &self,
        document: &Arc<Document>,
        visited: &mut FxHashSet<String>,
        scopes: &mut Vec<ValueRef>,
    ) {
        let Some(root) = document.bind().root_object_value() else {
            return;
        };
        for other in self.context.snapshot().iter() {
            if visited.contains(other.file_name()) || !other.is_qml_document() {
                continue;
            }
            if other.bind().uses_qml_prototype(root, &self.context) {
                visited.insert(other.file_name().to_string());
                self.collect_instantiating(other, visited, scopes);
                push_component(other, scopes);
            }
        }
    }

    /// QML documents importing this JavaScript file, and their instantiators.
    fn importing_component_scopes(&self) -> Vec<ValueRef> {
        let mut visited = FxHashSet::default();
        visited.insert(self.document.file_name().to_string());
        let mut scopes = Vec::new();
        for other in self.context.snapshot().iter() {
            if visited.contains(other.file_name()) {
                continue;
            }
            let imports_this = other
                .bind()
                .imports()
                .iter()
                .any(|import| import.path() == self.document.file_name());
            if imports_this {
                visited.insert(other.file_name().to_string());
                self.collect_instantiating(other, &mut visited, &mut scopes);
                push_component(other, &mut scopes);
            }
        }
        scopes
    }
}

fn push_component(document: &Document, scopes: &mut Vec<ValueRef>) {
    let bind = document.bind();
    if let Some(root) = bind.root_object_value() {
        scopes.push(root.clone());
    }
    scopes.push(bind.id_environment().clone());
}

impl fmt::Debug for ScopeChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeChain")
            .field("document", &self.document.file_name())
            .field("js_scopes", &self.js_scope_count)
            .field("qml_scope_objects", &self.qml_scope_objects.len())
            .field("component_scopes", &self.component_scopes.len())
            .finish()
    }
}
