//! The linked, immutable view of a snapshot.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use qmljs_options::{Language, ProjectConfig};

use crate::document::{Document, Snapshot};
use crate::imports::Imports;
use crate::prototype_iterator::PrototypeIterator;
use crate::reference_context::ReferenceContext;
use crate::value::ValueRef;
use crate::value_owner::ValueOwner;

pub type ContextPtr = Arc<Context>;

/// How the documents are going to be run.
#[derive(Debug, Clone, Default)]
pub struct ViewerContext {
    /// Directories searched for modules.
    pub paths: Vec<String>,
    pub selectors: Vec<String>,
    pub language: Language,
    /// Context property name -> C++ class name.
    pub context_properties: IndexMap<String, String>,
}

impl ViewerContext {
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            paths: config.import_paths().to_vec(),
            selectors: config.selectors.clone().unwrap_or_default(),
            language: config.language(),
            context_properties: config.context_properties.clone().unwrap_or_default(),
        }
    }
}

/// Everything needed to look up types and resolve references: the
/// documents, the values, and the imports of every document.
///
/// A context never changes after [`Link`](crate::link::Link) created it and
/// may be shared between threads.
pub struct Context {
    snapshot: Snapshot,
    value_owner: Arc<ValueOwner>,
    imports: FxHashMap<String, Arc<Imports>>,
    viewer_context: ViewerContext,
}

impl Context {
    pub fn new(
        snapshot: Snapshot,
        value_owner: Arc<ValueOwner>,
        imports: FxHashMap<String, Arc<Imports>>,
        viewer_context: ViewerContext,
    ) -> ContextPtr {
        Arc::new(Self {
            snapshot,
            value_owner,
            imports,
            viewer_context,
        })
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn value_owner(&self) -> &Arc<ValueOwner> {
        &self.value_owner
    }

    pub fn viewer_context(&self) -> &ViewerContext {
        &self.viewer_context
    }

    pub fn imports(&self, doc: &Document) -> Option<&Arc<Imports>> {
        self.imports.get(doc.file_name())
    }

    /// Resolve a dotted type name as written in `doc`, e.g.
    /// `["Controls", "Button"]`.
    pub fn lookup_type(self: &Arc<Self>, doc: &Document, segments: &[String]) -> Option<ValueRef> {
        self.lookup_type_until(doc, segments, segments.len())
    }

    /// Resolve the first `end` segments of a dotted type name.
    ///
    /// The first segment may name an inline component of `doc`; otherwise it
    /// is looked up in the type scope. Each following segment is a member of
    /// the previous object, prototypes not included.
    pub fn lookup_type_until(self: &Arc<Self>, doc: &Document, segments: &[String], end: usize) -> Option<ValueRef> {
        let segments = segments.get(..end.min(segments.len()))?;
        let (first, rest) = segments.split_first()?;

        let mut object = match doc.bind().inline_component(first) {
            Some(component) => component,
            None => {
                let type_scope = self.imports(doc)?.type_scope().clone();
                type_scope
                    .lookup_member_with_owner(first, Some(self), false)
                    .map(|(value, _)| value)
                    .filter(|value| value.is_object())?
            }
        };
        for segment in rest {
            object = object
                .lookup_member_with_owner(segment, Some(self), false)
                .map(|(value, _)| value)
                .filter(|value| value.is_object())?;
        }
        Some(object)
    }

    /// Resolve `value` if it is a reference. Each call starts with an empty
    /// in-flight stack.
    pub fn lookup_reference(self: &Arc<Self>, value: &ValueRef) -> Option<ValueRef> {
        ReferenceContext::new(self.clone()).lookup_reference(value)
    }

    /// The default property of `object`: the first one declared along its
    /// prototype chain.
    pub fn default_property_name(self: &Arc<Self>, object: &ValueRef) -> Option<String> {
        for prototype in PrototypeIterator::new(Some(object.clone()), Some(self)) {
            if let Some(ast_object) = prototype.as_ast_object() {
                if let Some(name) = ast_object.default_property_name() {
                    return Some(name.to_string());
                }
            } else if let Some(component) = prototype.as_cpp_component() {
                return component.default_property_name().map(str::to_string);
            }
        }
        None
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("documents", &self.snapshot.len())
            .field("imports", &self.imports.len())
            .field("value_owner", &self.value_owner)
            .finish()
    }
}
