//! Linking a snapshot into a [`Context`].
//!
//! Every document gets an import table, in this order:
//! 1. the types of the builtin `<default>` package
//! 2. for QML documents, the documents of their own directory
//! 3. the imports written in the document
//!
//! Documents are linked in parallel. Resolved imports are shared through a
//! cache keyed by import type, path and version, so two documents importing
//! the same module see the same import object.

use std::sync::Arc;

use dashmap::DashMap;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace, warn};

use qmljs_core::version::ComponentVersion;
use qmljs_diagnostics::{messages, Diagnostic, DiagnosticMessage};

use crate::context::{Context, ContextPtr, ViewerContext};
use crate::cpp_types::DEFAULT_PACKAGE;
use crate::document::{Document, LibraryInfo, Snapshot, TypeInfoStatus};
use crate::imports::{Import, ImportInfo, ImportType, Imports};
use crate::value::ValueRef;
use crate::value_owner::{shared, ValueOwner};

/// Link diagnostics, by document file name.
pub type LinkDiagnostics = FxHashMap<String, Vec<Diagnostic>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ImportCacheKey {
    import_type: ImportType,
    path: String,
    version: ComponentVersion,
}

impl ImportCacheKey {
    fn new(info: &ImportInfo) -> Self {
        Self {
            import_type: info.import_type(),
            path: info.path().to_string(),
            version: info.version(),
        }
    }
}

/// Builds a [`Context`] from a snapshot.
pub struct Link {
    snapshot: Snapshot,
    viewer_context: ViewerContext,
    builtins: LibraryInfo,
}

impl Link {
    /// `builtins` describes the C++ types every document sees; exports
    /// without a package go to the `<default>` package.
    pub fn new(snapshot: Snapshot, viewer_context: ViewerContext, builtins: LibraryInfo) -> Self {
        Self {
            snapshot,
            viewer_context,
            builtins,
        }
    }

    pub fn link(self) -> ContextPtr {
        self.link_with_diagnostics().0
    }

    /// Link every document of the snapshot. Diagnostics produced while
    /// binding stay on the documents; only import problems are returned.
    #[tracing::instrument(skip_all, fields(documents = self.snapshot.len()))]
    pub fn link_with_diagnostics(self) -> (ContextPtr, LinkDiagnostics) {
        let owner = ValueOwner::new();
        owner
            .cpp_qml_types()
            .load(&owner, "<builtins>", &self.builtins.meta_objects, Some(DEFAULT_PACKAGE));
        install_context_properties(&owner, &self.viewer_context);

        let linker = Linker {
            snapshot: &self.snapshot,
            viewer_context: &self.viewer_context,
            owner: &owner,
            cache: DashMap::new(),
        };
        let documents: Vec<&Arc<Document>> = self.snapshot.iter().collect();
        let linked: Vec<(String, Imports, Vec<Diagnostic>)> = documents
            .par_iter()
            .map(|doc| {
                let (imports, diagnostics) = linker.link_imports(doc);
                (doc.file_name().to_string(), imports, diagnostics)
            })
            .collect();

        let mut imports = FxHashMap::default();
        let mut diagnostics = LinkDiagnostics::default();
        for (file_name, document_imports, document_diagnostics) in linked {
            if !document_diagnostics.is_empty() {
                diagnostics.insert(file_name.clone(), document_diagnostics);
            }
            imports.insert(file_name, Arc::new(document_imports));
        }
        debug!(
            cached_imports = linker.cache.len(),
            values = owner.registered_count(),
            "linked snapshot"
        );

        let context = Context::new(self.snapshot, owner, imports, self.viewer_context);
        (context, diagnostics)
    }
}

/// The object behind the C++ context properties of the viewer.
fn install_context_properties(owner: &Arc<ValueOwner>, viewer_context: &ViewerContext) {
    let properties = owner.new_object_with_class("ContextProperties", None);
    if let Some(object) = properties.as_object() {
        for (name, class_name) in &viewer_context.context_properties {
            let value = owner
                .cpp_qml_types()
                .object_by_cpp_name(class_name)
                .unwrap_or_else(|| shared().unknown());
            object.set_member(name.clone(), &value);
        }
    }
    owner.cpp_qml_types().set_cpp_context_properties(properties);
}

struct Linker<'a> {
    snapshot: &'a Snapshot,
    viewer_context: &'a ViewerContext,
    owner: &'a Arc<ValueOwner>,
    cache: DashMap<ImportCacheKey, Import>,
}

impl Linker<'_> {
    fn link_imports(&self, doc: &Arc<Document>) -> (Imports, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let mut imports = vec![self.cached(&ImportInfo::default_package_import(), &mut diagnostics, doc)];

        if doc.is_qml_document() {
            let implicit = ImportInfo::implicit_directory_import(doc.path());
            imports.push(self.cached(&implicit, &mut diagnostics, doc));
        }

        for info in doc.bind().imports() {
            imports.push(self.cached(info, &mut diagnostics, doc));
        }

        if imports.iter().any(|import| !import.valid) {
            trace!(file = doc.file_name(), "some imports failed");
        }
        (Imports::new(self.owner, imports), diagnostics)
    }

    /// Resolve `info`, reusing an earlier resolution of the same import.
    /// Failed imports are not cached so that each importing document gets
    /// its own diagnostic.
    fn cached(&self, info: &ImportInfo, diagnostics: &mut Vec<Diagnostic>, doc: &Document) -> Import {
        let key = ImportCacheKey::new(info);
        if let Some(hit) = self.cache.get(&key) {
            let mut import = hit.value().clone();
            import.info = info.clone();
            return import;
        }

        let resolved = self.resolve(info, diagnostics, doc);
        if !resolved.valid {
            return resolved;
        }
        let mut import = self.cache.entry(key).or_insert(resolved).value().clone();
        import.info = info.clone();
        import
    }

    fn resolve(&self, info: &ImportInfo, diagnostics: &mut Vec<Diagnostic>, doc: &Document) -> Import {
        match info.import_type() {
            ImportType::Library if info.name() == DEFAULT_PACKAGE => self.import_default_package(info),
            ImportType::Library => self.import_module(info, diagnostics, doc),
            ImportType::Directory | ImportType::ImplicitDirectory => {
                self.import_directory(info, diagnostics, doc)
            }
            ImportType::File => self.import_file(info, diagnostics, doc),
            ImportType::UnknownFile | ImportType::Invalid => {
                self.report(diagnostics, doc, info, &messages::FILE_OR_DIRECTORY_NOT_FOUND_0, &[info.name()]);
                self.failed(info)
            }
        }
    }

    /// The builtin types. Never fails, even when no builtins were loaded.
    fn import_default_package(&self, info: &ImportInfo) -> Import {
        let object = self.owner.new_object_with_class(DEFAULT_PACKAGE, None);
        if let Some(members) = object.as_object() {
            let types = self
                .owner
                .cpp_qml_types()
                .create_objects_for_import(self.owner, DEFAULT_PACKAGE, info.version());
            for value in &types {
                if let Some(name) = value.as_object().map(|o| o.class_name().to_string()) {
                    members.set_member(name, value);
                }
            }
        }
        Import::new(object, info.clone())
    }

    fn failed(&self, info: &ImportInfo) -> Import {
        let mut import = Import::new(self.owner.new_object(None), info.clone());
        import.valid = false;
        import
    }

    fn report(
        &self,
        diagnostics: &mut Vec<Diagnostic>,
        doc: &Document,
        info: &ImportInfo,
        message: &DiagnosticMessage,
        args: &[&str],
    ) {
        let diagnostic = match info.node() {
            Some(node) => {
                Diagnostic::with_location(doc.file_name(), doc.ast().range(node).to_span(), message, args)
            }
            None => Diagnostic::in_file(doc.file_name(), message, args),
        };
        warn!(file = doc.file_name(), code = diagnostic.code, "{}", diagnostic.message_text);
        diagnostics.push(diagnostic);
    }

    /// A directory import: the directory's `qmldir` components plus the QML
    /// documents found in it, by component name.
    fn import_directory(&self, info: &ImportInfo, diagnostics: &mut Vec<Diagnostic>, doc: &Document) -> Import {
        let path = info.path();
        let object = self.owner.new_object_with_class(path, None);
        let mut import = Import::new(object.clone(), info.clone());

        let library = self.snapshot.library_info(path).cloned();
        if let Some(library) = &library {
            import.library_path = path.to_string();
            self.import_library(info, &object, path, library, diagnostics, doc);
        }

        let documents = self.snapshot.documents_in_directory(path);
        for imported in documents.iter().filter(|d| d.is_qml_document()) {
            if let (Some(root), Some(members)) = (imported.bind().root_object_value(), object.as_object()) {
                if members.own_member(imported.component_name()).is_none() {
                    members.set_member(imported.component_name(), root);
                }
            }
        }

        if info.import_type() == ImportType::Directory && library.is_none() && documents.is_empty() {
            self.report(diagnostics, doc, info, &messages::FILE_OR_DIRECTORY_NOT_FOUND_0, &[info.name()]);
            import.valid = false;
        }
        import
    }

    /// A file import: the global scope of a JavaScript file or the root
    /// object of a QML file.
    fn import_file(&self, info: &ImportInfo, diagnostics: &mut Vec<Diagnostic>, doc: &Document) -> Import {
        let root = self
            .snapshot
            .document(info.path())
            .and_then(|imported| imported.bind().root_object_value().cloned());
        match root {
            Some(root) => Import::new(root, info.clone()),
            None => {
                self.report(diagnostics, doc, info, &messages::FILE_OR_DIRECTORY_NOT_FOUND_0, &[info.name()]);
                self.failed(info)
            }
        }
    }

    /// A module import: the first library directory found along the import
    /// paths, plus the C++ types registered for the module.
    fn import_module(&self, info: &ImportInfo, diagnostics: &mut Vec<Diagnostic>, doc: &Document) -> Import {
        let uri = info.name();
        let version = info.version();
        let object = self.owner.new_object_with_class(uri, None);
        let mut import = Import::new(object.clone(), info.clone());

        let mut found = false;
        'paths: for import_path in &self.viewer_context.paths {
            let candidates =
                qmljs_path::module_directory_candidates(import_path, uri, version.major(), version.minor());
            for candidate in candidates {
                if let Some(library) = self.snapshot.library_info(&candidate).cloned() {
                    import.library_path = candidate.clone();
                    self.import_library(info, &object, &candidate, &library, diagnostics, doc);
                    found = true;
                    break 'paths;
                }
            }
        }

        let cpp_types = self.owner.cpp_qml_types();
        if cpp_types.has_module(uri) {
            found = true;
            let exported = cpp_types.create_objects_for_import(self.owner, uri, version);
            if exported.is_empty() && object.as_object().is_some_and(|o| o.member_count() == 0) {
                let version_text = version.to_string();
                self.report(
                    diagnostics,
                    doc,
                    info,
                    &messages::MODULE_0_HAS_NO_EXPORTS_AT_VERSION_1,
                    &[uri, &version_text],
                );
            }
            if let Some(members) = object.as_object() {
                for value in &exported {
                    if let Some(name) = value.as_object().map(|o| o.class_name().to_string()) {
                        members.set_member(name, value);
                    }
                }
            }
        }

        if !found {
            let description = format!("{} {}", uri, version);
            self.report(diagnostics, doc, info, &messages::QML_MODULE_NOT_FOUND_0, &[&description]);
            import.valid = false;
        }
        import
    }

    /// Add the `qmldir` components of `library` visible at the imported
    /// version, and load the C++ types its plugins describe.
    fn import_library(
        &self,
        info: &ImportInfo,
        object: &ValueRef,
        library_path: &str,
        library: &Arc<LibraryInfo>,
        diagnostics: &mut Vec<Diagnostic>,
        doc: &Document,
    ) {
        let Some(members) = object.as_object() else {
            return;
        };
        let version = info.version();
        let mut best: FxHashMap<&str, ComponentVersion> = FxHashMap::default();
        for component in &library.components {
            if version.is_valid() && component.version > version {
                continue;
            }
            if best.get(component.type_name.as_str()).is_some_and(|seen| *seen > component.version) {
                continue;
            }
            let file_name = qmljs_path::combine_paths(library_path, &component.file_name);
            let Some(root) = self
                .snapshot
                .document(&file_name)
                .and_then(|d| d.bind().root_object_value().cloned())
            else {
                continue;
            };
            best.insert(&component.type_name, component.version);
            members.set_member(component.type_name.clone(), &root);
        }

        if library.has_plugins {
            match &library.type_info_status {
                TypeInfoStatus::NoTypeInfo => self.report(
                    diagnostics,
                    doc,
                    info,
                    &messages::QML_MODULE_CONTAINS_CPP_PLUGINS_WITHOUT_TYPE_INFORMATION_0,
                    &[info.name()],
                ),
                TypeInfoStatus::Error(error) => self.report(
                    diagnostics,
                    doc,
                    info,
                    &messages::FAILED_TO_READ_TYPE_INFORMATION_OF_0_1,
                    &[info.name(), error],
                ),
                TypeInfoStatus::Loaded => {}
            }
        }
        self.load_library_types(library_path, library);
    }

    /// Load the described C++ types of `library` and of the modules it
    /// depends on, so that prototypes across modules resolve. Dependencies
    /// load first.
    fn load_library_types(&self, library_path: &str, library: &Arc<LibraryInfo>) {
        let mut visited: FxHashSet<String> = FxHashSet::default();
        self.load_library_types_from(library_path, library, &mut visited);
    }

    fn load_library_types_from(&self, path: &str, library: &Arc<LibraryInfo>, visited: &mut FxHashSet<String>) {
        if !visited.insert(path.to_string()) {
            return;
        }
        for dependency in &library.dependencies {
            let found = self.viewer_context.paths.iter().find_map(|import_path| {
                qmljs_path::module_directory_candidates(import_path, dependency, -1, -1)
                    .into_iter()
                    .find_map(|candidate| {
                        self.snapshot
                            .library_info(&candidate)
                            .map(|info| (candidate, info.clone()))
                    })
            });
            match found {
                Some((dependency_path, dependency_library)) => {
                    self.load_library_types_from(&dependency_path, &dependency_library, visited)
                }
                None => trace!(dependency = dependency.as_str(), "dependency not found"),
            }
        }
        if !library.meta_objects.is_empty() {
            self.owner
                .cpp_qml_types()
                .load(self.owner, path, &library.meta_objects, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmljs_ast::{AstBuilder, Dialect};
    use qmljs_metatypes::FakeMetaObject;

    fn qml_with_imports(file_name: &str, imports: &[(&str, Option<&str>)]) -> Arc<Document> {
        let mut b = AstBuilder::new();
        let headers = imports
            .iter()
            .map(|(uri, version)| b.import_module(uri, *version, None))
            .collect();
        let root = b.object_definition("Item", vec![]);
        Document::new(file_name, Dialect::Qml, b.finish_qml(headers, root))
    }

    fn builtins() -> LibraryInfo {
        let mut object = FakeMetaObject::new("QObject").with_export("", "QtObject", ComponentVersion::new(1, 0));
        object.ensure_cpp_export();
        LibraryInfo::default().with_meta_objects(vec![Arc::new(object)])
    }

    #[test]
    fn test_default_and_directory_imports() {
        let mut snapshot = Snapshot::new();
        let main = qml_with_imports("/proj/Main.qml", &[]);
        let button = qml_with_imports("/proj/Button.qml", &[]);
        snapshot.insert(main.clone());
        snapshot.insert(button.clone());

        let (context, diagnostics) =
            Link::new(snapshot, ViewerContext::default(), builtins()).link_with_diagnostics();
        assert!(diagnostics.is_empty());

        let imports = context.imports(&main).unwrap();
        assert_eq!(imports.len(), 2);
        assert_eq!(imports.all()[0].info.import_type(), ImportType::Library);
        assert_eq!(imports.all()[1].info.import_type(), ImportType::ImplicitDirectory);

        let found = context.lookup_type(&main, &["Button".to_string()]).unwrap();
        assert!(Arc::ptr_eq(&found, button.bind().root_object_value().unwrap()));
        let qt_object = context.lookup_type(&main, &["QtObject".to_string()]).unwrap();
        assert!(qt_object.as_cpp_component().is_some());
    }

    #[test]
    fn test_missing_module() {
        let mut snapshot = Snapshot::new();
        let main = qml_with_imports("/proj/Main.qml", &[("Missing.Module", Some("1.0"))]);
        snapshot.insert(main.clone());

        let (context, diagnostics) =
            Link::new(snapshot, ViewerContext::default(), builtins()).link_with_diagnostics();
        let reported = &diagnostics[main.file_name()];
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].code, 201);
        assert!(reported[0].message_text.contains("Missing.Module 1.0"));
        assert!(context.imports(&main).unwrap().import_failed());
    }

    #[test]
    fn test_imports_are_shared_between_documents() {
        let mut snapshot = Snapshot::new();
        let a = qml_with_imports("/proj/A.qml", &[]);
        let b = qml_with_imports("/proj/B.qml", &[]);
        snapshot.insert(a.clone());
        snapshot.insert(b.clone());
        let context = Link::new(snapshot, ViewerContext::default(), builtins()).link();

        let first = &context.imports(&a).unwrap().all()[0].object;
        let second = &context.imports(&b).unwrap().all()[0].object;
        assert!(Arc::ptr_eq(first, second));
    }

    #[test]
    fn test_context_properties() {
        let mut viewer = ViewerContext::default();
        viewer.context_properties.insert("backend".to_string(), "QObject".to_string());
        viewer.context_properties.insert("missing".to_string(), "NoSuchClass".to_string());
        let context = Link::new(Snapshot::new(), viewer, builtins()).link();

        let properties = context.value_owner().cpp_qml_types().cpp_context_properties().unwrap();
        let backend = properties.lookup_member("backend", None).unwrap();
        assert_eq!(backend.as_cpp_component().unwrap().meta_object().class_name, "QObject");
        assert!(properties.lookup_member("missing", None).unwrap().is_unknown());
    }
}
