//! Documents, snapshots and module library information.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use qmljs_ast::{Ast, Dialect};
use qmljs_core::version::ComponentVersion;
use qmljs_diagnostics::Diagnostic;
use qmljs_metatypes::FakeMetaObject;

use crate::bind::Bind;

/// One parsed and bound QML or JavaScript file.
pub struct Document {
    file_name: String,
    path: String,
    component_name: String,
    dialect: Dialect,
    ast: Ast,
    bind: Bind,
}

impl Document {
    /// Take ownership of `ast` and bind it.
    pub fn new(file_name: &str, dialect: Dialect, ast: Ast) -> Arc<Document> {
        let file_name = qmljs_path::clean_path(file_name);
        let path = qmljs_path::directory_of(&file_name);
        let component_name = qmljs_path::component_name(&file_name).to_string();
        Arc::new_cyclic(|weak| {
            let bind = Bind::new(weak.clone(), &ast, dialect, &file_name, &component_name);
            Document {
                file_name,
                path,
                component_name,
                dialect,
                ast,
                bind,
            }
        })
    }

    /// Choose the dialect from the file extension.
    pub fn from_path(file_name: &str, ast: Ast) -> Arc<Document> {
        let dialect = if qmljs_path::is_js_file(file_name) {
            Dialect::JavaScript
        } else {
            Dialect::Qml
        };
        Self::new(file_name, dialect, ast)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The directory containing the document.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The type name a QML document declares, e.g. `Button` for
    /// `Button.qml`.
    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn is_qml_document(&self) -> bool {
        self.dialect.is_qml()
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn bind(&self) -> &Bind {
        &self.bind
    }

    /// Problems found while binding.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.bind.diagnostics()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("file_name", &self.file_name)
            .field("dialect", &self.dialect)
            .field("nodes", &self.ast.len())
            .finish()
    }
}

// ============================================================================
// LibraryInfo
// ============================================================================

/// A type listed in a module's `qmldir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QmlDirComponent {
    pub type_name: String,
    pub version: ComponentVersion,
    pub file_name: String,
    pub singleton: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TypeInfoStatus {
    /// The module has plugins but nothing describes their types.
    #[default]
    NoTypeInfo,
    Loaded,
    Error(String),
}

/// What is known about a module directory.
#[derive(Debug, Clone, Default)]
pub struct LibraryInfo {
    pub components: Vec<QmlDirComponent>,
    /// C++ types registered by the module's plugins.
    pub meta_objects: Vec<Arc<FakeMetaObject>>,
    pub has_plugins: bool,
    pub type_info_status: TypeInfoStatus,
    /// Modules imported by this one (`depends` lines).
    pub dependencies: Vec<String>,
}

impl LibraryInfo {
    /// Read the lines of a `qmldir` file. Unknown lines are skipped.
    ///
    /// ```text
    /// module QtQuick.Controls
    /// plugin qtquickcontrols2plugin
    /// Button 2.0 Button.qml
    /// singleton Theme 1.0 Theme.qml
    /// depends QtQuick 2.15
    /// ```
    pub fn from_qmldir(text: &str) -> LibraryInfo {
        let mut info = LibraryInfo::default();
        for line in text.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts.as_slice() {
                [] => {}
                ["plugin", ..] => info.has_plugins = true,
                ["depends", module, ..] => info.dependencies.push(module.to_string()),
                ["singleton", type_name, version, file] => {
                    if let Ok(version) = version.parse() {
                        info.components.push(QmlDirComponent {
                            type_name: type_name.to_string(),
                            version,
                            file_name: file.to_string(),
                            singleton: true,
                        });
                    }
                }
                [type_name, version, file] if starts_uppercase(type_name) => {
                    if let Ok(version) = version.parse() {
                        info.components.push(QmlDirComponent {
                            type_name: type_name.to_string(),
                            version,
                            file_name: file.to_string(),
                            singleton: false,
                        });
                    }
                }
                _ => {}
            }
        }
        if !info.has_plugins {
            info.type_info_status = TypeInfoStatus::Loaded;
        }
        info
    }

    pub fn with_meta_objects(mut self, meta_objects: Vec<Arc<FakeMetaObject>>) -> Self {
        self.meta_objects = meta_objects;
        self.type_info_status = TypeInfoStatus::Loaded;
        self
    }
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

// ============================================================================
// Snapshot
// ============================================================================

/// Every document and module library known to one analysis.
#[derive(Clone, Default)]
pub struct Snapshot {
    documents: IndexMap<String, Arc<Document>>,
    libraries: FxHashMap<String, Arc<LibraryInfo>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a document, keyed by its file name.
    pub fn insert(&mut self, document: Arc<Document>) {
        self.documents.insert(document.file_name().to_string(), document);
    }

    pub fn remove(&mut self, file_name: &str) -> Option<Arc<Document>> {
        self.documents.shift_remove(&qmljs_path::clean_path(file_name))
    }

    pub fn document(&self, file_name: &str) -> Option<&Arc<Document>> {
        self.documents
            .get(file_name)
            .or_else(|| self.documents.get(&qmljs_path::clean_path(file_name)))
    }

    /// Documents directly inside `path`, in insertion order.
    pub fn documents_in_directory(&self, path: &str) -> Vec<Arc<Document>> {
        let path = qmljs_path::clean_path(path);
        self.documents
            .values()
            .filter(|doc| doc.path() == path)
            .cloned()
            .collect()
    }

    pub fn insert_library_info(&mut self, path: &str, info: LibraryInfo) {
        self.libraries.insert(qmljs_path::clean_path(path), Arc::new(info));
    }

    pub fn library_info(&self, path: &str) -> Option<&Arc<LibraryInfo>> {
        self.libraries
            .get(path)
            .or_else(|| self.libraries.get(&qmljs_path::clean_path(path)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Document>> {
        self.documents.values()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmljs_ast::AstBuilder;

    fn empty_qml(file_name: &str) -> Arc<Document> {
        let mut b = AstBuilder::new();
        let root = b.object_definition("Item", vec![]);
        Document::new(file_name, Dialect::Qml, b.finish_qml(vec![], root))
    }

    #[test]
    fn test_document_names() {
        let doc = empty_qml("/proj/./qml/Button.ui.qml");
        assert_eq!(doc.file_name(), "/proj/qml/Button.ui.qml");
        assert_eq!(doc.path(), "/proj/qml");
        assert_eq!(doc.component_name(), "Button");
        assert!(doc.is_qml_document());
    }

    #[test]
    fn test_snapshot_directories() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(empty_qml("/proj/Main.qml"));
        snapshot.insert(empty_qml("/proj/Button.qml"));
        snapshot.insert(empty_qml("/proj/sub/Other.qml"));
        assert_eq!(snapshot.len(), 3);
        let names: Vec<String> = snapshot
            .documents_in_directory("/proj/")
            .iter()
            .map(|d| d.component_name().to_string())
            .collect();
        assert_eq!(names, vec!["Main", "Button"]);
        assert!(snapshot.document("/proj/sub/../Main.qml").is_some());
        assert!(snapshot.remove("/proj/Main.qml").is_some());
        assert!(snapshot.document("/proj/Main.qml").is_none());
    }

    #[test]
    fn test_qmldir() {
        let info = LibraryInfo::from_qmldir(
            "module Shapes\n\
             # comment\n\
             Circle 1.0 Circle.qml\n\
             Circle 1.1 Circle11.qml\n\
             singleton Palette 1.0 Palette.qml\n\
             internal Helper Helper.qml\n\
             depends QtQuick 2.0\n",
        );
        assert_eq!(info.components.len(), 3);
        assert_eq!(info.components[1].version, ComponentVersion::new(1, 1));
        assert!(info.components[2].singleton);
        assert_eq!(info.dependencies, vec!["QtQuick"]);
        assert!(!info.has_plugins);
        assert_eq!(info.type_info_status, TypeInfoStatus::Loaded);

        let plugin = LibraryInfo::from_qmldir("module Native\nplugin nativeplugin\n");
        assert!(plugin.has_plugins);
        assert_eq!(plugin.type_info_status, TypeInfoStatus::NoTypeInfo);
    }
}
