//! Resolved imports and the two scopes they form.
//!
//! Every document gets an [`Imports`] table from the linker. Its type scope
//! makes the types of module, directory and implicit imports visible (or
//! the import itself under its alias); its JavaScript import scope makes
//! aliased `.js` imports visible. Both search the imports in reverse, so a
//! later import shadows an earlier one.

use std::sync::Arc;

use qmljs_ast::NodeId;
use qmljs_core::version::ComponentVersion;
use qmljs_path::SourceKind;

use crate::context::ContextPtr;
use crate::cpp_types::DEFAULT_PACKAGE;
use crate::member_processor::MemberProcessor;
use crate::object_value::{ObjectKind, ObjectValue, PropertyInfo};
use crate::value::ValueRef;
use crate::value_owner::ValueOwner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportType {
    Invalid,
    /// The directory of the importing document.
    ImplicitDirectory,
    /// A module, e.g. `import QtQuick 2.15`.
    Library,
    /// A single file, normally JavaScript.
    File,
    Directory,
    /// A path import whose target cannot be classified.
    UnknownFile,
}

/// One import as written, before or after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInfo {
    import_type: ImportType,
    name: String,
    path: String,
    version: ComponentVersion,
    alias: Option<String>,
    node: Option<NodeId>,
}

impl Default for ImportInfo {
    fn default() -> Self {
        Self {
            import_type: ImportType::Invalid,
            name: String::new(),
            path: String::new(),
            version: ComponentVersion::default(),
            alias: None,
            node: None,
        }
    }
}

impl ImportInfo {
    pub fn module_import(uri: &str, version: ComponentVersion, alias: Option<&str>, node: Option<NodeId>) -> Self {
        Self {
            import_type: ImportType::Library,
            name: uri.to_string(),
            path: qmljs_path::module_uri_to_path(uri),
            version,
            alias: alias.map(str::to_string),
            node,
        }
    }

    /// An import of a file or directory, relative to `document_path`.
    pub fn path_import(
        document_path: &str,
        path: &str,
        version: ComponentVersion,
        alias: Option<&str>,
        node: Option<NodeId>,
    ) -> Self {
        let import_type = if path.trim().is_empty() {
            ImportType::UnknownFile
        } else {
            match SourceKind::from_path(path) {
                Some(SourceKind::Qml) | Some(SourceKind::JavaScript) => ImportType::File,
                _ => ImportType::Directory,
            }
        };
        Self {
            import_type,
            name: path.to_string(),
            path: qmljs_path::combine_paths(document_path, path),
            version,
            alias: alias.map(str::to_string),
            node,
        }
    }

    pub fn implicit_directory_import(directory: &str) -> Self {
        let directory = qmljs_path::clean_path(directory);
        Self {
            import_type: ImportType::ImplicitDirectory,
            name: directory.clone(),
            path: directory,
            version: ComponentVersion::default(),
            alias: None,
            node: None,
        }
    }

    /// The types every document sees without importing anything.
    pub fn default_package_import() -> Self {
        Self::module_import(DEFAULT_PACKAGE, ComponentVersion::max(), None, None)
    }

    pub fn import_type(&self) -> ImportType {
        self.import_type
    }

    /// The module uri or the path as written.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved path, or the module uri with `/` separators.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> ComponentVersion {
        self.version
    }

    /// The `as` qualifier.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn is_valid(&self) -> bool {
        self.import_type != ImportType::Invalid
    }
}

/// A resolved import: an object whose members are what the import provides.
#[derive(Clone)]
pub struct Import {
    pub object: ValueRef,
    pub info: ImportInfo,
    /// The directory the module was found in, empty if not found.
    pub library_path: String,
    pub valid: bool,
}

impl Import {
    pub fn new(object: ValueRef, info: ImportInfo) -> Self {
        Self {
            object,
            info,
            library_path: String::new(),
            valid: true,
        }
    }
}

pub type ImportList = Arc<Vec<Import>>;

/// The resolved imports of one document.
pub struct Imports {
    imports: ImportList,
    type_scope: ValueRef,
    js_import_scope: ValueRef,
    import_failed: bool,
}

impl Imports {
    /// `imports` in declaration order; the scope objects are registered with
    /// `owner`.
    pub fn new(owner: &ValueOwner, imports: Vec<Import>) -> Self {
        let import_failed = imports.iter().any(|import| !import.valid);
        let imports: ImportList = Arc::new(imports);
        let type_scope = owner.new_object_value(ObjectValue::with_kind(
            "TypeScope",
            ObjectKind::TypeScope(imports.clone()),
        ));
        let js_import_scope = owner.new_object_value(ObjectValue::with_kind(
            "JSImportScope",
            ObjectKind::JsImportScope(imports.clone()),
        ));
        Self {
            imports,
            type_scope,
            js_import_scope,
            import_failed,
        }
    }

    pub fn all(&self) -> &[Import] {
        &self.imports
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    pub fn type_scope(&self) -> &ValueRef {
        &self.type_scope
    }

    pub fn js_import_scope(&self) -> &ValueRef {
        &self.js_import_scope
    }

    /// Whether some import could not be resolved.
    pub fn import_failed(&self) -> bool {
        self.import_failed
    }

    /// The import that provides the first segment of the dotted `name`.
    pub fn info(&self, name: &str, context: Option<&ContextPtr>) -> Option<&ImportInfo> {
        let first = name.split('.').next().unwrap_or(name);
        for import in self.imports.iter().rev() {
            let info = &import.info;
            if let Some(alias) = info.alias() {
                if alias == first {
                    return Some(info);
                }
                continue;
            }
            let provides = if info.import_type() == ImportType::File {
                import.object.as_object().is_some_and(|o| o.class_name() == first)
            } else {
                import.object.lookup_member(first, context).is_some()
            };
            if provides {
                return Some(info);
            }
        }
        None
    }
}

/// Lookup in the type scope. File imports carry no types; an aliased import
/// is found only under its alias.
pub(crate) fn lookup_in_type_scope(
    this: &ValueRef,
    imports: &ImportList,
    name: &str,
    context: Option<&ContextPtr>,
) -> Option<(ValueRef, ValueRef)> {
    for import in imports.iter().rev() {
        if import.info.import_type() == ImportType::File {
            continue;
        }
        if let Some(alias) = import.info.alias() {
            if alias == name {
                return Some((import.object.clone(), this.clone()));
            }
            continue;
        }
        if let Some(found) = import.object.lookup_member_with_owner(name, context, true) {
            return Some(found);
        }
    }
    None
}

/// Lookup in the JavaScript import scope: `import "file.js" as Name`.
pub(crate) fn lookup_in_js_import_scope(
    this: &ValueRef,
    imports: &ImportList,
    name: &str,
) -> Option<(ValueRef, ValueRef)> {
    imports
        .iter()
        .rev()
        .filter(|import| import.info.import_type() == ImportType::File)
        .find(|import| import.info.alias() == Some(name))
        .map(|import| (import.object.clone(), this.clone()))
}

pub(crate) fn process_type_scope(imports: &ImportList, processor: &mut dyn MemberProcessor) {
    for import in imports.iter().rev() {
        if import.info.import_type() == ImportType::File {
            continue;
        }
        match import.info.alias() {
            Some(alias) => {
                if !processor.process_property(alias, &import.object, PropertyInfo::READABLE) {
                    return;
                }
            }
            None => {
                if let Some(object) = import.object.as_object() {
                    object.process_members(processor);
                }
            }
        }
    }
}

pub(crate) fn process_js_import_scope(imports: &ImportList, processor: &mut dyn MemberProcessor) {
    for import in imports.iter().rev() {
        if import.info.import_type() != ImportType::File {
            continue;
        }
        if let Some(alias) = import.info.alias() {
            if !processor.process_property(alias, &import.object, PropertyInfo::READABLE) {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member_processor::CollectMembers;

    fn module(owner: &ValueOwner, uri: &str, alias: Option<&str>, types: &[(&str, &ValueRef)]) -> Import {
        let object = owner.new_object(None);
        for (name, value) in types {
            object.as_object().unwrap().set_member(*name, value);
        }
        Import::new(object, ImportInfo::module_import(uri, ComponentVersion::new(2, 0), alias, None))
    }

    #[test]
    fn test_path_import_types() {
        let js = ImportInfo::path_import("/proj", "logic.js", ComponentVersion::default(), Some("L"), None);
        assert_eq!(js.import_type(), ImportType::File);
        assert_eq!(js.path(), "/proj/logic.js");
        let dir = ImportInfo::path_import("/proj", "controls", ComponentVersion::default(), None, None);
        assert_eq!(dir.import_type(), ImportType::Directory);
        let empty = ImportInfo::path_import("/proj", "", ComponentVersion::default(), None, None);
        assert_eq!(empty.import_type(), ImportType::UnknownFile);
        assert!(!ImportInfo::default().is_valid());
    }

    #[test]
    fn test_later_imports_shadow_earlier_ones() {
        let owner = ValueOwner::new();
        let first = owner.new_object(None);
        let second = owner.new_object(None);
        let imports = Imports::new(
            &owner,
            vec![
                module(&owner, "A", None, &[("Button", &first)]),
                module(&owner, "B", None, &[("Button", &second)]),
            ],
        );
        let found = imports.type_scope().lookup_member("Button", None).unwrap();
        assert!(Arc::ptr_eq(&found, &second));
        assert_eq!(imports.info("Button.size", None).unwrap().name(), "B");
    }

    #[test]
    fn test_aliases() {
        let owner = ValueOwner::new();
        let button = owner.new_object(None);
        let script = owner.new_object(None);
        let imports = Imports::new(
            &owner,
            vec![
                module(&owner, "QtQuick.Controls", Some("C"), &[("Button", &button)]),
                Import::new(
                    script.clone(),
                    ImportInfo::path_import("/proj", "logic.js", ComponentVersion::default(), Some("Logic"), None),
                ),
            ],
        );
        let type_scope = imports.type_scope();
        assert!(type_scope.lookup_member("Button", None).is_none());
        let (alias, found_in) = type_scope.lookup_member_with_owner("C", None, true).unwrap();
        assert!(Arc::ptr_eq(&found_in, type_scope));
        assert!(Arc::ptr_eq(&alias.lookup_member("Button", None).unwrap(), &button));
        assert!(type_scope.lookup_member("Logic", None).is_none());

        let js_scope = imports.js_import_scope();
        assert!(Arc::ptr_eq(&js_scope.lookup_member("Logic", None).unwrap(), &script));
        assert!(js_scope.lookup_member("C", None).is_none());

        let mut collect = CollectMembers::new();
        type_scope.as_object().unwrap().process_members(&mut collect);
        let names: Vec<&str> = collect.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["C"]);
    }

    #[test]
    fn test_failed_imports_are_reported() {
        let owner = ValueOwner::new();
        let mut missing = module(&owner, "Missing", None, &[]);
        missing.valid = false;
        let imports = Imports::new(&owner, vec![missing]);
        assert!(imports.import_failed());
        assert_eq!(imports.len(), 1);
    }
}
