//! JSON type-library descriptors.
//!
//! A descriptor lists the components of a QML module the way `qmltypes`
//! files do:
//!
//! ```json
//! {
//!   "components": [
//!     {
//!       "name": "QQuickItem",
//!       "prototype": "QObject",
//!       "exports": ["QtQuick/Item 2.0"],
//!       "defaultProperty": "data",
//!       "properties": [{ "name": "width", "type": "double" }],
//!       "signals": [{ "name": "focusChanged", "parameters": [{ "name": "focus", "type": "bool" }] }],
//!       "methods": [{ "name": "forceActiveFocus" }],
//!       "enums": [{ "name": "TransformOrigin", "values": ["TopLeft", "Top"] }]
//!     }
//!   ]
//! }
//! ```

use crate::fake_meta_object::*;
use qmljs_core::version::{ComponentVersion, VersionParseError};
use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetaTypesError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid type description: {0}")]
    Json(#[from] serde_json::Error),
    #[error("component #{index} has an empty name")]
    EmptyComponentName { index: usize },
    #[error("duplicate component '{0}'")]
    DuplicateComponent(String),
    #[error("component '{component}' has a malformed export '{export}', expected 'Module/Type major.minor'")]
    MalformedExport { component: String, export: String },
    #[error("component '{component}' has an invalid export version: {source}")]
    ExportVersion {
        component: String,
        #[source]
        source: VersionParseError,
    },
    #[error("component '{component}' lists {revisions} export revisions for {exports} exports")]
    RevisionCountMismatch {
        component: String,
        revisions: usize,
        exports: usize,
    },
}

// ============================================================================
// Raw serde model
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescriptionFile {
    #[serde(default)]
    components: Vec<ComponentDescription>,
    #[serde(default)]
    dependencies: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComponentDescription {
    name: String,
    prototype: Option<String>,
    attached_type: Option<String>,
    default_property: Option<String>,
    #[serde(default)]
    exports: Vec<String>,
    #[serde(default)]
    export_meta_object_revisions: Vec<i32>,
    #[serde(default)]
    is_singleton: bool,
    #[serde(default = "default_true")]
    is_creatable: bool,
    #[serde(default)]
    is_composite: bool,
    #[serde(default)]
    properties: Vec<PropertyDescription>,
    #[serde(default)]
    signals: Vec<MethodDescription>,
    #[serde(default)]
    methods: Vec<MethodDescription>,
    #[serde(default)]
    enums: Vec<EnumDescription>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyDescription {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    is_pointer: bool,
    #[serde(default)]
    is_list: bool,
    #[serde(default)]
    is_readonly: bool,
    #[serde(default)]
    revision: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MethodDescription {
    name: String,
    #[serde(rename = "type")]
    return_type: Option<String>,
    #[serde(default)]
    parameters: Vec<ParameterDescription>,
    #[serde(default)]
    revision: i32,
    #[serde(default)]
    is_private: bool,
}

#[derive(Debug, Deserialize)]
struct ParameterDescription {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
}

#[derive(Debug, Deserialize)]
struct EnumDescription {
    name: String,
    #[serde(default)]
    values: Vec<String>,
}

// ============================================================================
// Conversion
// ============================================================================

/// A loaded descriptor.
#[derive(Debug, Clone, Default)]
pub struct TypeDescription {
    pub objects: Vec<Arc<FakeMetaObject>>,
    /// Modules this library's types depend on, e.g. `QtQuick 2.0`.
    pub dependencies: Vec<String>,
}

/// Split `Module/Type 2.0` into its parts.
fn parse_export(component: &str, text: &str) -> Result<(String, String, ComponentVersion), MetaTypesError> {
    let malformed = || MetaTypesError::MalformedExport {
        component: component.to_string(),
        export: text.to_string(),
    };
    let (name, version) = text.trim().rsplit_once(' ').ok_or_else(malformed)?;
    let (package, type_name) = name.rsplit_once('/').ok_or_else(malformed)?;
    if package.is_empty() || type_name.is_empty() {
        return Err(malformed());
    }
    let version = version
        .parse::<ComponentVersion>()
        .map_err(|source| MetaTypesError::ExportVersion {
            component: component.to_string(),
            source,
        })?;
    Ok((package.to_string(), type_name.to_string(), version))
}

fn convert_method(description: MethodDescription, method_type: MethodType) -> FakeMetaMethod {
    let mut method = FakeMetaMethod::new(description.name, method_type)
        .with_revision(description.revision)
        .with_access(if description.is_private {
            Access::Private
        } else {
            Access::Public
        });
    method.return_type = description.return_type;
    for parameter in description.parameters {
        method = method.with_parameter(parameter.name, parameter.type_name);
    }
    method
}

fn convert_component(description: ComponentDescription) -> Result<FakeMetaObject, MetaTypesError> {
    let mut fmo = FakeMetaObject::new(description.name);
    fmo.superclass_name = description.prototype.filter(|p| !p.is_empty());
    fmo.attached_type_name = description.attached_type.filter(|a| !a.is_empty());
    fmo.default_property_name = description.default_property.filter(|d| !d.is_empty());
    fmo.is_singleton = description.is_singleton;
    fmo.is_creatable = description.is_creatable;
    fmo.is_composite = description.is_composite;

    let revisions = &description.export_meta_object_revisions;
    if !revisions.is_empty() && revisions.len() != description.exports.len() {
        return Err(MetaTypesError::RevisionCountMismatch {
            component: fmo.class_name.clone(),
            revisions: revisions.len(),
            exports: description.exports.len(),
        });
    }
    for (index, export) in description.exports.iter().enumerate() {
        let (package, type_name, version) = parse_export(&fmo.class_name, export)?;
        let revision = revisions.get(index).copied().unwrap_or(0);
        fmo.add_export(&package, &type_name, version, revision);
    }
    fmo.ensure_cpp_export();

    for property in description.properties {
        fmo.properties.push(FakeMetaProperty {
            name: property.name,
            type_name: property.type_name,
            is_list: property.is_list,
            is_writable: !property.is_readonly,
            is_pointer: property.is_pointer,
            revision: property.revision,
        });
    }
    for signal in description.signals {
        fmo.methods.push(convert_method(signal, MethodType::Signal));
    }
    for method in description.methods {
        fmo.methods.push(convert_method(method, MethodType::Method));
    }
    for meta_enum in description.enums {
        fmo.enums.push(FakeMetaEnum {
            name: meta_enum.name,
            keys: meta_enum.values,
        });
    }
    Ok(fmo)
}

/// Parse a descriptor document.
pub fn parse_type_description(content: &str) -> Result<TypeDescription, MetaTypesError> {
    let file: DescriptionFile = serde_json::from_str(content)?;
    let mut seen = FxHashSet::default();
    let mut objects = Vec::with_capacity(file.components.len());
    for (index, component) in file.components.into_iter().enumerate() {
        if component.name.is_empty() {
            return Err(MetaTypesError::EmptyComponentName { index });
        }
        if !seen.insert(component.name.clone()) {
            return Err(MetaTypesError::DuplicateComponent(component.name));
        }
        objects.push(Arc::new(convert_component(component)?));
    }
    tracing::debug!(components = objects.len(), "parsed type description");
    Ok(TypeDescription {
        objects,
        dependencies: file.dependencies,
    })
}

/// Read and parse a descriptor file.
pub fn load_type_description_file(path: impl AsRef<Path>) -> Result<TypeDescription, MetaTypesError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| MetaTypesError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_type_description(&content)
}

/// Load several descriptor files into one object list. Components that
/// appear in more than one file are kept once (first file wins).
pub fn load_type_description_files<P: AsRef<Path>>(
    paths: &[P],
) -> Result<TypeDescription, MetaTypesError> {
    let mut merged = TypeDescription::default();
    let mut seen = FxHashSet::default();
    for path in paths {
        let description = load_type_description_file(path)?;
        for object in description.objects {
            if seen.insert(object.class_name.clone()) {
                merged.objects.push(object);
            } else {
                tracing::debug!(class = %object.class_name, "skipping duplicate component");
            }
        }
        merged.dependencies.extend(description.dependencies);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_VIEW: &str = r#"{
        "components": [
            {
                "name": "QQuickListView",
                "prototype": "QQuickItem",
                "exports": ["QtQuick/ListView 2.0", "QtQuick/ListView 2.1"],
                "exportMetaObjectRevisions": [0, 1],
                "properties": [
                    { "name": "count", "type": "int", "isReadonly": true },
                    { "name": "delegate", "type": "QQmlComponent", "isPointer": true },
                    { "name": "footerPositioning", "type": "FooterPositioning", "revision": 1 }
                ],
                "signals": [ { "name": "add" } ],
                "methods": [
                    { "name": "positionViewAtIndex", "parameters": [
                        { "name": "index", "type": "int" }, { "name": "mode", "type": "int" } ] },
                    { "name": "indexAt", "type": "int", "parameters": [
                        { "name": "x", "type": "double" }, { "name": "y", "type": "double" } ] }
                ],
                "enums": [ { "name": "FooterPositioning", "values": ["InlineFooter", "OverlayFooter"] } ]
            }
        ],
        "dependencies": ["QtQml 2.0"]
    }"#;

    #[test]
    fn test_parse_component() {
        let description = parse_type_description(LIST_VIEW).unwrap();
        assert_eq!(description.dependencies, vec!["QtQml 2.0".to_string()]);
        let fmo = &description.objects[0];
        assert_eq!(fmo.class_name, "QQuickListView");
        assert_eq!(fmo.superclass_name.as_deref(), Some("QQuickItem"));
        // two declared exports plus the C++ name
        assert_eq!(fmo.exports.len(), 3);
        assert_eq!(fmo.exports[1].version, ComponentVersion::new(2, 1));
        assert_eq!(fmo.exports[1].meta_object_revision, 1);
        assert!(fmo.export_in_package(CPP_PACKAGE).is_some());

        assert!(!fmo.property("count").unwrap().is_writable);
        assert!(fmo.property("delegate").unwrap().is_pointer);
        assert_eq!(fmo.signals().count(), 1);
        let index_at = fmo.methods_named("indexAt").next().unwrap();
        assert_eq!(index_at.return_type.as_deref(), Some("int"));
        assert_eq!(index_at.parameter_names, vec!["x", "y"]);
        assert_eq!(fmo.enumerator("FooterPositioning").unwrap().keys.len(), 2);
    }

    #[test]
    fn test_malformed_export() {
        let err = parse_type_description(
            r#"{ "components": [ { "name": "A", "exports": ["NoVersion"] } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, MetaTypesError::MalformedExport { .. }));

        let err = parse_type_description(
            r#"{ "components": [ { "name": "A", "exports": ["Mod/A two"] } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, MetaTypesError::ExportVersion { .. }));
    }

    #[test]
    fn test_duplicate_and_empty_components() {
        let err = parse_type_description(
            r#"{ "components": [ { "name": "A" }, { "name": "A" } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, MetaTypesError::DuplicateComponent(ref name) if name == "A"));

        let err = parse_type_description(r#"{ "components": [ { "name": "" } ] }"#).unwrap_err();
        assert!(matches!(err, MetaTypesError::EmptyComponentName { index: 0 }));
    }

    #[test]
    fn test_revision_count_mismatch() {
        let err = parse_type_description(
            r#"{ "components": [ { "name": "A", "exports": ["M/A 1.0"], "exportMetaObjectRevisions": [0, 1] } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, MetaTypesError::RevisionCountMismatch { revisions: 2, exports: 1, .. }));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_type_description("{ not json"),
            Err(MetaTypesError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_type_description_file("/nonexistent/dir/types.json").unwrap_err();
        assert!(matches!(err, MetaTypesError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/dir/types.json"));
    }
}
