//! qmljs_options: Project configuration (`qmljs.json`).
//!
//! The configuration tells the linker where to find QML modules, which
//! type-library descriptors describe the builtin C++ types, and which C++
//! context properties are visible to every document.
//!
//! ```json
//! {
//!   "importPaths": ["/opt/qt/qml", "imports"],
//!   "typeDescriptions": ["types/builtins.json"],
//!   "language": "qml",
//!   "selectors": ["android"],
//!   "contextProperties": { "backend": "BackendController" }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The language documents default to when their extension says nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Qml,
    Javascript,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub import_paths: Option<Vec<String>>,
    pub type_descriptions: Option<Vec<String>>,
    pub language: Option<Language>,
    pub selectors: Option<Vec<String>>,
    /// Context property name -> C++ class name.
    pub context_properties: Option<IndexMap<String, String>>,
}

impl ProjectConfig {
    /// Resolve relative `importPaths` and `typeDescriptions` against the
    /// directory containing the configuration file.
    pub fn resolve_relative_to(mut self, base_dir: &str) -> Self {
        let resolve = |paths: Option<Vec<String>>| {
            paths.map(|paths| {
                paths
                    .into_iter()
                    .map(|p| qmljs_path::combine_paths(base_dir, &p))
                    .collect()
            })
        };
        self.import_paths = resolve(self.import_paths);
        self.type_descriptions = resolve(self.type_descriptions);
        self
    }

    pub fn import_paths(&self) -> &[String] {
        self.import_paths.as_deref().unwrap_or_default()
    }

    pub fn type_descriptions(&self) -> &[String] {
        self.type_descriptions.as_deref().unwrap_or_default()
    }

    pub fn language(&self) -> Language {
        self.language.unwrap_or_default()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid project configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a configuration document.
pub fn parse_project_config(content: &str) -> Result<ProjectConfig, serde_json::Error> {
    serde_json::from_str(content)
}

/// Read a configuration file; relative paths in it are resolved against
/// the file's directory.
pub fn parse_project_config_file(path: &str) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    let config = parse_project_config(&content)?;
    Ok(config.resolve_relative_to(&qmljs_path::directory_of(path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = parse_project_config(
            r#"{
                "importPaths": ["/opt/qt/qml", "imports"],
                "typeDescriptions": ["types/builtins.json"],
                "language": "javascript",
                "selectors": ["android"],
                "contextProperties": { "backend": "BackendController", "settings": "QSettings" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.import_paths().len(), 2);
        assert_eq!(config.language(), Language::Javascript);
        let properties = config.context_properties.unwrap();
        assert_eq!(
            properties.keys().collect::<Vec<_>>(),
            vec!["backend", "settings"]
        );
    }

    #[test]
    fn test_defaults() {
        let config = parse_project_config("{}").unwrap();
        assert!(config.import_paths().is_empty());
        assert!(config.type_descriptions().is_empty());
        assert_eq!(config.language(), Language::Qml);
    }

    #[test]
    fn test_resolve_relative_paths() {
        let config = parse_project_config(
            r#"{ "importPaths": ["/abs", "rel/imports"], "typeDescriptions": ["../types.json"] }"#,
        )
        .unwrap()
        .resolve_relative_to("/proj/app");
        assert_eq!(config.import_paths(), &["/abs".to_string(), "/proj/app/rel/imports".to_string()]);
        assert_eq!(config.type_descriptions(), &["/proj/types.json".to_string()]);
    }

    #[test]
    fn test_invalid_language_is_rejected() {
        assert!(parse_project_config(r#"{ "language": "python" }"#).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = parse_project_config_file("/nonexistent/qmljs.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
