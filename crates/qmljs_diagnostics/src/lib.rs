//! qmljs_diagnostics: Messages produced while binding and linking documents.
//!
//! Analysis never aborts on bad input. Problems found while binding a
//! document (malformed imports) or linking a snapshot (missing modules,
//! unreadable type information) are collected as [`Diagnostic`]s per
//! document, and consumers decide how to surface them.

use qmljs_core::text::{LineMap, TextSpan};
use std::fmt;

/// Diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticCategory {
    Hint,
    Warning,
    Error,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Hint => write!(f, "hint"),
            DiagnosticCategory::Warning => write!(f, "warning"),
            DiagnosticCategory::Error => write!(f, "error"),
        }
    }
}

/// A message template with a code and category.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    /// May contain `{0}`, `{1}`, ... placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub file: Option<String>,
    pub span: Option<TextSpan>,
    pub message_text: String,
    pub code: u32,
    pub category: DiagnosticCategory,
    pub related_information: Vec<Diagnostic>,
}

impl Diagnostic {
    /// A diagnostic that is not attached to any source position.
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            file: None,
            span: None,
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
            related_information: Vec::new(),
        }
    }

    pub fn with_location(
        file: impl Into<String>,
        span: TextSpan,
        message: &DiagnosticMessage,
        args: &[&str],
    ) -> Self {
        Self {
            file: Some(file.into()),
            span: Some(span),
            ..Self::new(message, args)
        }
    }

    /// Attach a document without a span, e.g. for link problems of a whole file.
    pub fn in_file(file: impl Into<String>, message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            file: Some(file.into()),
            ..Self::new(message, args)
        }
    }

    pub fn with_related(mut self, related: Diagnostic) -> Self {
        self.related_information.push(related);
        self
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }

    pub fn is_warning(&self) -> bool {
        self.category == DiagnosticCategory::Warning
    }

    /// Render as `file:line:column: category QMLnnn: text`, resolving the
    /// span through the document's line map.
    pub fn render(&self, line_map: Option<&LineMap>) -> String {
        let mut out = String::new();
        if let Some(ref file) = self.file {
            out.push_str(file);
            match (self.span, line_map) {
                (Some(span), Some(map)) => {
                    out.push_str(&format!(":{}", map.location_of(span.start)));
                }
                (Some(span), None) => out.push_str(&format!("({})", span.start)),
                _ => {}
            }
            out.push_str(": ");
        }
        out.push_str(&format!(
            "{} QML{}: {}",
            self.category, self.code, self.message_text
        ));
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}

/// Replace `{0}`, `{1}`, ... with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// Diagnostics accumulated for one document.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn extend_from_slice(&mut self, diagnostics: &[Diagnostic]) {
        self.diagnostics.extend_from_slice(diagnostics);
    }

    /// Whether a diagnostic with `code` was reported.
    pub fn contains_code(&self, code: u32) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    /// Sort by file, then position.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            a.file.cmp(&b.file).then_with(|| {
                let a_pos = a.span.map(|s| s.start).unwrap_or(0);
                let b_pos = b.span.map(|s| s.start).unwrap_or(0);
                a_pos.cmp(&b_pos)
            })
        });
    }
}

impl<'a> IntoIterator for &'a DiagnosticCollection {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Error, message: $msg }
        };
        ($code:expr, Warning, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Warning, message: $msg }
        };
        ($code:expr, Hint, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Hint, message: $msg }
        };
    }

    // ========================================================================
    // Binding (100-199)
    // ========================================================================
    pub const PACKAGE_IMPORT_REQUIRES_A_VERSION_NUMBER: DiagnosticMessage = diag!(101, Error, "Package import requires a version number.");
    pub const EXPECTED_A_VERSION_NUMBER_OF_THE_FORM_MAJOR_MINOR: DiagnosticMessage = diag!(102, Error, "Expected a version number of the form 'major.minor', found '{0}'.");
    pub const IMPORT_HAS_NO_URI_OR_PATH: DiagnosticMessage = diag!(103, Error, "Import names neither a module nor a file.");
    pub const DUPLICATE_ID_0: DiagnosticMessage = diag!(104, Warning, "Duplicate id '{0}'.");

    // ========================================================================
    // Linking (200-299)
    // ========================================================================
    pub const QML_MODULE_NOT_FOUND_0: DiagnosticMessage = diag!(201, Error, "QML module not found ({0}).");
    pub const FILE_OR_DIRECTORY_NOT_FOUND_0: DiagnosticMessage = diag!(202, Error, "File or directory not found ({0}).");
    pub const QML_MODULE_CONTAINS_CPP_PLUGINS_WITHOUT_TYPE_INFORMATION_0: DiagnosticMessage = diag!(203, Warning, "QML module contains C++ plugins, but no type information is available ({0}).");
    pub const FAILED_TO_READ_TYPE_INFORMATION_OF_0_1: DiagnosticMessage = diag!(204, Error, "Failed to read type information of QML module {0}: {1}");
    pub const MODULE_0_HAS_NO_EXPORTS_AT_VERSION_1: DiagnosticMessage = diag!(205, Warning, "QML module {0} exports nothing at version {1}.");

    // ========================================================================
    // Prototype chains (300-399)
    // ========================================================================
    pub const COULD_NOT_RESOLVE_THE_PROTOTYPE_0_OF_1: DiagnosticMessage = diag!(301, Warning, "Could not resolve the prototype '{0}' of '{1}'.");
    pub const PROTOTYPE_CYCLE_THE_LAST_NON_REPEATED_COMPONENT_IS_0: DiagnosticMessage = diag!(302, Warning, "Prototype cycle, the last non-repeated component is '{0}'.");
    pub const UNKNOWN_COMPONENT_0: DiagnosticMessage = diag!(303, Error, "Unknown component '{0}'.");
}
