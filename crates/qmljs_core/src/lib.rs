//! qmljs_core: Foundation types shared by the QML/JS analysis crates.
//!
//! Text positions for AST nodes and diagnostics, and versions of QML
//! modules and their exported components.

pub mod text;
pub mod version;

pub use text::{LineMap, SourceLocation, TextPos, TextRange, TextSpan};
pub use version::{ComponentVersion, VersionParseError};
