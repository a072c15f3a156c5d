//! qmljs_interpret: Static understanding of QML documents and their
//! JavaScript.
//!
//! Analysis runs in three steps:
//! 1. Each [`Document`] is bound on creation: its objects, ids, functions and
//!    imports become values owned by the document.
//! 2. [`Link`] resolves the imports of every document in a [`Snapshot`] and
//!    produces an immutable, shareable [`Context`].
//! 3. A [`ScopeChain`], positioned with [`ScopeBuilder`], answers what a name
//!    means at a place in a document; [`Evaluate`] computes the abstract
//!    value of an expression there.
//!
//! Values form a lattice of shapes rather than concrete data: `number`,
//! `string`, objects with known members, functions with known return
//! values, and `unknown` for anything that cannot be determined.

pub mod ast_values;
pub mod bind;
pub mod builtins;
pub mod context;
pub mod cpp_types;
pub mod document;
pub mod evaluate;
pub mod function_value;
pub mod imports;
pub mod link;
pub mod member_processor;
pub mod object_value;
pub mod prototype_iterator;
pub mod reference;
pub mod reference_context;
pub mod scope_ast_path;
pub mod scope_builder;
pub mod scope_chain;
pub mod value;
pub mod value_owner;

pub use ast_values::{AstFunction, AstObjectValue, AstSignal};
pub use bind::Bind;
pub use context::{Context, ContextPtr, ViewerContext};
pub use cpp_types::{CppComponentValue, CppQmlTypes, QmlEnumValue, DEFAULT_PACKAGE};
pub use document::{Document, LibraryInfo, QmlDirComponent, Snapshot, TypeInfoStatus};
pub use evaluate::Evaluate;
pub use function_value::{FunctionKind, FunctionValue, NativeFunction};
pub use imports::{Import, ImportInfo, ImportType, Imports};
pub use link::{Link, LinkDiagnostics};
pub use member_processor::{CollectMembers, MemberKind, MemberProcessor};
pub use object_value::{ObjectKind, ObjectValue, PropertyInfo};
pub use prototype_iterator::{PrototypeError, PrototypeIterator};
pub use reference::Reference;
pub use reference_context::ReferenceContext;
pub use scope_ast_path::ScopeAstPath;
pub use scope_builder::ScopeBuilder;
pub use scope_chain::ScopeChain;
pub use value::{NumberKind, StringKind, Value, ValueRef, ValueVisitor, WeakValue};
pub use value_owner::{shared, SharedValueOwner, ValueOwner};
