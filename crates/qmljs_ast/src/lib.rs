//! qmljs_ast: The tree model of QML documents and embedded JavaScript.
//!
//! A document is an [`Ast`]: a flat arena of [`Node`]s addressed by
//! [`NodeId`], with parent links computed once when the tree is finished.
//! Trees are walked through the [`Visitor`] contract or through the direct
//! accessors on [`Ast`].

pub mod ast;
pub mod builder;
pub mod node;
pub mod types;
pub mod visitor;

pub use ast::Ast;
pub use builder::AstBuilder;
pub use node::*;
pub use types::*;
pub use visitor::{Visitor, MAX_RECURSION_DEPTH};
