//! Visitor contract for walking an [`Ast`].
//!
//! [`Ast::accept`] calls [`Visitor::visit`] for a node, descends into its
//! children when `visit` returns `true`, then calls [`Visitor::end_visit`].
//! A visitor may also call `accept` on chosen children from inside `visit`
//! and return `false` to take over the traversal of a subtree.
//!
//! Depth is counted on the visitor itself, so nested `accept` calls made
//! from inside `visit` share one budget. When the budget is exhausted the
//! subtree is skipped and [`Visitor::throw_recursion_depth_error`] is
//! called instead of overflowing the stack.

use crate::ast::Ast;
use crate::types::NodeId;

/// Maximum nesting of `accept` calls before a subtree is skipped.
pub const MAX_RECURSION_DEPTH: u32 = 512;

pub trait Visitor {
    /// Storage for the current nesting depth.
    fn recursion_depth(&mut self) -> &mut u32;

    /// Called before the children of `node`. Return `false` to skip them.
    fn visit(&mut self, _ast: &Ast, _node: NodeId) -> bool {
        true
    }

    /// Called after the children of `node` (even if they were skipped).
    fn end_visit(&mut self, _ast: &Ast, _node: NodeId) {}

    /// Called when a subtree is skipped because it nests too deeply.
    fn throw_recursion_depth_error(&mut self) {}
}

impl Ast {
    /// Walk the subtree at `node` with `visitor`. Absent nodes are ignored.
    pub fn accept(&self, node: Option<NodeId>, visitor: &mut dyn Visitor) {
        let Some(node) = node else { return };
        if self.get(node).is_none() {
            return;
        }

        if *visitor.recursion_depth() >= MAX_RECURSION_DEPTH {
            visitor.throw_recursion_depth_error();
            return;
        }
        *visitor.recursion_depth() += 1;

        if visitor.visit(self, node) {
            for child in self.children(node) {
                self.accept(Some(child), visitor);
            }
        }
        visitor.end_visit(self, node);

        *visitor.recursion_depth() -= 1;
    }

    /// Walk every child of `node` with `visitor`.
    pub fn accept_children(&self, node: NodeId, visitor: &mut dyn Visitor) {
        for child in self.children(node) {
            self.accept(Some(child), visitor);
        }
    }
}
