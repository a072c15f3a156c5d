//! The nodes that open a scope around a source position.

use qmljs_ast::{Ast, NodeId, NodeKind};
use qmljs_core::text::TextPos;

use crate::document::Document;

/// Finds the scope-relevant ancestors of an offset or a node: object
/// definitions and bindings, script bindings, property declarations and
/// functions. Feed the result to
/// [`ScopeBuilder::push_path`](crate::scope_builder::ScopeBuilder::push_path).
pub struct ScopeAstPath<'a> {
    ast: &'a Ast,
}

impl<'a> ScopeAstPath<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self { ast: doc.ast() }
    }

    /// Scope nodes around `offset`, outermost first.
    ///
    /// An object only counts when the offset is inside its braces, a binding
    /// only when the offset is inside its right-hand side.
    pub fn path_at(&self, offset: TextPos) -> Vec<NodeId> {
        let Some(innermost) = self.ast.innermost_at(offset) else {
            return Vec::new();
        };
        self.ast
            .path_to(innermost)
            .into_iter()
            .filter(|node| self.opens_scope_at(*node, Some(offset)))
            .collect()
    }

    /// Scope nodes enclosing `node`, outermost first. `node` itself is
    /// included when it opens a scope.
    pub fn path_to(&self, node: NodeId) -> Vec<NodeId> {
        self.ast
            .path_to(node)
            .into_iter()
            .filter(|id| self.opens_scope_at(*id, None))
            .collect()
    }

    fn opens_scope_at(&self, node: NodeId, offset: Option<TextPos>) -> bool {
        let inside = |part: Option<NodeId>| match (part, offset) {
            (Some(part), Some(offset)) => self.ast.range(part).contains_offset(offset),
            (Some(_), None) => true,
            (None, _) => false,
        };
        match self.ast.kind(node) {
            Some(NodeKind::UiObjectDefinition(_)) | Some(NodeKind::UiObjectBinding(_)) => {
                let initializer = self
                    .ast
                    .kind(node)
                    .and_then(NodeKind::object_parts)
                    .and_then(|(_, initializer)| initializer);
                inside(initializer)
            }
            Some(NodeKind::UiScriptBinding(binding)) => inside(binding.statement),
            Some(NodeKind::UiPublicMember(member)) => inside(member.statement) || inside(member.binding),
            Some(NodeKind::FunctionDeclaration(_)) | Some(NodeKind::FunctionExpression(_)) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmljs_ast::{AstBuilder, Dialect};

    #[test]
    fn test_path_at_offset() {
        let mut b = AstBuilder::new();
        let value = b.path("parent.width");
        let width = b.script_expression("width", value);
        let inner = b.object_definition("Rectangle", vec![width]);
        let root = b.object_definition("Item", vec![inner]);
        let doc = Document::new("/proj/Main.qml", Dialect::Qml, b.finish_qml(vec![], root));

        let offset = doc.ast().range(value).pos;
        let path = ScopeAstPath::new(&doc).path_at(offset);
        assert_eq!(path, vec![root, inner, width]);
    }

    #[test]
    fn test_type_name_is_outside_the_object_scope() {
        let mut b = AstBuilder::new();
        let inner = b.object_definition("Rectangle", vec![]);
        let root = b.object_definition("Item", vec![inner]);
        let doc = Document::new("/proj/Main.qml", Dialect::Qml, b.finish_qml(vec![], root));

        let type_name = match doc.ast().kind(inner) {
            Some(NodeKind::UiObjectDefinition(d)) => d.qualified_type_name_id.unwrap(),
            _ => unreachable!(),
        };
        let path = ScopeAstPath::new(&doc).path_at(doc.ast().range(type_name).pos);
        assert_eq!(path, vec![root]);
    }

    #[test]
    fn test_path_to_function() {
        let mut b = AstBuilder::new();
        let x = b.identifier("x");
        let ret = b.return_statement(Some(x));
        let function = b.function_declaration("f", &["x"], vec![ret]);
        let doc = Document::new("/proj/f.js", Dialect::JavaScript, b.finish_program(vec![function]));

        assert_eq!(ScopeAstPath::new(&doc).path_to(x), vec![function]);
        assert!(ScopeAstPath::new(&doc).path_at(10_000).is_empty());
    }
}
