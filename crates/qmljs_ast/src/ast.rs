//! The node arena of one document.

use crate::node::*;
use crate::types::NodeId;
use qmljs_core::text::{TextPos, TextRange};

/// All nodes of one document plus parent links.
///
/// Nodes are immutable once the tree is finished. Child lists are stored
/// in the node payloads; parents are computed when the tree is built.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeId>>,
    root: Option<NodeId>,
}

impl Ast {
    /// Build a tree from nodes whose child ids all point into `nodes`.
    pub fn from_nodes(nodes: Vec<Node>, root: Option<NodeId>) -> Self {
        let mut parents = vec![None; nodes.len()];
        for (index, node) in nodes.iter().enumerate() {
            for child in node.kind.children() {
                if let Some(slot) = parents.get_mut(child.index()) {
                    *slot = Some(NodeId(index as u32));
                }
            }
        }
        Self {
            nodes,
            parents,
            root,
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|node| &node.kind)
    }

    pub fn range(&self, id: NodeId) -> TextRange {
        self.get(id).map(|node| node.range).unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(id.index()).copied().flatten()
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).map(NodeKind::children).unwrap_or_default()
    }

    /// Parents of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// Nodes from the root down to and including `id`.
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        if self.get(id).is_none() {
            return Vec::new();
        }
        let mut path: Vec<NodeId> = self.ancestors(id).collect();
        path.reverse();
        path.push(id);
        path
    }

    /// The deepest node whose range contains `offset`.
    pub fn innermost_at(&self, offset: TextPos) -> Option<NodeId> {
        let mut current = self.root?;
        if !self.range(current).contains_offset(offset) {
            return None;
        }
        'descend: loop {
            for child in self.children(current) {
                if self.range(child).contains_offset(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Segments of a `UiQualifiedId` node.
    pub fn qualified_id(&self, id: Option<NodeId>) -> Option<&UiQualifiedId> {
        self.kind(id?)?.as_qualified_id()
    }

    /// The dotted text of a `UiQualifiedId` node.
    pub fn qualified_name(&self, id: Option<NodeId>) -> Option<String> {
        self.qualified_id(id).map(UiQualifiedId::to_dotted)
    }

    /// The `UiObjectInitializer` members of an object definition or binding.
    pub fn object_members(&self, id: NodeId) -> &[NodeId] {
        let initializer = self
            .kind(id)
            .and_then(NodeKind::object_parts)
            .and_then(|(_, initializer)| initializer);
        match initializer.and_then(|init| self.kind(init)) {
            Some(NodeKind::UiObjectInitializer(init)) => &init.members,
            _ => &[],
        }
    }

    /// Iterate over all node ids in allocation order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AstBuilder;

    fn sample() -> (Ast, NodeId, NodeId, NodeId) {
        let mut b = AstBuilder::new();
        let import = b.import_module("QtQuick", Some("2.0"), None);
        let width = b.number(100.0);
        let width_binding = b.script_expression("width", width);
        let inner = b.object_definition("Rectangle", vec![]);
        let root = b.object_definition("Item", vec![width_binding, inner]);
        let ast = b.finish_qml(vec![import], root);
        (ast, root, width, inner)
    }

    #[test]
    fn test_parents_and_paths() {
        let (ast, root, width, _) = sample();
        let path = ast.path_to(width);
        assert_eq!(path.first().copied(), ast.root());
        assert_eq!(path.last().copied(), Some(width));
        assert!(path.contains(&root));
        assert_eq!(ast.parent(ast.root().unwrap()), None);
    }

    #[test]
    fn test_parent_ranges_enclose_children() {
        let (ast, _, _, _) = sample();
        for id in ast.node_ids() {
            for child in ast.children(id) {
                assert!(
                    ast.range(id).encloses(&ast.range(child)),
                    "{} does not enclose {}",
                    id,
                    child
                );
            }
        }
    }

    #[test]
    fn test_innermost_at() {
        let (ast, _, width, inner) = sample();
        let offset = ast.range(width).pos;
        assert_eq!(ast.innermost_at(offset), Some(width));
        let inner_type = ast.children(inner)[0];
        assert_eq!(ast.innermost_at(ast.range(inner).pos), Some(inner_type));
        assert_eq!(ast.innermost_at(100_000), None);
    }

    #[test]
    fn test_object_members() {
        let (ast, root, _, inner) = sample();
        assert_eq!(ast.object_members(root).len(), 2);
        assert!(ast.object_members(inner).is_empty());
        assert_eq!(
            ast.qualified_name(ast.kind(root).and_then(NodeKind::object_parts).and_then(|p| p.0)),
            Some("Item".to_string())
        );
    }
}
