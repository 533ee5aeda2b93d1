//! Arena storage for the node forest.
//!
//! Nodes are appended to a `Vec` and addressed by [`NodeId`]. Handles stay
//! valid for the life of the forest: removal is expressed by detaching a
//! subtree from its parent, not by freeing slots. Rebuilding a session
//! starts from a fresh arena.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::StructuralError;
use crate::forest::node::{Coord, Node};

/// Handle to a node in a [`Forest`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(pub(crate) usize);

/// The forest: all nodes plus the ordered list of roots.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes ever added (detached subtrees included).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Append a new root node.
    pub fn add_root(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::named(name));
        self.roots.push(id);
        trace!(id = id.0, "added root");
        id
    }

    /// Append a new child at the end of `parent`'s children.
    ///
    /// # Panics
    /// Panics if `parent` is not a handle from this forest.
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        assert!(parent.0 < self.nodes.len(), "parent handle out of range");
        let id = NodeId(self.nodes.len());
        let mut node = Node::named(name);
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Move `id` (and its subtree) under `new_parent`, appended at the end of
    /// its children. Fails with [`StructuralError::Cycle`] when `new_parent`
    /// is `id` itself or one of its descendants.
    pub fn reparent(&mut self, id: NodeId, new_parent: NodeId) -> Result<(), StructuralError> {
        if self.is_ancestor_or_self(id, new_parent) {
            return Err(StructuralError::Cycle {
                path: self.path(id),
            });
        }

        if let Some(old_parent) = self.nodes[id.0].parent {
            self.nodes[old_parent.0].children.retain(|c| *c != id);
        } else {
            self.roots.retain(|r| *r != id);
        }

        self.nodes[id.0].parent = Some(new_parent);
        self.nodes[new_parent.0].children.push(id);
        Ok(())
    }

    /// Detach `id` from its parent, making it a root.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent {
            self.nodes[parent.0].children.retain(|c| *c != id);
            self.nodes[id.0].parent = None;
            self.roots.push(id);
        }
    }

    /// Whether `ancestor` is `node` or appears on `node`'s parent chain.
    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        // Bounded walk: a corrupted parent chain must not hang us.
        for _ in 0..=self.nodes.len() {
            match current {
                Some(id) if id == ancestor => return true,
                Some(id) => current = self.nodes[id.0].parent,
                None => return false,
            }
        }
        false
    }

    /// "/"-joined path from the forest root, e.g. `/recording/baseline`.
    pub fn path(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        for _ in 0..=self.nodes.len() {
            match current {
                Some(nid) => {
                    names.push(self.nodes[nid.0].name.clone());
                    current = self.nodes[nid.0].parent;
                }
                None => break,
            }
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }

    /// Look a node up by path. Accepts a leading "/" or not.
    pub fn resolve_path(&self, path: &str) -> Option<NodeId> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let first = segments.next()?;
        let mut current = *self
            .roots
            .iter()
            .find(|r| self.nodes[r.0].name == first)?;
        for segment in segments {
            current = *self.nodes[current.0]
                .children
                .iter()
                .find(|c| self.nodes[c.0].name == segment)?;
        }
        Some(current)
    }

    /// Resolve a coordinate name at `id`, walking ancestors until found.
    ///
    /// A coordinate defined on a nearer node shadows a same-named one on a
    /// farther ancestor; the walk order makes that automatic. Returns the
    /// defining node together with the coordinate.
    pub fn resolve_coord(&self, id: NodeId, name: &str) -> Option<(NodeId, &Coord)> {
        let mut current = Some(id);
        for _ in 0..=self.nodes.len() {
            let nid = current?;
            if let Some(coord) = self.nodes[nid.0].coord(name) {
                return Some((nid, coord));
            }
            current = self.nodes[nid.0].parent;
        }
        None
    }

    /// Depth-first iterator over the whole forest, roots in stored order,
    /// children in stored order.
    pub fn iter_depth_first(&self) -> DepthFirstIter<'_> {
        // The stack is popped from the back; push roots reversed so the
        // first root is visited first.
        DepthFirstIter {
            forest: self,
            stack: self.roots.iter().rev().copied().collect(),
        }
    }
}

pub struct DepthFirstIter<'a> {
    forest: &'a Forest,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DepthFirstIter<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.forest.node(id)?;
        for &child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some((id, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_forest() -> (Forest, NodeId, NodeId, NodeId) {
        let mut forest = Forest::new();
        let root = forest.add_root("recording");
        let a = forest.add_child(root, "baseline");
        let b = forest.add_child(root, "drug");
        (forest, root, a, b)
    }

    #[test]
    fn paths_and_resolution() {
        let (forest, root, a, _) = small_forest();
        assert_eq!(forest.path(root), "/recording");
        assert_eq!(forest.path(a), "/recording/baseline");
        assert_eq!(forest.resolve_path("/recording/baseline"), Some(a));
        assert_eq!(forest.resolve_path("recording/baseline"), Some(a));
        assert_eq!(forest.resolve_path("/recording/missing"), None);
    }

    #[test]
    fn depth_first_order_is_children_in_stored_order() {
        let (mut forest, _, a, b) = small_forest();
        let a1 = forest.add_child(a, "sweep0");
        let order: Vec<NodeId> = forest.iter_depth_first().map(|(id, _)| id).collect();
        assert_eq!(order, vec![NodeId(0), a, a1, b]);
    }

    #[test]
    fn coord_resolution_walks_ancestors_with_shadowing() {
        let (mut forest, root, a, b) = small_forest();
        forest
            .node_mut(root)
            .unwrap()
            .set_coord("time", Coord::new(vec![0.0, 1.0, 2.0], "s"));
        forest
            .node_mut(a)
            .unwrap()
            .set_coord("time", Coord::new(vec![0.0, 0.5, 1.0], "ms"));

        // `a` sees its own coordinate, `b` inherits the root's.
        let (owner, coord) = forest.resolve_coord(a, "time").unwrap();
        assert_eq!(owner, a);
        assert_eq!(coord.units, "ms");

        let (owner, coord) = forest.resolve_coord(b, "time").unwrap();
        assert_eq!(owner, root);
        assert_eq!(coord.units, "s");

        assert!(forest.resolve_coord(b, "voltage").is_none());
    }

    #[test]
    fn reparent_moves_subtree_and_rejects_cycles() {
        let (mut forest, root, a, b) = small_forest();
        forest.reparent(b, a).unwrap();
        assert_eq!(forest.path(b), "/recording/baseline/drug");
        assert_eq!(forest.node(root).unwrap().children(), &[a]);

        // Moving an ancestor under its own descendant must fail.
        let err = forest.reparent(root, b).unwrap_err();
        assert!(matches!(err, StructuralError::Cycle { .. }));

        // Self-reparenting is a cycle too.
        assert!(forest.reparent(a, a).is_err());
    }

    #[test]
    fn detach_promotes_to_root() {
        let (mut forest, root, a, _) = small_forest();
        forest.detach(a);
        assert_eq!(forest.node(a).unwrap().parent(), None);
        assert!(forest.roots().contains(&a));
        assert!(!forest.node(root).unwrap().children().contains(&a));
    }
}
