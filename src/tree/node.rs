use crate::tree::text::SourceText;
use std::fmt;
use std::sync::Arc;

/// A node of a parsed syntax tree.
///
/// Nodes are built once per parse and never change afterwards. Children are
/// shared through [`Arc`] so that matches can hold on to a node without
/// owning the tree it came from. Walks over the tree use explicit stacks, so
/// depth is bounded by memory rather than by the thread's stack.
#[derive(Clone)]
pub struct TreeNode {
    /// Production or grammar symbol, e.g. `variable_declarator`
    pub name: String,
    /// Raw source text spanned by the node
    pub value: SourceText,
    /// Ordered child nodes
    pub children: Vec<Arc<TreeNode>>,
    /// Byte offset of `value` in the original source; `None` when synthesized
    pub offset: Option<usize>,
}

impl TreeNode {
    /// Create a node that came from a real parse.
    pub fn located(name: impl Into<String>, value: impl Into<SourceText>, offset: usize) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            children: Vec::new(),
            offset: Some(offset),
        }
    }

    /// Create a node with no source position.
    pub fn synthesized(name: impl Into<String>, value: impl Into<SourceText>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            children: Vec::new(),
            offset: None,
        }
    }

    /// Attach children, replacing any existing ones.
    pub fn with_children(mut self, children: impl IntoIterator<Item = TreeNode>) -> Self {
        self.children = children.into_iter().map(Arc::new).collect();
        self
    }

    /// Byte offset one past the end of `value`, when the node is located.
    pub fn end(&self) -> Option<usize> {
        self.offset.map(|start| start + self.value.len())
    }

    /// Find the outermost node (pre-order) whose span is exactly `[start, end)`,
    /// optionally restricted to nodes called `name`.
    pub fn find_spanning(
        self: &Arc<Self>,
        start: usize,
        end: usize,
        name: Option<&str>,
    ) -> Option<Arc<TreeNode>> {
        let mut pending = vec![Arc::clone(self)];
        while let Some(node) = pending.pop() {
            let named = name.map_or(true, |name| node.name == name);
            if named && node.offset == Some(start) && node.end() == Some(end) {
                return Some(node);
            }

            let covering = node.children.iter().rev().filter(|child| match (child.offset, child.end()) {
                (Some(s), Some(e)) => s <= start && end <= e,
                _ => false,
            });
            pending.extend(covering.cloned());
        }
        None
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_size(&self) -> usize {
        let mut count = 1;
        let mut pending: Vec<&TreeNode> = self.children.iter().map(|c| &**c).collect();
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children.iter().map(|c| &**c));
        }
        count
    }
}

impl fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeNode")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("offset", &self.offset)
            .field("children", &self.children.len())
            .finish()
    }
}

// Unlinks uniquely owned descendants one at a time instead of letting the
// default drop glue recurse once per level.
impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(child) = pending.pop() {
            if let Ok(mut node) = Arc::try_unwrap(child) {
                pending.append(&mut node.children);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declaration() -> Arc<TreeNode> {
        Arc::new(
            TreeNode::located("declaration", "let x = 1", 0).with_children([
                TreeNode::located("keyword", "let", 0),
                TreeNode::located("binding", "x = 1", 4).with_children([
                    TreeNode::located("identifier", "x", 4),
                    TreeNode::located("=", "=", 6),
                    TreeNode::located("number", "1", 8),
                ]),
            ]),
        )
    }

    #[test]
    fn end_offset() {
        let node = TreeNode::located("number", "10", 18);
        assert_eq!(node.end(), Some(20));
        assert_eq!(TreeNode::synthesized("number", "10").end(), None);
    }

    #[test]
    fn find_spanning_prefers_outermost() {
        let root = declaration();
        let found = root.find_spanning(4, 9, None).unwrap();
        assert_eq!(found.name, "binding");

        let found = root.find_spanning(8, 9, None).unwrap();
        assert_eq!(found.name, "number");
    }

    #[test]
    fn find_spanning_by_name() {
        let root = Arc::new(
            TreeNode::located("statement", "f()", 0)
                .with_children([TreeNode::located("call", "f()", 0)]),
        );
        assert_eq!(root.find_spanning(0, 3, Some("call")).unwrap().name, "call");
        assert!(root.find_spanning(0, 3, Some("number")).is_none());
    }

    #[test]
    fn find_spanning_misses_partial_ranges() {
        let root = declaration();
        assert!(root.find_spanning(5, 9, None).is_none());
    }

    #[test]
    fn subtree_size_counts_all_nodes() {
        assert_eq!(declaration().subtree_size(), 6);
    }

    fn chain(depth: usize) -> Arc<TreeNode> {
        let mut node = TreeNode::located("number", "1", 0);
        for _ in 0..depth {
            node = TreeNode::located("parenthesized", "1", 0).with_children([node]);
        }
        Arc::new(node)
    }

    #[test]
    fn deep_chains_are_walked_and_dropped_without_recursion() {
        let root = chain(200_000);
        assert_eq!(root.subtree_size(), 200_001);
        assert_eq!(root.find_spanning(0, 1, Some("number")).unwrap().name, "number");
        drop(root);
    }
}
