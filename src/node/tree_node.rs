//! TreeNode - the per-node fields of the tree.
//!
//! A [`TreeNode`] holds one optional payload plus its links:
//! - `parent`, `previous`, `next` - references, never owning
//! - `first_child`, `last_child` - the node owns its child subtree
//!
//! Links are [`NodeId`]s into the owning [`NodeArena`](super::NodeArena),
//! so a node can only be reached through the arena's guards. Link setters
//! are crate-private: callers read links, only the arena's structural
//! operations write them.

use crate::common::NodeId;

/// Fields of one node.
#[derive(Debug, Clone)]
pub struct TreeNode<P> {
    /// Payload, if any.
    value: Option<P>,

    /// Owning node, or None for a subtree root.
    parent: Option<NodeId>,

    /// Sibling before this node.
    previous: Option<NodeId>,

    /// Sibling after this node.
    next: Option<NodeId>,

    /// First child.
    first_child: Option<NodeId>,

    /// Last child.
    last_child: Option<NodeId>,

    /// Number of children.
    child_count: usize,
}

impl<P> TreeNode<P> {
    /// Create an unlinked node.
    pub(crate) fn new(value: Option<P>) -> Self {
        Self {
            value,
            parent: None,
            previous: None,
            next: None,
            first_child: None,
            last_child: None,
            child_count: 0,
        }
    }

    // ========================================================================
    // Payload
    // ========================================================================

    /// The payload.
    #[inline]
    pub fn value(&self) -> Option<&P> {
        self.value.as_ref()
    }

    /// The payload, mutably.
    #[inline]
    pub fn value_mut(&mut self) -> Option<&mut P> {
        self.value.as_mut()
    }

    /// Replace the payload, returning the previous one.
    #[inline]
    pub fn set_value(&mut self, value: Option<P>) -> Option<P> {
        std::mem::replace(&mut self.value, value)
    }

    /// Take the payload out, leaving None.
    #[inline]
    pub fn take_value(&mut self) -> Option<P> {
        self.value.take()
    }

    // ========================================================================
    // Links (read)
    // ========================================================================

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn previous(&self) -> Option<NodeId> {
        self.previous
    }

    #[inline]
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    #[inline]
    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    #[inline]
    pub fn last_child(&self) -> Option<NodeId> {
        self.last_child
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.child_count
    }

    /// A node without children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.child_count == 0
    }

    /// Whether the node hangs off a parent or sits between siblings.
    ///
    /// A node joining a tree must not be linked.
    #[inline]
    pub fn is_linked(&self) -> bool {
        self.parent.is_some() || self.previous.is_some() || self.next.is_some()
    }

    // ========================================================================
    // Links (write, arena only)
    // ========================================================================

    #[inline]
    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    #[inline]
    pub(crate) fn set_previous(&mut self, previous: Option<NodeId>) {
        self.previous = previous;
    }

    #[inline]
    pub(crate) fn set_next(&mut self, next: Option<NodeId>) {
        self.next = next;
    }

    /// Clear parent and sibling links.
    #[inline]
    pub(crate) fn unlink(&mut self) {
        self.parent = None;
        self.previous = None;
        self.next = None;
    }

    #[inline]
    pub(crate) fn set_first_child(&mut self, first_child: Option<NodeId>) {
        self.first_child = first_child;
    }

    #[inline]
    pub(crate) fn set_last_child(&mut self, last_child: Option<NodeId>) {
        self.last_child = last_child;
    }

    #[inline]
    pub(crate) fn set_child_count(&mut self, child_count: usize) {
        self.child_count = child_count;
    }

    /// Forget all children without touching them.
    #[inline]
    pub(crate) fn clear_children(&mut self) {
        self.first_child = None;
        self.last_child = None;
        self.child_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_unlinked_leaf() {
        let node = TreeNode::new(Some(7));
        assert_eq!(node.value(), Some(&7));
        assert!(node.is_leaf());
        assert!(!node.is_linked());
        assert_eq!(node.first_child(), None);
        assert_eq!(node.last_child(), None);
    }

    #[test]
    fn test_value_replace_and_take() {
        let mut node = TreeNode::new(None);
        assert_eq!(node.set_value(Some("a")), None);
        assert_eq!(node.set_value(Some("b")), Some("a"));
        assert_eq!(node.take_value(), Some("b"));
        assert_eq!(node.value(), None);
    }

    #[test]
    fn test_linked_when_any_link_set() {
        let mut node: TreeNode<()> = TreeNode::new(None);
        node.set_next(Some(NodeId::new(1, 0)));
        assert!(node.is_linked());

        node.unlink();
        assert!(!node.is_linked());

        node.set_parent(Some(NodeId::new(2, 0)));
        assert!(node.is_linked());
    }

    #[test]
    fn test_clear_children() {
        let mut node: TreeNode<()> = TreeNode::new(None);
        node.set_first_child(Some(NodeId::new(1, 0)));
        node.set_last_child(Some(NodeId::new(2, 0)));
        node.set_child_count(2);
        assert!(!node.is_leaf());

        node.clear_children();
        assert!(node.is_leaf());
        assert_eq!(node.first_child(), None);
    }
}
