//! Structural linking: append, ordered insert, replace and remove.
//!
//! Every operation holds the target node's write lock for its whole
//! duration. Fields of the node being linked or unlinked, and of its
//! siblings, are written through their own locks while the target lock is
//! held, so no other structural operation on the same child list can
//! interleave.

use std::cmp::Ordering;
use std::sync::atomic::Ordering as AtomicOrdering;

use tracing::debug;

use crate::common::{Comparator, Error, NodeId, Result};
use crate::node::{NodeArena, NodeWriteGuard};

impl<P> NodeArena<P> {
    /// Append `child` as the last child of `parent`. O(1).
    ///
    /// # Errors
    /// - `Error::InvalidArgument` if `child` is `parent` or one of its ancestors
    /// - `Error::InvalidState` if `child` already has a parent or siblings;
    ///   `parent` is left unchanged
    pub fn append_node(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.ensure_not_ancestor(child, parent)?;
        self.link_last(parent, child)
    }

    /// Append without the ancestry walk. `child` must be a node that cannot
    /// be an ancestor of `parent` (typically freshly allocated).
    pub(crate) fn link_last(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let mut parent_node = self.write(parent)?;
        self.link_children_locked(&mut parent_node, &[child])
    }

    /// Append `children` in order under a parent the caller already holds
    /// write-locked.
    ///
    /// # Errors
    /// - `Error::InvalidState` if a child is already linked; children before
    ///   it stay appended
    pub(crate) fn link_children_locked(
        &self,
        parent_node: &mut NodeWriteGuard<'_, P>,
        children: &[NodeId],
    ) -> Result<()> {
        let parent = parent_node.id();
        for &child in children {
            let previous = parent_node.last_child();
            {
                let mut child_node = self.write(child)?;
                if child_node.is_linked() {
                    return Err(already_linked(child));
                }
                child_node.set_parent(Some(parent));
                child_node.set_previous(previous);
            }

            match previous {
                Some(last) => self.set_next(last, Some(child))?,
                None => parent_node.set_first_child(Some(child)),
            }
            parent_node.set_last_child(Some(child));
            let count = parent_node.child_count();
            parent_node.set_child_count(count + 1);
        }
        Ok(())
    }

    /// Collapse `id` into its only child.
    ///
    /// `id` takes over the child's payload and children; the child is
    /// released. `id` keeps its own place in the tree. Returns the payload
    /// `id` held before.
    ///
    /// # Errors
    /// - `Error::InvalidState` if `id` does not have exactly one child
    pub fn collapse_into_only_child(&self, id: NodeId) -> Result<Option<P>> {
        let mut node = self.write(id)?;
        if node.child_count() != 1 {
            return Err(Error::InvalidState(format!(
                "{} has {} sub nodes, expected exactly 1",
                id,
                node.child_count()
            )));
        }
        let child = node
            .first_child()
            .ok_or_else(|| Error::Corruption(format!("{} counts a sub node it does not link", id)))?;

        let (payload, grandchildren) = {
            let mut child_node = self.write(child)?;
            let grandchildren = self.children_of(&child_node)?;
            child_node.clear_children();
            child_node.unlink();
            (child_node.take_value(), grandchildren)
        };

        for &grandchild in &grandchildren {
            self.set_parent(grandchild, Some(id))?;
        }
        node.set_first_child(grandchildren.first().copied());
        node.set_last_child(grandchildren.last().copied());
        node.set_child_count(grandchildren.len());
        let previous = node.set_value(payload);

        self.release(child)?;
        self.stats().collapses.fetch_add(1, AtomicOrdering::Relaxed);
        debug!(node = %id, child = %child, sub_nodes = grandchildren.len(), "collapsed into only child");
        Ok(previous)
    }

    /// Insert `child` among the children of `parent` in payload order.
    ///
    /// Children are scanned from the first; `child` goes before the first
    /// child whose payload it compares `Less` against, or last if there is
    /// none. With `unique`, an `Equal` payload stops the scan: nothing is
    /// inserted and `Ok(false)` is returned.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` if `child` is `parent` or one of its
    ///   ancestors, or carries no payload
    /// - `Error::InvalidState` if `child` is already linked, or a sibling
    ///   carries no payload
    /// - comparator failures; nothing is inserted
    pub fn insert_node<C>(
        &self,
        parent: NodeId,
        child: NodeId,
        comparator: &C,
        unique: bool,
    ) -> Result<bool>
    where
        C: Comparator<P> + ?Sized,
    {
        self.ensure_not_ancestor(child, parent)?;

        let mut parent_node = self.write(parent)?;
        let mut child_node = self.write(child)?;
        if child_node.is_linked() {
            return Err(already_linked(child));
        }

        // Find the first sibling the new child sorts before.
        let mut before = None;
        {
            let value = child_node.value().ok_or_else(|| {
                Error::InvalidArgument(format!("{} has no value to order by", child))
            })?;

            let mut cursor = parent_node.first_child();
            while let Some(sibling) = cursor {
                let sibling_node = self.read(sibling)?;
                let sibling_value = sibling_node.value().ok_or_else(|| {
                    Error::InvalidState(format!("{} has no value to order by", sibling))
                })?;

                match comparator.compare(value, sibling_value)? {
                    Ordering::Less => {
                        before = Some(sibling);
                        break;
                    }
                    Ordering::Equal if unique => return Ok(false),
                    _ => cursor = sibling_node.next(),
                }
            }
        }

        match before {
            Some(next) => {
                let previous = self.previous(next)?;
                child_node.set_parent(Some(parent));
                child_node.set_previous(previous);
                child_node.set_next(Some(next));
                drop(child_node);

                self.set_previous(next, Some(child))?;
                match previous {
                    Some(previous) => self.set_next(previous, Some(child))?,
                    None => parent_node.set_first_child(Some(child)),
                }
            }
            None => {
                let previous = parent_node.last_child();
                child_node.set_parent(Some(parent));
                child_node.set_previous(previous);
                drop(child_node);

                match previous {
                    Some(last) => self.set_next(last, Some(child))?,
                    None => parent_node.set_first_child(Some(child)),
                }
                parent_node.set_last_child(Some(child));
            }
        }

        let count = parent_node.child_count();
        parent_node.set_child_count(count + 1);
        Ok(true)
    }

    /// Put `new` into exactly the place of `old` among its parent's children.
    ///
    /// Children of both nodes are left alone. `old` comes out unlinked and
    /// keeps its own subtree.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` if `old == new`
    /// - `Error::InvalidState` if `old` has no parent or `new` is linked
    pub fn replace_node(&self, old: NodeId, new: NodeId) -> Result<()> {
        if old == new {
            return Err(Error::InvalidArgument(format!(
                "cannot replace {} with itself",
                old
            )));
        }

        let parent = self
            .parent(old)?
            .ok_or_else(|| Error::InvalidState(format!("{} has no parent", old)))?;
        self.ensure_not_ancestor(new, parent)?;

        let mut parent_node = self.write(parent)?;
        let (previous, next) = {
            let mut old_node = self.write(old)?;
            if old_node.parent() != Some(parent) {
                return Err(Error::InvalidState(format!(
                    "{} was moved while being replaced",
                    old
                )));
            }

            let mut new_node = self.write(new)?;
            if new_node.is_linked() {
                return Err(already_linked(new));
            }

            let previous = old_node.previous();
            let next = old_node.next();
            new_node.set_parent(Some(parent));
            new_node.set_previous(previous);
            new_node.set_next(next);
            old_node.unlink();
            (previous, next)
        };

        match previous {
            Some(previous) => self.set_next(previous, Some(new))?,
            None => parent_node.set_first_child(Some(new)),
        }
        match next {
            Some(next) => self.set_previous(next, Some(new))?,
            None => parent_node.set_last_child(Some(new)),
        }
        Ok(())
    }

    /// Detach `child` from `parent`.
    ///
    /// `child` comes out unlinked and keeps its own subtree.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` if `child` is not a child of `parent`
    pub fn remove_node(&self, parent: NodeId, child: NodeId) -> Result<()> {
        if parent == child {
            return Err(not_a_child(parent, child));
        }

        let mut parent_node = self.write(parent)?;
        let (previous, next) = {
            let mut child_node = self.write(child)?;
            if child_node.parent() != Some(parent) {
                return Err(not_a_child(parent, child));
            }
            let links = (child_node.previous(), child_node.next());
            child_node.unlink();
            links
        };

        match previous {
            Some(previous) => self.set_next(previous, next)?,
            None => parent_node.set_first_child(next),
        }
        match next {
            Some(next) => self.set_previous(next, previous)?,
            None => parent_node.set_last_child(previous),
        }

        let count = parent_node.child_count();
        parent_node.set_child_count(count.saturating_sub(1));
        Ok(())
    }

    /// Fail if `node` is `of` or one of its ancestors.
    ///
    /// Runs before any lock of the operation is taken; each step locks one
    /// node briefly.
    fn ensure_not_ancestor(&self, node: NodeId, of: NodeId) -> Result<()> {
        let mut cursor = Some(of);
        while let Some(current) = cursor {
            if current == node {
                return Err(Error::InvalidArgument(format!(
                    "{} cannot become a descendant of itself",
                    node
                )));
            }
            cursor = self.parent(current)?;
        }
        Ok(())
    }
}

fn already_linked(id: NodeId) -> Error {
    Error::InvalidState(format!("{} is already linked into a tree", id))
}

fn not_a_child(parent: NodeId, child: NodeId) -> Error {
    Error::InvalidArgument(format!("{} is not a child of {}", child, parent))
}

#[cfg(test)]
mod tests {
    use crate::common::NaturalOrder;
    use crate::node::NodeArena;

    use super::*;

    fn children(arena: &NodeArena<i32>, parent: NodeId) -> Vec<i32> {
        arena
            .sub_nodes(parent)
            .unwrap()
            .into_iter()
            .map(|id| arena.value(id).unwrap().unwrap())
            .collect()
    }

    fn node(arena: &NodeArena<i32>, value: i32) -> NodeId {
        arena.initialize_node_with_value(Some(value)).unwrap()
    }

    #[test]
    fn test_append_links_siblings() {
        let arena = NodeArena::new();
        let parent = node(&arena, 0);
        let a = node(&arena, 1);
        let b = node(&arena, 2);

        arena.append_node(parent, a).unwrap();
        arena.append_node(parent, b).unwrap();

        assert_eq!(arena.number_of_sub_nodes(parent).unwrap(), 2);
        assert_eq!(arena.first_sub_node(parent).unwrap(), Some(a));
        assert_eq!(arena.last_sub_node(parent).unwrap(), Some(b));
        assert_eq!(arena.next(a).unwrap(), Some(b));
        assert_eq!(arena.previous(b).unwrap(), Some(a));
        assert_eq!(arena.parent(b).unwrap(), Some(parent));
    }

    #[test]
    fn test_append_rejects_linked_child() {
        let arena = NodeArena::new();
        let first = node(&arena, 0);
        let second = node(&arena, 1);
        let child = node(&arena, 2);

        arena.append_node(first, child).unwrap();
        let result = arena.append_node(second, child);

        assert!(matches!(result, Err(Error::InvalidState(_))));
        assert_eq!(arena.number_of_sub_nodes(second).unwrap(), 0);
    }

    #[test]
    fn test_append_rejects_cycles() {
        let arena = NodeArena::new();
        let root = node(&arena, 0);
        let child = node(&arena, 1);
        arena.append_node(root, child).unwrap();

        assert!(matches!(
            arena.append_node(root, root),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            arena.append_node(child, root),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_insert_in_order() {
        let arena = NodeArena::new();
        let parent = node(&arena, 0);
        for v in [5, 1, 3, 9, 7] {
            let child = node(&arena, v);
            assert!(arena.insert_node(parent, child, &NaturalOrder, true).unwrap());
        }

        assert_eq!(children(&arena, parent), vec![1, 3, 5, 7, 9]);
        let first = arena.first_sub_node(parent).unwrap().unwrap();
        assert_eq!(arena.previous(first).unwrap(), None);
        let last = arena.last_sub_node(parent).unwrap().unwrap();
        assert_eq!(arena.next(last).unwrap(), None);
    }

    #[test]
    fn test_insert_unique_duplicate_is_not_an_error() {
        let arena = NodeArena::new();
        let parent = node(&arena, 0);
        let a = node(&arena, 4);
        let b = node(&arena, 4);

        assert!(arena.insert_node(parent, a, &NaturalOrder, true).unwrap());
        assert!(!arena.insert_node(parent, b, &NaturalOrder, true).unwrap());
        assert_eq!(arena.number_of_sub_nodes(parent).unwrap(), 1);
        assert!(!arena.read(b).unwrap().is_linked());

        // Without uniqueness the duplicate goes after the equal one
        assert!(arena.insert_node(parent, b, &NaturalOrder, false).unwrap());
        assert_eq!(arena.last_sub_node(parent).unwrap(), Some(b));
    }

    #[test]
    fn test_insert_requires_payload() {
        let arena = NodeArena::new();
        let parent = node(&arena, 0);
        let empty = arena.initialize_node().unwrap();

        assert!(matches!(
            arena.insert_node(parent, empty, &NaturalOrder, true),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_replace_takes_exact_slot() {
        let arena = NodeArena::new();
        let parent = node(&arena, 0);
        let ids: Vec<_> = [1, 2, 3].iter().map(|&v| node(&arena, v)).collect();
        for &id in &ids {
            arena.append_node(parent, id).unwrap();
        }
        let grandchild = node(&arena, 20);
        arena.append_node(ids[1], grandchild).unwrap();

        let replacement = node(&arena, 42);
        arena.replace_node(ids[1], replacement).unwrap();

        assert_eq!(children(&arena, parent), vec![1, 42, 3]);
        assert_eq!(arena.next(ids[0]).unwrap(), Some(replacement));
        assert_eq!(arena.previous(ids[2]).unwrap(), Some(replacement));
        assert_eq!(arena.number_of_sub_nodes(parent).unwrap(), 3);

        // The old node is detached but keeps its subtree
        assert!(!arena.read(ids[1]).unwrap().is_linked());
        assert_eq!(arena.number_of_sub_nodes(ids[1]).unwrap(), 1);
        assert_eq!(arena.number_of_sub_nodes(replacement).unwrap(), 0);
    }

    #[test]
    fn test_replace_ends_update_parent() {
        let arena = NodeArena::new();
        let parent = node(&arena, 0);
        let only = node(&arena, 1);
        arena.append_node(parent, only).unwrap();

        let replacement = node(&arena, 2);
        arena.replace_node(only, replacement).unwrap();
        assert_eq!(arena.first_sub_node(parent).unwrap(), Some(replacement));
        assert_eq!(arena.last_sub_node(parent).unwrap(), Some(replacement));
    }

    #[test]
    fn test_replace_errors() {
        let arena = NodeArena::new();
        let parent = node(&arena, 0);
        let a = node(&arena, 1);
        let b = node(&arena, 2);
        arena.append_node(parent, a).unwrap();
        arena.append_node(parent, b).unwrap();

        assert!(matches!(
            arena.replace_node(a, a),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            arena.replace_node(a, b),
            Err(Error::InvalidState(_))
        ));
        let orphan = node(&arena, 3);
        let other = node(&arena, 4);
        assert!(matches!(
            arena.replace_node(orphan, other),
            Err(Error::InvalidState(_))
        ));
        assert_eq!(children(&arena, parent), vec![1, 2]);
    }

    #[test]
    fn test_remove_middle_and_ends() {
        let arena = NodeArena::new();
        let parent = node(&arena, 0);
        let ids: Vec<_> = [1, 2, 3, 4].iter().map(|&v| node(&arena, v)).collect();
        for &id in &ids {
            arena.append_node(parent, id).unwrap();
        }

        arena.remove_node(parent, ids[1]).unwrap();
        assert_eq!(children(&arena, parent), vec![1, 3, 4]);
        assert_eq!(arena.next(ids[0]).unwrap(), Some(ids[2]));
        assert_eq!(arena.previous(ids[2]).unwrap(), Some(ids[0]));

        arena.remove_node(parent, ids[0]).unwrap();
        arena.remove_node(parent, ids[3]).unwrap();
        assert_eq!(children(&arena, parent), vec![3]);
        assert_eq!(arena.first_sub_node(parent).unwrap(), Some(ids[2]));
        assert_eq!(arena.last_sub_node(parent).unwrap(), Some(ids[2]));

        arena.remove_node(parent, ids[2]).unwrap();
        assert_eq!(arena.number_of_sub_nodes(parent).unwrap(), 0);
        assert_eq!(arena.first_sub_node(parent).unwrap(), None);
        assert!(!arena.read(ids[2]).unwrap().is_linked());
    }

    #[test]
    fn test_remove_from_wrong_parent() {
        let arena = NodeArena::new();
        let parent = node(&arena, 0);
        let other = node(&arena, 1);
        let child = node(&arena, 2);
        arena.append_node(parent, child).unwrap();

        assert!(matches!(
            arena.remove_node(other, child),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(arena.parent(child).unwrap(), Some(parent));
        assert_eq!(arena.number_of_sub_nodes(parent).unwrap(), 1);
    }

    #[test]
    fn test_collapse_into_only_child() {
        let arena = NodeArena::new();
        let parent = node(&arena, 0);
        let child = node(&arena, 1);
        arena.append_node(parent, child).unwrap();
        let grandchildren: Vec<_> = [10, 11].iter().map(|&v| node(&arena, v)).collect();
        for &g in &grandchildren {
            arena.append_node(child, g).unwrap();
        }

        let previous = arena.collapse_into_only_child(parent).unwrap();

        assert_eq!(previous, Some(0));
        assert_eq!(arena.value(parent).unwrap(), Some(1));
        assert_eq!(children(&arena, parent), vec![10, 11]);
        assert_eq!(arena.parent(grandchildren[0]).unwrap(), Some(parent));
        assert_eq!(arena.parent(grandchildren[1]).unwrap(), Some(parent));
        assert!(!arena.contains(child));
    }

    #[test]
    fn test_collapse_requires_single_child() {
        let arena = NodeArena::new();
        let parent = node(&arena, 0);
        assert!(matches!(
            arena.collapse_into_only_child(parent),
            Err(Error::InvalidState(_))
        ));

        arena.append_node(parent, node(&arena, 1)).unwrap();
        arena.append_node(parent, node(&arena, 2)).unwrap();
        assert!(matches!(
            arena.collapse_into_only_child(parent),
            Err(Error::InvalidState(_))
        ));
        assert_eq!(children(&arena, parent), vec![1, 2]);
    }
}
