//! Whole-subtree operations: free, empty, clone, child lookup, leaf walks.
//!
//! All walks are iterative; trees built without rebalancing can be far
//! deeper than the call stack allows.

use tracing::debug;

use crate::common::{Error, NodeId, Result, ResultExt};
use crate::node::{NodeArena, TreeNode};

impl<P> NodeArena<P> {
    /// Free `id` and its whole subtree, children before parents.
    ///
    /// Each payload is handed to `value_free`; without one, payloads are
    /// dropped.
    ///
    /// # Errors
    /// - `Error::InvalidState` if `id` still has a parent or siblings; the
    ///   node is left untouched (detach it first)
    pub fn free_node(&self, id: NodeId, value_free: Option<&mut dyn FnMut(P)>) -> Result<()> {
        let mut drop_value = |_: P| {};
        let free: &mut dyn FnMut(P) = match value_free {
            Some(free) => free,
            None => &mut drop_value,
        };
        self.free_subtree(id, free)
    }

    /// Free every child subtree of `id`, keeping `id` and its payload.
    ///
    /// Used to reset a node without destroying it.
    pub fn empty_node(&self, id: NodeId, value_free: Option<&mut dyn FnMut(P)>) -> Result<()> {
        let children = {
            let mut node = self.write(id)?;
            let children = self.children_of(&*node)?;
            node.clear_children();
            children
        };

        let mut drop_value = |_: P| {};
        let free: &mut dyn FnMut(P) = match value_free {
            Some(free) => free,
            None => &mut drop_value,
        };
        for child in children {
            self.write(child)?.unlink();
            self.free_subtree(child, &mut *free)
                .with_context(|| format!("unable to free sub node {} of {}", child, id))?;
        }
        Ok(())
    }

    /// Deep-copy the subtree rooted at `id`.
    ///
    /// Payloads are copied with `value_clone`; children are cloned and
    /// appended in order. The copy comes back unlinked. If any step fails,
    /// everything cloned so far is freed through `value_free`.
    ///
    /// The source root stays read-locked for the whole copy.
    pub fn clone_subtree(
        &self,
        id: NodeId,
        value_clone: &mut dyn FnMut(&P) -> Result<P>,
        value_free: Option<&mut dyn FnMut(P)>,
    ) -> Result<NodeId> {
        self.clone_subtree_into(id, self, value_clone, value_free)
    }

    /// Deep-copy the subtree rooted at `id` into `target`, which may be
    /// this arena.
    pub fn clone_subtree_into(
        &self,
        id: NodeId,
        target: &NodeArena<P>,
        value_clone: &mut dyn FnMut(&P) -> Result<P>,
        value_free: Option<&mut dyn FnMut(P)>,
    ) -> Result<NodeId> {
        let source = self.read(id)?;
        let root = target
            .initialize_node()
            .with_context(|| format!("unable to clone {}", id))?;

        match self.clone_into(&source, target, root, value_clone) {
            Ok(count) => {
                debug!(source = %id, clone = %root, nodes = count, "cloned subtree");
                Ok(root)
            }
            Err(err) => {
                if let Err(unwind) = target.free_node(root, value_free) {
                    debug!(clone = %root, error = %unwind, "unable to unwind partial clone");
                }
                Err(err.context(format!("unable to clone {}", id)))
            }
        }
    }

    /// Child at `index`, walking from whichever end is closer.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` if `index` is out of range
    /// - `Error::Corruption` if the child list is shorter than its count
    pub fn sub_node_by_index(&self, id: NodeId, index: usize) -> Result<NodeId> {
        let node = self.read(id)?;
        let count = node.child_count();
        if index >= count {
            return Err(Error::InvalidArgument(format!(
                "sub node index {} out of range ({} has {} sub nodes)",
                index, id, count
            )));
        }

        let broken = || Error::Corruption(format!("sub node list of {} ends early", id));
        if index < count / 2 {
            let mut cursor = node.first_child().ok_or_else(broken)?;
            for _ in 0..index {
                cursor = self.next(cursor)?.ok_or_else(broken)?;
            }
            Ok(cursor)
        } else {
            let mut cursor = node.last_child().ok_or_else(broken)?;
            for _ in 0..(count - 1 - index) {
                cursor = self.previous(cursor)?.ok_or_else(broken)?;
            }
            Ok(cursor)
        }
    }

    /// Children of `id`, first to last.
    pub fn sub_nodes(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let node = self.read(id)?;
        self.children_of(&*node)
    }

    /// Call `f` on every leaf under `id` (including `id` itself if it is a
    /// leaf), left to right. Each leaf is read-locked during its call.
    pub fn visit_leaves<F>(&self, id: NodeId, mut f: F) -> Result<()>
    where
        F: FnMut(NodeId, &TreeNode<P>) -> Result<()>,
    {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.read(current)?;
            if node.is_leaf() {
                f(current, &*node)?;
            } else {
                let children = self.children_of(&node)?;
                stack.extend(children.into_iter().rev());
            }
        }
        Ok(())
    }

    /// Payloads of every leaf under `id`, left to right.
    ///
    /// Leaves without a payload are skipped.
    pub fn leaf_node_list(&self, id: NodeId) -> Result<Vec<P>>
    where
        P: Clone,
    {
        let mut values = Vec::new();
        self.visit_leaves(id, |_, node| {
            if let Some(value) = node.value() {
                values.push(value.clone());
            }
            Ok(())
        })?;
        Ok(values)
    }

    /// Every leaf under `id`, left to right.
    pub fn leaf_node_ids(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut ids = Vec::new();
        self.visit_leaves(id, |leaf, _| {
            ids.push(leaf);
            Ok(())
        })?;
        Ok(ids)
    }

    /// Every node under `id`, parents before children.
    pub fn subtree_ids(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.sub_nodes(current)?.into_iter().rev());
        }
        Ok(order)
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// Child ids of an already locked node.
    pub(crate) fn children_of(&self, node: &TreeNode<P>) -> Result<Vec<NodeId>> {
        let mut children = Vec::with_capacity(node.child_count());
        let mut cursor = node.first_child();
        while let Some(child) = cursor {
            children.push(child);
            cursor = self.next(child)?;
        }

        if children.len() != node.child_count() {
            return Err(Error::Corruption(format!(
                "sub node list has {} entries but count is {}",
                children.len(),
                node.child_count()
            )));
        }
        Ok(children)
    }

    fn free_subtree(&self, id: NodeId, free: &mut dyn FnMut(P)) -> Result<()> {
        if self.read(id)?.is_linked() {
            return Err(Error::InvalidState(format!(
                "{} is still linked; detach it before freeing",
                id
            )));
        }

        let order = self.subtree_ids(id)?;
        let count = order.len();
        for node_id in order.into_iter().rev() {
            let mut node = self.release(node_id)?;
            if let Some(value) = node.take_value() {
                free(value);
            }
        }

        debug!(node = %id, nodes = count, "freed subtree");
        Ok(())
    }

    /// Copy `source`'s payload and descendants under `root` in `target`.
    /// Returns the number of nodes written.
    fn clone_into(
        &self,
        source: &TreeNode<P>,
        target: &NodeArena<P>,
        root: NodeId,
        value_clone: &mut dyn FnMut(&P) -> Result<P>,
    ) -> Result<usize> {
        if let Some(value) = source.value() {
            target.set_value(root, Some(value_clone(value)?))?;
        }

        let mut count = 1;
        let mut stack: Vec<(NodeId, NodeId)> = self
            .children_of(source)?
            .into_iter()
            .rev()
            .map(|child| (child, root))
            .collect();

        while let Some((original, parent)) = stack.pop() {
            // Link first so a later failure unwinds this node with the rest.
            let copy = target.initialize_node()?;
            target.link_last(parent, copy)?;
            count += 1;

            let children = {
                let node = self.read(original)?;
                if let Some(value) = node.value() {
                    target.set_value(copy, Some(value_clone(value)?))?;
                }
                self.children_of(&node)?
            };
            stack.extend(children.into_iter().rev().map(|child| (child, copy)));
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds:
    /// ```text
    ///        0
    ///     /  |  \
    ///    1   2   3
    ///   / \      |
    ///  4   5     6
    /// ```
    fn sample(arena: &NodeArena<i32>) -> (NodeId, Vec<NodeId>) {
        let ids: Vec<_> = (0..7)
            .map(|v| arena.initialize_node_with_value(Some(v)).unwrap())
            .collect();
        for (parent, child) in [(0, 1), (0, 2), (0, 3), (1, 4), (1, 5), (3, 6)] {
            arena.append_node(ids[parent], ids[child]).unwrap();
        }
        (ids[0], ids)
    }

    #[test]
    fn test_leaf_node_list() {
        let arena = NodeArena::new();
        let (root, ids) = sample(&arena);

        assert_eq!(arena.leaf_node_list(root).unwrap(), vec![4, 5, 2, 6]);
        assert_eq!(
            arena.leaf_node_ids(root).unwrap(),
            vec![ids[4], ids[5], ids[2], ids[6]]
        );

        // A leaf lists itself
        assert_eq!(arena.leaf_node_list(ids[2]).unwrap(), vec![2]);
    }

    #[test]
    fn test_subtree_ids_preorder() {
        let arena = NodeArena::new();
        let (root, ids) = sample(&arena);
        let order = arena.subtree_ids(root).unwrap();
        let expected: Vec<_> = [0, 1, 4, 5, 2, 3, 6].iter().map(|&i| ids[i]).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_sub_node_by_index_from_both_ends() {
        let arena = NodeArena::new();
        let parent = arena.initialize_node_with_value(Some(-1)).unwrap();
        let ids: Vec<_> = (0..9)
            .map(|v| {
                let id = arena.initialize_node_with_value(Some(v)).unwrap();
                arena.append_node(parent, id).unwrap();
                id
            })
            .collect();

        for (i, id) in ids.iter().enumerate() {
            assert_eq!(arena.sub_node_by_index(parent, i).unwrap(), *id);
        }
        assert!(matches!(
            arena.sub_node_by_index(parent, 9),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_free_whole_tree() {
        let arena = NodeArena::new();
        let (root, ids) = sample(&arena);

        let mut freed = Vec::new();
        arena
            .free_node(root, Some(&mut |v: i32| freed.push(v)))
            .unwrap();

        // Children before parents
        assert_eq!(freed, vec![6, 3, 2, 5, 4, 1, 0]);
        assert_eq!(arena.live_nodes(), 0);
        assert!(ids.iter().all(|id| !arena.contains(*id)));
    }

    #[test]
    fn test_free_refuses_linked_node() {
        let arena = NodeArena::new();
        let (_, ids) = sample(&arena);

        let result = arena.free_node(ids[1], None);
        assert!(matches!(result, Err(Error::InvalidState(_))));

        // Untouched
        assert_eq!(arena.number_of_sub_nodes(ids[1]).unwrap(), 2);
        assert_eq!(arena.value(ids[4]).unwrap(), Some(4));
        assert_eq!(arena.live_nodes(), 7);
    }

    #[test]
    fn test_empty_keeps_node_and_payload() {
        let arena = NodeArena::new();
        let (root, _) = sample(&arena);

        let mut freed = 0;
        arena
            .empty_node(root, Some(&mut |_: i32| freed += 1))
            .unwrap();

        assert_eq!(freed, 6);
        assert_eq!(arena.value(root).unwrap(), Some(0));
        assert!(arena.read(root).unwrap().is_leaf());
        assert_eq!(arena.first_sub_node(root).unwrap(), None);
        assert_eq!(arena.live_nodes(), 1);
    }

    #[test]
    fn test_clone_subtree() {
        let arena = NodeArena::new();
        let (root, _) = sample(&arena);

        let copy = arena
            .clone_subtree(root, &mut |v: &i32| -> Result<i32> { Ok(v * 10) }, None)
            .unwrap();

        assert_ne!(copy, root);
        assert!(!arena.read(copy).unwrap().is_linked());
        assert_eq!(arena.value(copy).unwrap(), Some(0));
        assert_eq!(arena.leaf_node_list(copy).unwrap(), vec![40, 50, 20, 60]);
        assert_eq!(arena.live_nodes(), 14);

        // Source is unaffected
        assert_eq!(arena.leaf_node_list(root).unwrap(), vec![4, 5, 2, 6]);
    }

    #[test]
    fn test_clone_failure_unwinds() {
        let arena = NodeArena::new();
        let (root, _) = sample(&arena);

        let mut freed = Vec::new();
        let result = arena.clone_subtree(
            root,
            &mut |v: &i32| -> Result<i32> {
                if *v == 5 {
                    Err(Error::CloneFailed("refusing 5".into()))
                } else {
                    Ok(*v)
                }
            },
            Some(&mut |v: i32| freed.push(v)),
        );

        let err = result.unwrap_err();
        assert!(matches!(err.root_cause(), Error::CloneFailed(_)));

        // 0, 1, 4 were cloned before 5 failed; all of them are released
        freed.sort_unstable();
        assert_eq!(freed, vec![0, 1, 4]);
        assert_eq!(arena.live_nodes(), 7);
    }

    #[test]
    fn test_clone_failure_on_allocation() {
        let arena = NodeArena::try_with_capacity(10).unwrap();
        let (root, _) = sample(&arena);

        let result = arena.clone_subtree(root, &mut |v: &i32| -> Result<i32> { Ok(*v) }, None);
        assert!(matches!(
            result.unwrap_err().root_cause(),
            Error::Allocation(_)
        ));
        assert_eq!(arena.live_nodes(), 7);
    }

    #[test]
    fn test_clone_into_other_arena() {
        let source = NodeArena::new();
        let target = NodeArena::new();
        let (root, _) = sample(&source);

        let copy = source
            .clone_subtree_into(root, &target, &mut |v: &i32| -> Result<i32> { Ok(*v) }, None)
            .unwrap();

        assert_eq!(target.leaf_node_list(copy).unwrap(), vec![4, 5, 2, 6]);
        assert_eq!(target.live_nodes(), 7);
        assert_eq!(source.live_nodes(), 7);
    }
}
