//! NodeSlot - one cell of the node arena.
//!
//! A [`NodeSlot`] holds a [`TreeNode`] (if live) plus the slot generation.
//! Both sit behind one `RwLock`, which is the node's lock: readers share it,
//! structural writers take it exclusively.

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use crate::common::NodeId;
use crate::node::TreeNode;

/// State guarded by the slot lock.
#[derive(Debug)]
pub(crate) struct SlotState<P> {
    /// Bumped every time the slot is released.
    generation: u32,

    /// The live node, or None for a free slot.
    node: Option<TreeNode<P>>,
}

/// A slot in the arena.
#[derive(Debug)]
pub(crate) struct NodeSlot<P> {
    state: RwLock<SlotState<P>>,
}

impl<P> NodeSlot<P> {
    /// Create a free slot.
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(SlotState {
                generation: 0,
                node: None,
            }),
        }
    }

    /// Shared lock on the node, if `id` still names it.
    #[inline]
    pub(crate) fn read(&self, id: NodeId) -> Option<MappedRwLockReadGuard<'_, TreeNode<P>>> {
        let generation = id.generation();
        RwLockReadGuard::try_map(self.state.read(), |state| {
            if state.generation == generation {
                state.node.as_ref()
            } else {
                None
            }
        })
        .ok()
    }

    /// Exclusive lock on the node, if `id` still names it.
    #[inline]
    pub(crate) fn write(&self, id: NodeId) -> Option<MappedRwLockWriteGuard<'_, TreeNode<P>>> {
        let generation = id.generation();
        RwLockWriteGuard::try_map(self.state.write(), |state| {
            if state.generation == generation {
                state.node.as_mut()
            } else {
                None
            }
        })
        .ok()
    }

    /// Place a fresh node in a free slot, returning the slot generation.
    ///
    /// Returns None if the slot is occupied.
    pub(crate) fn occupy(&self, node: TreeNode<P>) -> Option<u32> {
        let mut state = self.state.write();
        if state.node.is_some() {
            return None;
        }
        state.node = Some(node);
        Some(state.generation)
    }

    /// Take the node out and invalidate every outstanding handle.
    ///
    /// Returns None if `id` does not name the live node.
    pub(crate) fn release(&self, id: NodeId) -> Option<TreeNode<P>> {
        let mut state = self.state.write();
        if state.generation != id.generation() {
            return None;
        }
        let node = state.node.take()?;
        state.generation = state.generation.wrapping_add(1);
        Some(node)
    }

    /// Whether the slot holds a live node.
    #[cfg(test)]
    pub(crate) fn is_occupied(&self) -> bool {
        self.state.read().node.is_some()
    }
}
