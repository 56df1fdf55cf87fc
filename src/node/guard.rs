//! RAII guards for node access.
//!
//! These guards are the only way to reach a node's fields:
//! - [`NodeReadGuard`] - Shared read access (multiple allowed)
//! - [`NodeWriteGuard`] - Exclusive write access
//!
//! Both release the node lock when dropped.

use std::ops::{Deref, DerefMut};

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard};

use crate::common::NodeId;
use crate::node::TreeNode;

/// Guard for read-only node access.
///
/// # Example
/// ```
/// use arbortree::node::NodeArena;
///
/// let arena = NodeArena::new();
/// let id = arena.initialize_node_with_value(Some("payload")).unwrap();
///
/// let node = arena.read(id).unwrap();
/// assert_eq!(node.value(), Some(&"payload"));
/// assert!(node.is_leaf());
/// ```
pub struct NodeReadGuard<'a, P> {
    /// Node this guard locks.
    id: NodeId,
    /// Lock guard providing access to the node.
    lock: MappedRwLockReadGuard<'a, TreeNode<P>>,
}

impl<'a, P> NodeReadGuard<'a, P> {
    /// Called by `NodeArena::read()`.
    pub(crate) fn new(id: NodeId, lock: MappedRwLockReadGuard<'a, TreeNode<P>>) -> Self {
        Self { id, lock }
    }

    /// Get the node ID.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl<P> Deref for NodeReadGuard<'_, P> {
    type Target = TreeNode<P>;

    #[inline]
    fn deref(&self) -> &TreeNode<P> {
        &self.lock
    }
}

/// Guard for exclusive write access to a node.
///
/// Only one `NodeWriteGuard` can exist for a node at a time. Link fields
/// stay read-only through this guard; the payload can be changed.
pub struct NodeWriteGuard<'a, P> {
    /// Node this guard locks.
    id: NodeId,
    /// Lock guard providing access to the node.
    lock: MappedRwLockWriteGuard<'a, TreeNode<P>>,
}

impl<'a, P> NodeWriteGuard<'a, P> {
    /// Called by `NodeArena::write()`.
    pub(crate) fn new(id: NodeId, lock: MappedRwLockWriteGuard<'a, TreeNode<P>>) -> Self {
        Self { id, lock }
    }

    /// Get the node ID.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl<P> Deref for NodeWriteGuard<'_, P> {
    type Target = TreeNode<P>;

    #[inline]
    fn deref(&self) -> &TreeNode<P> {
        &self.lock
    }
}

impl<P> DerefMut for NodeWriteGuard<'_, P> {
    #[inline]
    fn deref_mut(&mut self) -> &mut TreeNode<P> {
        &mut self.lock
    }
}
