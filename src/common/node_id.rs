//! Node handle type.

use std::fmt;

/// Identifies a node in a [`NodeArena`](crate::node::NodeArena).
///
/// `index` addresses the arena slot, `generation` counts how many times
/// that slot has been reused. A handle kept past `free_node` no longer
/// matches its slot's generation and is rejected instead of silently
/// aliasing whatever node reuses the slot.
///
/// # Example
/// ```
/// use arbortree::NodeId;
///
/// let id = NodeId::new(5, 0);
/// assert_eq!(id.index(), 5);
/// assert_eq!(id.to_string(), "Node(5@0)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Create a new NodeId.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        NodeId { index, generation }
    }

    /// Slot index inside the arena.
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Generation of the slot this handle was issued for.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({}@{})", self.index, self.generation)
    }
}
