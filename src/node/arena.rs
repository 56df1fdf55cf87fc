//! Node Arena - storage and locking for tree nodes.
//!
//! The [`NodeArena`] provides:
//! - Slot allocation with a bounded capacity
//! - Generation-checked node handles
//! - Per-node reader/writer locks exposed as RAII guards
//! - Single-field accessors, each locking the node for one call
//!
//! Structural operations live in the `linkage` and `subtree` modules as
//! further `impl` blocks on the same type.

use std::sync::OnceLock;

use parking_lot::Mutex;
use tracing::trace;

use crate::common::config::{DEFAULT_NODE_CAPACITY, SEGMENT_SIZE};
use crate::common::{Error, NodeId, Result};
use crate::node::slot::NodeSlot;
use crate::node::{ArenaStats, NodeReadGuard, NodeWriteGuard, TreeNode};

/// Free-slot bookkeeping.
#[derive(Debug, Default)]
struct SlotAllocator {
    /// Released slot indexes (LIFO for cache locality).
    free_list: Vec<usize>,

    /// First index never handed out.
    next_fresh: usize,
}

/// Owns every node of one or more trees.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                        NodeArena<P>                         │
/// │  ┌──────────────────────────────────────────────────────┐  │
/// │  │ segments: [OnceLock<[NodeSlot; SEGMENT_SIZE]>]       │  │
/// │  │   [Seg0: Slot0 Slot1 ...] [Seg1: ...] [unallocated]  │  │
/// │  └──────────────────────────────────────────────────────┘  │
/// │  ┌──────────────┐  ┌──────────────┐                        │
/// │  │  allocator   │  │    stats     │                        │
/// │  │    Mutex     │  │   atomics    │                        │
/// │  └──────────────┘  └──────────────┘                        │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - `segments`: no lock, a segment is created once and its slots never move
/// - each `NodeSlot`: one `RwLock`, the node lock
/// - `allocator`: `Mutex`, touched only on allocate/release
/// - `stats`: all atomic counters
///
/// Operations that touch several nodes take their locks parent first, then
/// child, and never hold two sibling locks at once.
pub struct NodeArena<P> {
    segments: Box<[OnceLock<Box<[NodeSlot<P>]>>]>,
    allocator: Mutex<SlotAllocator>,
    capacity: usize,
    stats: ArenaStats,
}

impl<P> NodeArena<P> {
    /// Create an arena with the default capacity.
    pub fn new() -> Self {
        Self::build(DEFAULT_NODE_CAPACITY)
    }

    /// Create an arena that holds at most `capacity` live nodes.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` if `capacity` is 0 or does not fit a
    ///   `u32` index
    pub fn try_with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidArgument("node capacity must be > 0".into()));
        }
        if capacity > u32::MAX as usize {
            return Err(Error::InvalidArgument(format!(
                "node capacity {} does not fit a u32 index",
                capacity
            )));
        }
        Ok(Self::build(capacity))
    }

    /// `capacity` is already checked.
    fn build(capacity: usize) -> Self {
        let segment_count = capacity.div_ceil(SEGMENT_SIZE);
        let segments = (0..segment_count).map(|_| OnceLock::new()).collect();

        Self {
            segments,
            allocator: Mutex::new(SlotAllocator::default()),
            capacity,
            stats: ArenaStats::new(),
        }
    }

    // ========================================================================
    // Public API: Allocation
    // ========================================================================

    /// Allocate an unlinked node without payload.
    ///
    /// # Errors
    /// - `Error::Allocation` if the arena is full
    pub fn initialize_node(&self) -> Result<NodeId> {
        self.initialize_node_with_value(None)
    }

    /// Allocate an unlinked node carrying `value`.
    ///
    /// # Errors
    /// - `Error::Allocation` if the arena is full; `value` is dropped
    pub fn initialize_node_with_value(&self, value: Option<P>) -> Result<NodeId> {
        let index = self.allocate_index()?;
        let slot = self.slot_or_init(index);

        let generation = slot.occupy(TreeNode::new(value)).ok_or_else(|| {
            Error::Corruption(format!("slot {} handed out while occupied", index))
        })?;

        self.stats
            .nodes_allocated
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        // index < capacity <= u32::MAX
        let id = NodeId::new(index as u32, generation);
        trace!(node = %id, "allocated node");
        Ok(id)
    }

    // ========================================================================
    // Public API: Locking
    // ========================================================================

    /// Acquire a shared lock on a node.
    ///
    /// # Errors
    /// - `Error::StaleNode` if `id` does not name a live node
    pub fn read(&self, id: NodeId) -> Result<NodeReadGuard<'_, P>> {
        let lock = self.slot(id)?.read(id).ok_or(Error::StaleNode(id))?;
        Ok(NodeReadGuard::new(id, lock))
    }

    /// Acquire an exclusive lock on a node.
    ///
    /// # Errors
    /// - `Error::StaleNode` if `id` does not name a live node
    pub fn write(&self, id: NodeId) -> Result<NodeWriteGuard<'_, P>> {
        let lock = self.slot(id)?.write(id).ok_or(Error::StaleNode(id))?;
        Ok(NodeWriteGuard::new(id, lock))
    }

    /// Whether `id` names a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.read(id).is_ok()
    }

    // ========================================================================
    // Public API: Single-field accessors
    // ========================================================================

    /// Clone of the node's payload.
    pub fn value(&self, id: NodeId) -> Result<Option<P>>
    where
        P: Clone,
    {
        Ok(self.read(id)?.value().cloned())
    }

    /// Replace the node's payload, returning the previous one.
    pub fn set_value(&self, id: NodeId, value: Option<P>) -> Result<Option<P>> {
        Ok(self.write(id)?.set_value(value))
    }

    /// Take the node's payload out.
    pub fn take_value(&self, id: NodeId) -> Result<Option<P>> {
        Ok(self.write(id)?.take_value())
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.read(id)?.parent())
    }

    pub fn previous(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.read(id)?.previous())
    }

    pub fn next(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.read(id)?.next())
    }

    pub fn first_sub_node(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.read(id)?.first_child())
    }

    pub fn last_sub_node(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.read(id)?.last_child())
    }

    pub fn number_of_sub_nodes(&self, id: NodeId) -> Result<usize> {
        Ok(self.read(id)?.child_count())
    }

    pub(crate) fn set_parent(&self, id: NodeId, parent: Option<NodeId>) -> Result<()> {
        self.write(id)?.set_parent(parent);
        Ok(())
    }

    pub(crate) fn set_previous(&self, id: NodeId, previous: Option<NodeId>) -> Result<()> {
        self.write(id)?.set_previous(previous);
        Ok(())
    }

    pub(crate) fn set_next(&self, id: NodeId, next: Option<NodeId>) -> Result<()> {
        self.write(id)?.set_next(next);
        Ok(())
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    /// Get arena statistics.
    pub fn stats(&self) -> &ArenaStats {
        &self.stats
    }

    /// Maximum number of live nodes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live nodes.
    pub fn live_nodes(&self) -> usize {
        let allocator = self.allocator.lock();
        allocator.next_fresh - allocator.free_list.len()
    }

    // ========================================================================
    // Internal: Slot management
    // ========================================================================

    /// Take the node out of its slot and recycle the slot.
    ///
    /// Does not look at links; callers detach first.
    pub(crate) fn release(&self, id: NodeId) -> Result<TreeNode<P>> {
        let node = self.slot(id)?.release(id).ok_or(Error::StaleNode(id))?;

        self.allocator.lock().free_list.push(id.index());
        self.stats
            .nodes_freed
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        trace!(node = %id, "released node");
        Ok(node)
    }

    fn allocate_index(&self) -> Result<usize> {
        let mut allocator = self.allocator.lock();

        if let Some(index) = allocator.free_list.pop() {
            return Ok(index);
        }

        if allocator.next_fresh < self.capacity {
            let index = allocator.next_fresh;
            allocator.next_fresh += 1;
            return Ok(index);
        }

        self.stats
            .allocation_failures
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Err(Error::Allocation(format!(
            "node arena exhausted ({} nodes)",
            self.capacity
        )))
    }

    fn slot(&self, id: NodeId) -> Result<&NodeSlot<P>> {
        let index = id.index();
        self.segments
            .get(index / SEGMENT_SIZE)
            .and_then(OnceLock::get)
            .map(|segment| &segment[index % SEGMENT_SIZE])
            .ok_or(Error::StaleNode(id))
    }

    fn slot_or_init(&self, index: usize) -> &NodeSlot<P> {
        let segment = self.segments[index / SEGMENT_SIZE]
            .get_or_init(|| (0..SEGMENT_SIZE).map(|_| NodeSlot::new()).collect());
        &segment[index % SEGMENT_SIZE]
    }
}

impl<P> Default for NodeArena<P> {
    fn default() -> Self {
        Self::new()
    }
}
