//! Configuration constants and tree settings.

use crate::common::{Error, Result};

/// Number of values moved into each fresh leaf when a leaf splits.
///
/// Independent of the per-node threshold: a leaf holding 100 values splits
/// into 4 leaves, one holding 60 values into 3 (25 + 25 + 10).
pub const DEFAULT_SPLIT_CHUNK_SIZE: usize = 25;

/// Number of slots allocated together when the node arena grows.
///
/// Slots inside a segment never move, so node locks can be handed out as
/// plain borrowed guards.
pub const SEGMENT_SIZE: usize = 256;

/// Default maximum number of live nodes in one arena.
///
/// With the default split chunk this addresses tens of millions of values.
/// Only the segment table is allocated upfront (`DEFAULT_NODE_CAPACITY / SEGMENT_SIZE`
/// pointers).
pub const DEFAULT_NODE_CAPACITY: usize = 1 << 20;

/// Settings fixed at B-tree construction.
///
/// # Example
/// ```
/// use arbortree::BTreeConfig;
///
/// let config = BTreeConfig::new(64).with_split_chunk_size(16);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.split_chunk_size, 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BTreeConfig {
    /// A leaf holding this many values is split.
    pub max_values_per_node: usize,

    /// Values per fresh leaf when splitting.
    pub split_chunk_size: usize,

    /// Maximum number of live nodes; allocation beyond it fails.
    pub node_capacity: usize,
}

impl BTreeConfig {
    /// Create a config with the default chunk size and node capacity.
    pub fn new(max_values_per_node: usize) -> Self {
        Self {
            max_values_per_node,
            split_chunk_size: DEFAULT_SPLIT_CHUNK_SIZE,
            node_capacity: DEFAULT_NODE_CAPACITY,
        }
    }

    /// Override the split chunk size.
    pub fn with_split_chunk_size(mut self, split_chunk_size: usize) -> Self {
        self.split_chunk_size = split_chunk_size;
        self
    }

    /// Override the node capacity.
    pub fn with_node_capacity(mut self, node_capacity: usize) -> Self {
        self.node_capacity = node_capacity;
        self
    }

    /// Check that every setting is usable.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if any setting is zero, or `node_capacity`
    /// does not fit a node index.
    pub fn validate(&self) -> Result<()> {
        if self.max_values_per_node == 0 {
            return Err(Error::InvalidArgument(
                "max_values_per_node must be > 0".into(),
            ));
        }
        if self.split_chunk_size == 0 {
            return Err(Error::InvalidArgument("split_chunk_size must be > 0".into()));
        }
        if self.node_capacity == 0 || self.node_capacity > u32::MAX as usize {
            return Err(Error::InvalidArgument(format!(
                "node_capacity must be in 1..={}",
                u32::MAX
            )));
        }
        Ok(())
    }
}
