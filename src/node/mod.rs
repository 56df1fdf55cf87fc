//! Thread-safe n-ary tree nodes.
//!
//! The node layer stores nodes in an arena and links them by handle:
//! parent, previous/next sibling and first/last child. Each node has its
//! own reader/writer lock.
//!
//! # Components
//! - [`NodeArena`] - Owns the nodes; allocation, accessors and structural operations
//! - [`TreeNode`] - The fields of one node
//! - [`NodeReadGuard`] / [`NodeWriteGuard`] - RAII guards for node access
//! - [`ArenaStats`] - Allocation and structural statistics
//!
//! # Example
//! ```
//! use arbortree::node::NodeArena;
//! use arbortree::NaturalOrder;
//!
//! let arena = NodeArena::new();
//! let root = arena.initialize_node_with_value(Some(0)).unwrap();
//! for v in [3, 1, 2] {
//!     let child = arena.initialize_node_with_value(Some(v)).unwrap();
//!     arena.insert_node(root, child, &NaturalOrder, true).unwrap();
//! }
//!
//! assert_eq!(arena.leaf_node_list(root).unwrap(), vec![1, 2, 3]);
//! arena.free_node(root, None).unwrap();
//! ```

mod arena;
mod guard;
mod linkage;
mod slot;
mod stats;
mod subtree;
mod tree_node;

pub use arena::NodeArena;
pub use guard::{NodeReadGuard, NodeWriteGuard};
pub use stats::{ArenaStats, StatsSnapshot};
pub use tree_node::TreeNode;
