//! arbortree - A generic B-tree over thread-safe n-ary tree nodes.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            arbortree                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               B-Tree (index/btree/)                      │   │
//! │  │   search → insert + split → replace / remove + collapse  │   │
//! │  │          ValuesArray: positional mirror of values        │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Tree Node layer (node/)                    │   │
//! │  │   NodeArena: segmented slots, one RwLock per node        │   │
//! │  │   append | ordered insert | replace | remove | clone     │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │        Collections (collections/) + common/              │   │
//! │  │   ValueList, ValuesArray, Comparator, Error, NodeId      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (NodeId, Error, Comparator, config)
//! - [`collections`] - Value lists and the values array
//! - [`node`] - Arena-backed tree nodes and their structural operations
//! - [`index`] - The B-tree
//!
//! # Quick Start
//! ```
//! use std::sync::Arc;
//! use arbortree::{BTree, DerefOrder};
//!
//! let mut tree = BTree::new(100).unwrap();
//! let three = Arc::new(3);
//! for v in [Arc::new(5), three.clone(), Arc::new(8), Arc::new(1)] {
//!     tree.insert_value(v, &DerefOrder).unwrap();
//! }
//!
//! let found = tree.get_value_by_value(&Arc::new(3), &DerefOrder).unwrap().unwrap();
//! assert!(Arc::ptr_eq(&found, &three));
//! assert!(tree.get_value_by_value(&Arc::new(99), &DerefOrder).unwrap().is_none());
//! ```
//!
//! # Logging
//! Structural events are emitted through `tracing`; install a subscriber
//! to see them.

pub mod collections;
pub mod common;
pub mod index;
pub mod node;

// Re-export commonly used items at crate root for convenience
pub use common::config::{BTreeConfig, DEFAULT_SPLIT_CHUNK_SIZE};
pub use common::{Comparator, DerefOrder, Error, ErrorKind, NaturalOrder, NodeId, Result, ResultExt};

pub use collections::{Element, ValueList, ValuesArray};
pub use index::{BTree, Insertion, SubNodeMatch, UpperNode};
pub use node::{ArenaStats, NodeArena, NodeReadGuard, NodeWriteGuard, StatsSnapshot, TreeNode};
