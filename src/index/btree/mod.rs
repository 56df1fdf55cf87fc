//! B-tree engine over the node layer.
//!
//! Leaves hold values in comparator order; branches hold separators,
//! copies of the largest value under each child but the last. A leaf that
//! reaches `max_values_per_node` values splits in place into a branch over
//! fixed-size chunks. A leaf emptied by removal is unlinked, and a branch
//! left with one child collapses into it. There is no other rebalancing,
//! and a split never re-splits the parent, so depth is not bounded by
//! log(n).
//!
//! # Components
//! - [`BTree`] - The tree, its values array and configuration
//! - [`Insertion`] - Outcome of an insert: stored, or already present
//! - [`SubNodeMatch`] / [`UpperNode`] - Single-level and full descent results

mod insert;
mod remove;
mod search;
mod tree;
mod validate;

pub use insert::Insertion;
pub use search::{SubNodeMatch, UpperNode};
pub use tree::BTree;
