//! Ordered index structures built on the node layer.

pub mod btree;

pub use btree::{BTree, Insertion, SubNodeMatch, UpperNode};
