//! Common types and utilities shared across arbortree.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`BTreeConfig`](config::BTreeConfig)
//! - Error types
//! - Node handles ([`NodeId`])
//! - The [`Comparator`] capability

pub mod compare;
pub mod config;
pub mod error;
mod node_id;

pub use compare::{Comparator, DerefOrder, NaturalOrder};
pub use error::{Error, ErrorKind, Result, ResultExt};
pub use node_id::NodeId;
