//! Containers the tree layers are built from.
//!
//! - [`ValueList`] - ordered values tagged with their array index, with
//!   [`Element`] handles (node payloads)
//! - [`ValuesArray`] - positional mirror of every value in a B-tree

mod value_list;
mod values_array;

pub use value_list::{Element, ValueList};
pub use values_array::ValuesArray;
