//! Insertion and leaf splitting.

use std::sync::atomic::Ordering as AtomicOrdering;

use tracing::debug;

use super::search::UpperNode;
use super::tree::{payload, payload_mut, BTree};
use crate::collections::ValueList;
use crate::common::{Comparator, Error, NodeId, Result, ResultExt};

/// Outcome of [`BTree::insert_value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion<T> {
    /// The value was stored at `index` of the values array.
    Inserted { index: usize },

    /// An equal value is already stored. `rejected` is the value that was
    /// passed in, handed back untouched.
    Existing { existing: T, rejected: T },
}

impl<T> Insertion<T> {
    /// Values array index of a fresh insertion.
    pub fn index(&self) -> Option<usize> {
        match self {
            Insertion::Inserted { index } => Some(*index),
            Insertion::Existing { .. } => None,
        }
    }

    /// Whether the value was stored.
    pub fn is_inserted(&self) -> bool {
        matches!(self, Insertion::Inserted { .. })
    }
}

impl<T: Clone> BTree<T> {
    /// Insert `value` in comparator order.
    ///
    /// If an equal value is stored already, nothing changes and the
    /// existing value comes back as [`Insertion::Existing`]. Otherwise the
    /// value goes into its leaf, the leaf is split if it has reached
    /// `max_values_per_node`, and the value is appended to the values array.
    ///
    /// # Errors
    /// - comparator failures; the tree is unchanged
    /// - `Error::Allocation` if a needed split cannot allocate its leaves;
    ///   the value is taken back out and the tree is unchanged
    pub fn insert_value<C>(&mut self, value: T, comparator: &C) -> Result<Insertion<T>>
    where
        C: Comparator<T> + ?Sized,
    {
        let (leaf, element) = match self.get_upper_node_by_value(&value, comparator)? {
            UpperNode::Found { node, element } => {
                let guard = self.arena.read(node)?;
                let existing = payload(node, &*guard)?.get(element).cloned().ok_or_else(|| {
                    Error::Corruption(format!("{} lost element {} during insert", node, element))
                })?;
                return Ok(Insertion::Existing {
                    existing,
                    rejected: value,
                });
            }
            UpperNode::InsertionPoint { node, element } => (node, element),
        };

        // The array slot the value will take once the insert succeeds
        let array_index = self.values.len();
        let len = {
            let mut guard = self.arena.write(leaf)?;
            let list = payload_mut(leaf, &mut *guard)?;
            list.insert_at(element, value.clone(), array_index)
                .with_context(|| format!("unable to insert into {}", leaf))?;
            list.len()
        };

        if len >= self.config.max_values_per_node {
            if let Err(err) = self.split_node(leaf) {
                let mut guard = self.arena.write(leaf)?;
                payload_mut(leaf, &mut *guard)?.remove(element)?;
                return Err(err.context(format!("unable to insert into {}", leaf)));
            }
        }

        let index = self.values.append(value);
        debug_assert_eq!(index, array_index);
        Ok(Insertion::Inserted { index })
    }

    /// Split leaf `node` into a branch over fresh leaves.
    ///
    /// The leaf's values are cut into chunks of `split_chunk_size`; each
    /// chunk becomes a new leaf child, and the last value of every chunk
    /// but the final one becomes a separator in `node`. `node` keeps its
    /// place in the tree. Returns `false`, changing nothing, when the
    /// values fit in a single chunk.
    ///
    /// The parent of `node` is not re-split, however many children it has.
    ///
    /// # Errors
    /// - `Error::InvalidState` if `node` is not a leaf
    /// - `Error::Allocation` if the new leaves cannot all be allocated; any
    ///   already allocated are freed and `node` is unchanged
    pub fn split_node(&self, node: NodeId) -> Result<bool> {
        let mut guard = self.arena.write(node)?;
        if !guard.is_leaf() {
            return Err(Error::InvalidState(format!(
                "{} has {} sub nodes and cannot be split",
                node,
                guard.child_count()
            )));
        }

        let chunk_size = self.config.split_chunk_size;
        let chunk_count = payload(node, &*guard)?.len().div_ceil(chunk_size);
        if chunk_count < 2 {
            return Ok(false);
        }

        let mut children = Vec::with_capacity(chunk_count);
        for _ in 0..chunk_count {
            match self.arena.initialize_node() {
                Ok(child) => children.push(child),
                Err(err) => {
                    for &child in &children {
                        if let Err(unwind) = self.arena.free_node(child, None) {
                            debug!(node = %child, error = %unwind, "unable to unwind split leaf");
                        }
                    }
                    return Err(err.context(format!("unable to split {}", node)));
                }
            }
        }

        let mut rest = std::mem::take(payload_mut(node, &mut *guard)?);
        let mut separators = ValueList::with_capacity(chunk_count - 1);
        for (position, &child) in children.iter().enumerate() {
            let tail = rest.split_off(chunk_size.min(rest.len()))?;
            let chunk = std::mem::replace(&mut rest, tail);
            if position + 1 < chunk_count {
                if let Some(last) = chunk.last_element() {
                    separators.append(last.value().clone(), last.array_index());
                }
            }
            self.arena.set_value(child, Some(chunk))?;
        }

        guard.set_value(Some(separators));
        self.arena
            .link_children_locked(&mut guard, &children)
            .with_context(|| format!("unable to link split leaves under {}", node))?;

        self.arena.stats().splits.fetch_add(1, AtomicOrdering::Relaxed);
        debug!(node = %node, leaves = chunk_count, chunk_size, "split leaf");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::BTreeConfig;
    use crate::common::NaturalOrder;

    #[test]
    fn test_insert_returns_array_index() {
        let mut tree = BTree::new(10).unwrap();
        assert_eq!(tree.insert_value(5, &NaturalOrder).unwrap().index(), Some(0));
        assert_eq!(tree.insert_value(3, &NaturalOrder).unwrap().index(), Some(1));
        assert_eq!(tree.leaf_values().unwrap(), vec![3, 5]);
    }

    #[test]
    fn test_leaf_entries_carry_array_index() {
        let mut tree = BTree::new(10).unwrap();
        for v in [50, 10, 30] {
            tree.insert_value(v, &NaturalOrder).unwrap();
        }
        let leaf = tree.arena().value(tree.root()).unwrap().unwrap();
        assert_eq!(leaf.as_slice(), &[10, 30, 50]);
        assert_eq!(leaf.array_indexes(), &[1, 2, 0]);
    }

    #[test]
    fn test_duplicate_returns_existing() {
        let mut tree = BTree::new(10).unwrap();
        tree.insert_value(5, &NaturalOrder).unwrap();

        let outcome = tree.insert_value(5, &NaturalOrder).unwrap();
        assert_eq!(
            outcome,
            Insertion::Existing {
                existing: 5,
                rejected: 5
            }
        );
        assert!(!outcome.is_inserted());
        assert_eq!(tree.values_array_len(), 1);
    }

    #[test]
    fn test_split_at_threshold() {
        let mut tree = BTree::new(100).unwrap();
        for v in 0..99 {
            tree.insert_value(v, &NaturalOrder).unwrap();
        }
        assert_eq!(tree.arena().number_of_sub_nodes(tree.root()).unwrap(), 0);

        tree.insert_value(99, &NaturalOrder).unwrap();
        let root = tree.root();
        assert_eq!(tree.arena().number_of_sub_nodes(root).unwrap(), 4);

        let separators = tree.arena().value(root).unwrap().unwrap();
        assert_eq!(separators.as_slice(), &[24, 49, 74]);
        assert_eq!(separators.array_indexes(), &[24, 49, 74]);
        assert_eq!(tree.stats().snapshot().splits, 1);
        assert_eq!(tree.leaf_values().unwrap(), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_uneven_last_chunk() {
        let tree = BTree::with_config(BTreeConfig::new(1000).with_split_chunk_size(4)).unwrap();
        {
            let mut root = tree.arena().write(tree.root()).unwrap();
            root.set_value(Some((0..10).zip(0..).collect()));
        }

        assert!(tree.split_node(tree.root()).unwrap());
        let leaves = tree.arena().leaf_node_list(tree.root()).unwrap();
        let sizes: Vec<_> = leaves.iter().map(ValueList::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        let separators = tree.arena().value(tree.root()).unwrap().unwrap();
        assert_eq!(separators.as_slice(), &[3, 7]);
        assert_eq!(separators.array_indexes(), &[3, 7]);
    }

    #[test]
    fn test_split_single_chunk_is_noop() {
        let mut tree = BTree::new(100).unwrap();
        for v in 0..25 {
            tree.insert_value(v, &NaturalOrder).unwrap();
        }
        assert!(!tree.split_node(tree.root()).unwrap());
        assert_eq!(tree.arena().number_of_sub_nodes(tree.root()).unwrap(), 0);
        assert_eq!(tree.stats().snapshot().splits, 0);
    }

    #[test]
    fn test_split_branch_rejected() {
        let mut tree = BTree::new(30).unwrap();
        for v in 0..30 {
            tree.insert_value(v, &NaturalOrder).unwrap();
        }
        assert!(matches!(
            tree.split_node(tree.root()),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_split_allocation_failure_rolls_back_insert() {
        // Root plus two leaves fit; a four-leaf split does not
        let config = BTreeConfig::new(100).with_node_capacity(3);
        let mut tree = BTree::with_config(config).unwrap();
        for v in 0..99 {
            tree.insert_value(v, &NaturalOrder).unwrap();
        }

        let err = tree.insert_value(99, &NaturalOrder).unwrap_err();
        assert!(matches!(err.root_cause(), Error::Allocation(_)));

        assert_eq!(tree.arena().number_of_sub_nodes(tree.root()).unwrap(), 0);
        assert_eq!(tree.leaf_values().unwrap(), (0..99).collect::<Vec<_>>());
        assert_eq!(tree.values_array_len(), 99);
        assert_eq!(tree.arena().live_nodes(), 1);
        assert_eq!(tree.get_value_by_value(&99, &NaturalOrder).unwrap(), None);
    }

    #[test]
    fn test_leaf_split_deepens_tree() {
        let mut tree = BTree::with_config(BTreeConfig::new(4).with_split_chunk_size(2)).unwrap();
        for v in 0..8 {
            tree.insert_value(v, &NaturalOrder).unwrap();
        }
        assert_eq!(tree.depth().unwrap(), 4);
        assert_eq!(tree.leaf_values().unwrap(), (0..8).collect::<Vec<_>>());
        for v in 0..8 {
            assert_eq!(tree.get_value_by_value(&v, &NaturalOrder).unwrap(), Some(v));
        }
    }
}
