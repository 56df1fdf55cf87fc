//! BTree - construction, lifecycle and positional access.

use tracing::debug;

use crate::collections::{ValueList, ValuesArray};
use crate::common::config::BTreeConfig;
use crate::common::{Error, NodeId, Result, ResultExt};
use crate::node::{ArenaStats, NodeArena, TreeNode};

/// An ordered, searchable collection of values.
///
/// Values live in the leaves of a tree of [`NodeArena`] nodes; branches
/// hold separator copies of boundary values. A flat [`ValuesArray`]
/// mirrors every value for O(1) positional access.
///
/// # Architecture
/// ```text
///                 root (branch)
///            values: [s0, s1, s2]
///        ┌───────┬──────┴──┬─────────┐
///      leaf0   leaf1     leaf2     leaf3
///     (≤ s0)  (≤ s1)    (≤ s2)    (> s2)
///
///   values array: [v7, v2, ∅, v9, ...]   (insertion order, holes after removal)
/// ```
///
/// Child `i` of a branch holds values up to and including separator `i`;
/// the last child holds everything greater than the last separator.
///
/// # Thread Safety
/// Each node has its own lock and reads (`&self`) only compose per-node
/// read locks, so a `BTree` can be searched from many threads at once.
/// Mutation takes `&mut self`: the values array is not separately locked.
/// A reader sharing the node arena through other means may observe a tree
/// mid-split.
///
/// # Example
/// ```
/// use arbortree::{BTree, Insertion, NaturalOrder};
///
/// let mut tree = BTree::new(100).unwrap();
/// for v in [5, 3, 8, 1] {
///     tree.insert_value(v, &NaturalOrder).unwrap();
/// }
///
/// assert_eq!(tree.get_value_by_value(&3, &NaturalOrder).unwrap(), Some(3));
/// assert_eq!(tree.get_value_by_value(&99, &NaturalOrder).unwrap(), None);
/// assert!(matches!(
///     tree.insert_value(3, &NaturalOrder).unwrap(),
///     Insertion::Existing { .. }
/// ));
/// assert_eq!(tree.leaf_values().unwrap(), vec![1, 3, 5, 8]);
/// ```
pub struct BTree<T> {
    /// Every node of the tree.
    pub(super) arena: NodeArena<ValueList<T>>,

    /// Root node. Stays the same node for the tree's lifetime.
    pub(super) root: NodeId,

    /// Positional mirror of every value.
    pub(super) values: ValuesArray<T>,

    /// Settings fixed at construction.
    pub(super) config: BTreeConfig,
}

impl<T: Clone> BTree<T> {
    /// Create an empty tree that splits leaves holding
    /// `max_values_per_node` values.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` if `max_values_per_node` is 0
    pub fn new(max_values_per_node: usize) -> Result<Self> {
        Self::with_config(BTreeConfig::new(max_values_per_node))
    }

    /// Create an empty tree with explicit settings.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` if a setting is 0
    /// - `Error::Allocation` if the root node cannot be allocated
    pub fn with_config(config: BTreeConfig) -> Result<Self> {
        config.validate()?;

        let arena = NodeArena::try_with_capacity(config.node_capacity)?;
        let root = arena
            .initialize_node_with_value(Some(ValueList::new()))
            .context("unable to create root node")?;

        Ok(Self {
            arena,
            root,
            values: ValuesArray::new(),
            config,
        })
    }

    /// Free the tree.
    ///
    /// Every value is handed to `value_free` exactly once; without one,
    /// values are dropped. Separator copies and the values array are
    /// dropped without being passed on.
    pub fn free(self, value_free: Option<&mut dyn FnMut(T)>) -> Result<()> {
        let mut drop_value = |_: T| {};
        let free: &mut dyn FnMut(T) = match value_free {
            Some(free) => free,
            None => &mut drop_value,
        };

        for id in self.arena.subtree_ids(self.root)? {
            let mut node = self.arena.write(id)?;
            if !node.is_leaf() {
                node.set_value(Some(ValueList::new()));
            }
        }

        let mut free_list = |list: ValueList<T>| list.into_iter().for_each(&mut *free);
        self.arena
            .free_node(self.root, Some(&mut free_list))
            .context("unable to free tree nodes")?;

        debug!(values = self.values.live_count(), "freed tree");
        Ok(())
    }

    /// Deep-copy the tree, copying every value with `value_clone`.
    ///
    /// `value_clone` runs once per stored value. The copy's leaf, its
    /// separator copies and its values array entry are all clones of that
    /// one result. Indexes are preserved.
    ///
    /// # Errors
    /// - `value_clone` failures; every copy made so far is dropped
    /// - `Error::Allocation` if the copy's nodes cannot be allocated
    /// - `Error::Corruption` if a node refers to an array entry that is
    ///   not live
    pub fn try_clone(&self, value_clone: &mut dyn FnMut(&T) -> Result<T>) -> Result<Self> {
        let mut copies: Vec<Option<T>> = (0..self.values.len()).map(|_| None).collect();

        let arena = NodeArena::try_with_capacity(self.config.node_capacity)?;
        let root = self
            .arena
            .clone_subtree_into(
                self.root,
                &arena,
                &mut |list: &ValueList<T>| -> Result<ValueList<T>> {
                    list.entries()
                        .map(|(value, index)| {
                            let copy = match copies.get_mut(index) {
                                Some(Some(copy)) => copy.clone(),
                                Some(slot) => {
                                    let copy = value_clone(value)?;
                                    *slot = Some(copy.clone());
                                    copy
                                }
                                None => {
                                    return Err(Error::Corruption(format!(
                                        "array index {} out of range",
                                        index
                                    )))
                                }
                            };
                            Ok((copy, index))
                        })
                        .collect()
                },
                None,
            )
            .context("unable to clone tree")?;

        let values: ValuesArray<T> = copies.into_iter().collect();
        let live_match = self
            .values
            .iter()
            .all(|(index, _)| matches!(values.get(index), Ok(Some(_))));
        if !live_match || values.live_count() != self.values.live_count() {
            arena.free_node(root, None)?;
            return Err(Error::Corruption("tree nodes and values array disagree".into()));
        }

        debug!(values = values.live_count(), nodes = arena.live_nodes(), "cloned tree");
        Ok(Self {
            arena,
            root,
            values,
            config: self.config,
        })
    }

    // ========================================================================
    // Public API: Positional access
    // ========================================================================

    /// Value stored at `index` of the values array.
    ///
    /// Returns `None` for a removed value.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` if `index` was never handed out
    pub fn get_value_by_index(&self, index: usize) -> Result<Option<T>> {
        Ok(self.values.get(index)?.cloned())
    }

    /// Number of values in the tree.
    pub fn number_of_values(&self) -> usize {
        self.values.live_count()
    }

    /// Length of the values array, removed entries included.
    pub fn values_array_len(&self) -> usize {
        self.values.len()
    }

    /// Whether the tree holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.live_count() == 0
    }

    /// Live values array entries with their indexes.
    pub fn iter_values(&self) -> impl Iterator<Item = (usize, &T)> {
        self.values.iter()
    }

    /// Every value, in order, read from the leaves.
    pub fn leaf_values(&self) -> Result<Vec<T>> {
        let mut values = Vec::with_capacity(self.values.live_count());
        self.arena.visit_leaves(self.root, |id, node| {
            values.extend(payload(id, node)?.iter().cloned());
            Ok(())
        })?;
        Ok(values)
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    /// Root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node storage, for inspecting the tree's shape.
    pub fn arena(&self) -> &NodeArena<ValueList<T>> {
        &self.arena
    }

    /// Settings the tree was built with.
    pub fn config(&self) -> &BTreeConfig {
        &self.config
    }

    /// Node and structural statistics.
    pub fn stats(&self) -> &ArenaStats {
        self.arena.stats()
    }

    /// Number of levels from the root to the deepest leaf.
    pub fn depth(&self) -> Result<usize> {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 1)];
        while let Some((id, level)) = stack.pop() {
            deepest = deepest.max(level);
            for child in self.arena.sub_nodes(id)? {
                stack.push((child, level + 1));
            }
        }
        Ok(deepest)
    }
}

/// The value list of a locked node.
pub(super) fn payload<T>(id: NodeId, node: &TreeNode<ValueList<T>>) -> Result<&ValueList<T>> {
    node.value()
        .ok_or_else(|| Error::Corruption(format!("{} has no value list", id)))
}

/// The value list of a locked node, mutably.
pub(super) fn payload_mut<T>(
    id: NodeId,
    node: &mut TreeNode<ValueList<T>>,
) -> Result<&mut ValueList<T>> {
    node.value_mut()
        .ok_or_else(|| Error::Corruption(format!("{} has no value list", id)))
}
