//! Descent search: one level at a time, down to an exact match or the
//! leaf where a value would go.

use std::cmp::Ordering;

use tracing::{trace, warn};

use super::tree::{payload, BTree};
use crate::collections::ValueList;
use crate::common::{Comparator, Error, NodeId, Result, ResultExt};
use crate::node::TreeNode;

/// Outcome of comparing a value against one node's value list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubNodeMatch {
    /// The value equals element `element` of this node's list.
    Exact { element: usize },

    /// No exact match here. For a branch, `sub_node` is the child the
    /// value belongs under; for a leaf it is `None`. `element` is the
    /// first list element greater than the value (the list length if
    /// there is none).
    Descend {
        sub_node: Option<NodeId>,
        element: usize,
    },
}

/// Result of a full descent from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpperNode {
    /// `node` holds the value at `element`; `node` may be a branch holding
    /// a separator copy.
    Found { node: NodeId, element: usize },

    /// The value is absent; it would be inserted into leaf `node` at
    /// `element`.
    InsertionPoint { node: NodeId, element: usize },
}

impl UpperNode {
    /// Node the search stopped at.
    pub fn node(&self) -> NodeId {
        match *self {
            UpperNode::Found { node, .. } | UpperNode::InsertionPoint { node, .. } => node,
        }
    }

    /// Whether the value was found.
    pub fn is_found(&self) -> bool {
        matches!(self, UpperNode::Found { .. })
    }
}

/// Direction for [`BTree::neighbour_leaf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Side {
    Left,
    Right,
}

impl<T: Clone> BTree<T> {
    // ========================================================================
    // Public API: Search
    // ========================================================================

    /// Compare `value` against the value list of `node`.
    ///
    /// The list is walked in lock-step with the node's children: child `i`
    /// precedes separator `i`. `Equal` stops with an exact match, `Less`
    /// stops at the child before the separator, `Greater` moves on; running
    /// off the end selects the last child.
    ///
    /// # Errors
    /// - `Error::Corruption` if the node has children but not exactly one
    ///   more than its list has values
    /// - comparator failures
    pub fn get_sub_node_by_value<C>(
        &self,
        node: NodeId,
        value: &T,
        comparator: &C,
    ) -> Result<SubNodeMatch>
    where
        C: Comparator<T> + ?Sized,
    {
        let guard = self.arena.read(node)?;
        self.match_locked(node, &*guard, value, comparator)
    }

    /// Descend from the root to the node holding `value`, or to the leaf
    /// where it would be inserted.
    pub fn get_upper_node_by_value<C>(&self, value: &T, comparator: &C) -> Result<UpperNode>
    where
        C: Comparator<T> + ?Sized,
    {
        let mut current = self.root;
        loop {
            match self.get_sub_node_by_value(current, value, comparator)? {
                SubNodeMatch::Exact { element } => {
                    trace!(node = %current, element, "found value");
                    return Ok(UpperNode::Found {
                        node: current,
                        element,
                    });
                }
                SubNodeMatch::Descend {
                    sub_node: Some(child),
                    ..
                } => current = child,
                SubNodeMatch::Descend {
                    sub_node: None,
                    element,
                } => {
                    trace!(node = %current, element, "found insertion point");
                    return Ok(UpperNode::InsertionPoint {
                        node: current,
                        element,
                    });
                }
            }
        }
    }

    /// Look up the stored value equal to `value`.
    ///
    /// Returns `None` if there is none; that is not an error.
    pub fn get_value_by_value<C>(&self, value: &T, comparator: &C) -> Result<Option<T>>
    where
        C: Comparator<T> + ?Sized,
    {
        match self.get_upper_node_by_value(value, comparator)? {
            UpperNode::Found { node, element } => {
                let guard = self.arena.read(node)?;
                let found = payload(node, &*guard)?
                    .get(element)
                    .cloned()
                    .ok_or_else(|| {
                        Error::Corruption(format!("{} lost element {} during lookup", node, element))
                    })?;
                Ok(Some(found))
            }
            UpperNode::InsertionPoint { .. } => Ok(None),
        }
    }

    /// Whether the tree holds a value equal to `value`.
    pub fn contains_value<C>(&self, value: &T, comparator: &C) -> Result<bool>
    where
        C: Comparator<T> + ?Sized,
    {
        Ok(self.get_upper_node_by_value(value, comparator)?.is_found())
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// Leaf holding `value` and its position there.
    ///
    /// Unlike [`get_upper_node_by_value`](Self::get_upper_node_by_value),
    /// an exact match on a separator keeps descending into the child the
    /// separator bounds, since leaves keep every value.
    pub(super) fn find_leaf<C>(&self, value: &T, comparator: &C) -> Result<Option<(NodeId, usize)>>
    where
        C: Comparator<T> + ?Sized,
    {
        let mut current = self.root;
        loop {
            let (found, is_leaf) = {
                let guard = self.arena.read(current)?;
                let found = self.match_locked(current, &*guard, value, comparator)?;
                (found, guard.is_leaf())
            };
            current = match found {
                SubNodeMatch::Exact { element } if is_leaf => {
                    return Ok(Some((current, element)));
                }
                SubNodeMatch::Exact { element } => self
                    .arena
                    .sub_node_by_index(current, element)
                    .with_context(|| format!("unable to follow separator {} of {}", element, current))?,
                SubNodeMatch::Descend {
                    sub_node: Some(child),
                    ..
                } => child,
                SubNodeMatch::Descend { sub_node: None, .. } => return Ok(None),
            };
        }
    }

    /// Nearest leaf to the left or right of `leaf` in traversal order.
    pub(super) fn neighbour_leaf(&self, leaf: NodeId, side: Side) -> Result<Option<NodeId>> {
        let mut current = leaf;
        let sibling = loop {
            let sibling = match side {
                Side::Left => self.arena.previous(current)?,
                Side::Right => self.arena.next(current)?,
            };
            if let Some(sibling) = sibling {
                break sibling;
            }
            match self.arena.parent(current)? {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        };

        let mut current = sibling;
        loop {
            let child = match side {
                Side::Left => self.arena.last_sub_node(current)?,
                Side::Right => self.arena.first_sub_node(current)?,
            };
            match child {
                Some(child) => current = child,
                None => return Ok(Some(current)),
            }
        }
    }

    /// [`get_sub_node_by_value`](Self::get_sub_node_by_value) on a node the
    /// caller already holds locked.
    fn match_locked<C>(
        &self,
        id: NodeId,
        node: &TreeNode<ValueList<T>>,
        value: &T,
        comparator: &C,
    ) -> Result<SubNodeMatch>
    where
        C: Comparator<T> + ?Sized,
    {
        let list = payload(id, node)?;
        let child_count = node.child_count();
        if child_count != 0 && child_count != list.len() + 1 {
            warn!(node = %id, child_count, separators = list.len(), "separator count mismatch");
            return Err(Error::Corruption(format!(
                "{} has {} sub nodes for {} separators",
                id,
                child_count,
                list.len()
            )));
        }

        let mut child = node.first_child();
        let mut cursor = list.first_element();
        while let Some(element) = cursor {
            let position = element.position();
            let ordering = comparator
                .compare(value, element.value())
                .with_context(|| format!("unable to compare against element {} of {}", position, id))?;
            match ordering {
                Ordering::Equal => return Ok(SubNodeMatch::Exact { element: position }),
                Ordering::Less => {
                    return Ok(SubNodeMatch::Descend {
                        sub_node: child,
                        element: position,
                    })
                }
                Ordering::Greater => {
                    if let Some(current) = child {
                        child = self.arena.next(current)?;
                    }
                }
            }
            cursor = element.next();
        }

        Ok(SubNodeMatch::Descend {
            sub_node: child,
            element: list.len(),
        })
    }
}
