//! Replacing and removing values.
//!
//! Separators are copies of leaf values, so both operations finish by
//! walking the parent chain and rewriting every copy of the value they
//! touched. That walk is not transactional: a failure part way up leaves
//! the separators above it stale.

use std::cmp::Ordering;

use tracing::debug;

use super::search::Side;
use super::tree::{payload, payload_mut, BTree};
use crate::common::{Comparator, Error, NodeId, Result, ResultExt};

impl<T: Clone> BTree<T> {
    /// Replace the stored value equal to `old` with `new`, returning the
    /// value that was stored.
    ///
    /// `new` takes `old`'s place in the leaf, in the values array and in
    /// every separator copying it, so it must sort strictly between `old`'s
    /// in-order neighbours.
    ///
    /// # Errors
    /// - `Error::ValueMissing` if no value equals `old`
    /// - `Error::InvalidArgument` if `new` would break the ordering; the
    ///   tree is unchanged
    /// - comparator failures
    pub fn replace_value<C>(&mut self, old: &T, new: T, comparator: &C) -> Result<T>
    where
        C: Comparator<T> + ?Sized,
    {
        let (leaf, element) = self
            .find_leaf(old, comparator)?
            .ok_or_else(|| Error::ValueMissing("value to replace is not in the tree".into()))?;

        let (previous, next, array_index, is_leaf_max) = {
            let guard = self.arena.read(leaf)?;
            let current = payload(leaf, &*guard)?.element(element)?;
            (
                current.previous().map(|e| e.value().clone()),
                current.next().map(|e| e.value().clone()),
                current.array_index(),
                current.is_last(),
            )
        };
        let previous = match previous {
            Some(value) => Some(value),
            None => self.edge_value(leaf, Side::Left)?,
        };
        let next = match next {
            Some(value) => Some(value),
            None => self.edge_value(leaf, Side::Right)?,
        };

        if let Some(previous) = &previous {
            if comparator.compare(&new, previous)? != Ordering::Greater {
                return Err(Error::InvalidArgument(
                    "replacement does not sort after the preceding value".into(),
                ));
            }
        }
        if let Some(next) = &next {
            if comparator.compare(&new, next)? != Ordering::Less {
                return Err(Error::InvalidArgument(
                    "replacement does not sort before the following value".into(),
                ));
            }
        }

        let replaced = {
            let mut guard = self.arena.write(leaf)?;
            payload_mut(leaf, &mut *guard)?.replace(element, new.clone())?
        };
        self.values.set(array_index, Some(new.clone()))?;

        if is_leaf_max {
            let parent = self.arena.parent(leaf)?;
            self.replace_separators(parent, array_index, &new, array_index)
                .context("unable to update separators after replace")?;
        }
        Ok(replaced)
    }

    /// Remove the stored value equal to `value` and return it.
    ///
    /// Returns `None` if there is no such value; that is not an error.
    ///
    /// A leaf left empty is unlinked from its parent together with the
    /// separator bounding it. A parent left with a single child collapses
    /// into it. Leaves that merely shrink are left alone.
    ///
    /// # Errors
    /// - comparator failures
    /// - `Error::Corruption` if the tree and the values array disagree
    pub fn remove_value<C>(&mut self, value: &T, comparator: &C) -> Result<Option<T>>
    where
        C: Comparator<T> + ?Sized,
    {
        let Some((leaf, element)) = self.find_leaf(value, comparator)? else {
            return Ok(None);
        };

        let (removed, array_index, new_max, was_leaf_max, now_empty) = {
            let mut guard = self.arena.write(leaf)?;
            let list = payload_mut(leaf, &mut *guard)?;
            let was_leaf_max = element + 1 == list.len();
            let (removed, array_index) = list.remove(element)?;
            let new_max = list
                .last_element()
                .map(|last| (last.value().clone(), last.array_index()));
            (removed, array_index, new_max, was_leaf_max, list.is_empty())
        };
        if self.values.set(array_index, None)?.is_none() {
            return Err(Error::Corruption(format!(
                "values array entry {} of a stored value is empty",
                array_index
            )));
        }

        if now_empty && leaf != self.root {
            let (parent, replacement) = self
                .unlink_empty_leaf(leaf)
                .context("unable to unlink emptied leaf")?;
            if let Some((replacement, replacement_index)) = replacement {
                self.replace_separators(Some(parent), array_index, &replacement, replacement_index)
                    .context("unable to update separators after remove")?;
            }
            if self.arena.number_of_sub_nodes(parent)? == 1 {
                self.arena
                    .collapse_into_only_child(parent)
                    .with_context(|| format!("unable to collapse {}", parent))?;
            }
        } else if was_leaf_max {
            if let Some((new_max, new_max_index)) = new_max {
                let parent = self.arena.parent(leaf)?;
                self.replace_separators(parent, array_index, &new_max, new_max_index)
                    .context("unable to update separators after remove")?;
            }
        }

        Ok(Some(removed))
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// Unlink and free an empty, non-root leaf along with the separator
    /// next to it.
    ///
    /// A leaf is bounded above by separator `i`; the last child has no
    /// such separator, so the one below it goes instead and becomes the
    /// parent subtree's new maximum. Returns the parent and, in that case,
    /// the removed separator with its array index.
    fn unlink_empty_leaf(&self, leaf: NodeId) -> Result<(NodeId, Option<(T, usize)>)> {
        let parent = self
            .arena
            .parent(leaf)?
            .ok_or_else(|| Error::InvalidState(format!("{} has no parent", leaf)))?;
        let siblings = self.arena.sub_nodes(parent)?;
        let position = siblings
            .iter()
            .position(|&child| child == leaf)
            .ok_or_else(|| Error::Corruption(format!("{} is not listed under {}", leaf, parent)))?;
        let is_last = position + 1 == siblings.len();

        let separator = {
            let mut guard = self.arena.write(parent)?;
            let separators = payload_mut(parent, &mut *guard)?;
            let bounding = if is_last { position.checked_sub(1) } else { Some(position) };
            let bounding = bounding.ok_or_else(|| {
                Error::Corruption(format!("{} is a branch with a single sub node", parent))
            })?;
            separators.remove(bounding)?
        };

        self.arena.remove_node(parent, leaf)?;
        self.arena.free_node(leaf, None)?;
        debug!(leaf = %leaf, parent = %parent, "unlinked empty leaf");

        Ok((parent, is_last.then_some(separator)))
    }

    /// Rewrite separator copies of the value stored under `old_index` as
    /// `new` (stored under `new_index`), from `from` up to the root.
    /// Returns how many were rewritten.
    fn replace_separators(
        &self,
        from: Option<NodeId>,
        old_index: usize,
        new: &T,
        new_index: usize,
    ) -> Result<usize> {
        let mut replaced = 0;
        let mut current = from;
        while let Some(node) = current {
            let mut guard = self.arena.write(node)?;
            let separators = payload_mut(node, &mut *guard)?;
            if let Some(position) = separators.position_of_index(old_index) {
                separators.set(position, new.clone(), new_index)?;
                replaced += 1;
            }
            current = guard.parent();
        }
        Ok(replaced)
    }

    /// Outermost value of the leaf beside `leaf`: the last value of the
    /// left neighbour, or the first of the right one.
    fn edge_value(&self, leaf: NodeId, side: Side) -> Result<Option<T>> {
        let Some(neighbour) = self.neighbour_leaf(leaf, side)? else {
            return Ok(None);
        };
        let guard = self.arena.read(neighbour)?;
        let list = payload(neighbour, &*guard)?;
        let edge = match side {
            Side::Left => list.last_element(),
            Side::Right => list.first_element(),
        };
        Ok(edge.map(|element| element.value().clone()))
    }
}
