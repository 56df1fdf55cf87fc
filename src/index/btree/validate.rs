//! Structural validation.

use std::cmp::Ordering;

use tracing::warn;

use super::tree::{payload, BTree};
use crate::common::{Comparator, Error, NodeId, Result};

/// Value range a subtree must stay within.
struct Bounds<T> {
    /// Every value must sort after this one.
    lower: Option<T>,

    /// Every value must sort at or before this one.
    upper: Option<T>,

    /// Array index carried by `upper`.
    upper_index: Option<usize>,

    /// `upper` is a separator and must equal the subtree's largest value.
    exact_upper: bool,
}

impl<T: Clone> BTree<T> {
    /// Check every structural property of the tree.
    ///
    /// - a branch has exactly one more child than separators, and every
    ///   child points back at it
    /// - values in each list are strictly increasing
    /// - child `i` holds values after separator `i - 1` and up to separator
    ///   `i`, whose value is that child's largest
    /// - only the root may be an empty leaf
    /// - every leaf value points at its own live values array entry, and
    ///   every separator carries the array index of the value it copies
    /// - the leaves and the values array hold the same values
    ///
    /// # Errors
    /// - `Error::Corruption` describing the first violation found
    /// - comparator failures
    pub fn validate<C>(&self, comparator: &C) -> Result<()>
    where
        C: Comparator<T> + ?Sized,
    {
        let mut leaf_values = 0;
        let mut seen = vec![false; self.values.len()];
        let mut stack = vec![(
            self.root,
            Bounds {
                lower: None,
                upper: None,
                upper_index: None,
                exact_upper: false,
            },
        )];

        while let Some((id, bounds)) = stack.pop() {
            let node = self.arena.read(id)?;
            let list = payload(id, &*node)?;
            check_increasing(id, list.as_slice(), comparator)?;

            if node.is_leaf() {
                if list.is_empty() && id != self.root {
                    return Err(corruption(format!("{} is an empty leaf", id)));
                }
                check_bounds(id, list.as_slice(), &bounds, true, comparator)?;
                if bounds.exact_upper && list.array_indexes().last() != bounds.upper_index.as_ref() {
                    return Err(corruption(format!(
                        "{} ends on a different array entry than its separator",
                        id
                    )));
                }
                for (value, index) in list.entries() {
                    self.check_array_entry(id, value, index, &mut seen, comparator)?;
                }
                leaf_values += list.len();
                continue;
            }

            let children = self.arena.children_of(&*node)?;
            if children.len() != list.len() + 1 {
                return Err(corruption(format!(
                    "{} has {} sub nodes for {} separators",
                    id,
                    children.len(),
                    list.len()
                )));
            }
            check_bounds(id, list.as_slice(), &bounds, false, comparator)?;

            for (position, &child) in children.iter().enumerate().rev() {
                if self.arena.parent(child)? != Some(id) {
                    return Err(corruption(format!("{} does not point back at {}", child, id)));
                }
                let lower = match position {
                    0 => bounds.lower.clone(),
                    _ => list.get(position - 1).cloned(),
                };
                let child_bounds = match list.get(position) {
                    Some(separator) => Bounds {
                        lower,
                        upper: Some(separator.clone()),
                        upper_index: list.array_index(position),
                        exact_upper: true,
                    },
                    None => Bounds {
                        lower,
                        upper: bounds.upper.clone(),
                        upper_index: bounds.upper_index,
                        exact_upper: bounds.exact_upper,
                    },
                };
                stack.push((child, child_bounds));
            }
        }

        if leaf_values != self.values.live_count() {
            return Err(corruption(format!(
                "leaves hold {} values, values array {}",
                leaf_values,
                self.values.live_count()
            )));
        }
        Ok(())
    }

    /// Check that leaf `id`'s `value` is the live array entry `index`, and
    /// that no other leaf value claimed that entry.
    fn check_array_entry<C>(
        &self,
        id: NodeId,
        value: &T,
        index: usize,
        seen: &mut [bool],
        comparator: &C,
    ) -> Result<()>
    where
        C: Comparator<T> + ?Sized,
    {
        let stored = match self.values.get(index) {
            Ok(Some(stored)) => stored,
            _ => {
                return Err(corruption(format!(
                    "{} points at array entry {}, which is not live",
                    id, index
                )));
            }
        };
        if comparator.compare(value, stored)? != Ordering::Equal {
            return Err(corruption(format!(
                "{} and array entry {} hold different values",
                id, index
            )));
        }
        if std::mem::replace(&mut seen[index], true) {
            return Err(corruption(format!("array entry {} is claimed twice", index)));
        }
        Ok(())
    }
}

fn check_increasing<T, C>(id: NodeId, values: &[T], comparator: &C) -> Result<()>
where
    C: Comparator<T> + ?Sized,
{
    for (position, pair) in values.windows(2).enumerate() {
        if comparator.compare(&pair[0], &pair[1])? != Ordering::Less {
            return Err(corruption(format!(
                "{} is out of order at element {}",
                id,
                position + 1
            )));
        }
    }
    Ok(())
}

/// Check `values` against `bounds`. Only a leaf has to reach an exact
/// upper bound; a branch's separators merely stay within it.
fn check_bounds<T, C>(
    id: NodeId,
    values: &[T],
    bounds: &Bounds<T>,
    is_leaf: bool,
    comparator: &C,
) -> Result<()>
where
    C: Comparator<T> + ?Sized,
{
    if let (Some(lower), Some(first)) = (&bounds.lower, values.first()) {
        if comparator.compare(first, lower)? != Ordering::Greater {
            return Err(corruption(format!("{} holds a value below its range", id)));
        }
    }
    if let (Some(upper), Some(last)) = (&bounds.upper, values.last()) {
        match comparator.compare(last, upper)? {
            Ordering::Greater => {
                return Err(corruption(format!("{} holds a value above its range", id)));
            }
            Ordering::Less if is_leaf && bounds.exact_upper => {
                return Err(corruption(format!(
                    "{} ends below the separator bounding it",
                    id
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

fn corruption(message: String) -> Error {
    warn!(%message, "tree validation failed");
    Error::Corruption(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::BTreeConfig;
    use crate::common::NaturalOrder;

    fn tree() -> BTree<i32> {
        let mut tree = BTree::with_config(BTreeConfig::new(4).with_split_chunk_size(2)).unwrap();
        for v in 0..8 {
            tree.insert_value(v, &NaturalOrder).unwrap();
        }
        tree
    }

    #[test]
    fn test_valid_tree() {
        tree().validate(&NaturalOrder).unwrap();
        BTree::<i32>::new(5).unwrap().validate(&NaturalOrder).unwrap();
    }

    #[test]
    fn test_detects_misordered_leaf() {
        let tree = tree();
        let first = tree.arena().leaf_node_ids(tree.root()).unwrap()[0];
        tree.arena()
            .write(first)
            .unwrap()
            .value_mut()
            .unwrap()
            .replace(0, 50)
            .unwrap();

        assert!(matches!(tree.validate(&NaturalOrder), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_detects_stale_separator() {
        let tree = tree();
        tree.arena()
            .write(tree.root())
            .unwrap()
            .value_mut()
            .unwrap()
            .replace(0, 0)
            .unwrap();

        assert!(matches!(tree.validate(&NaturalOrder), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_detects_separator_above_leaf_max() {
        let tree = tree();
        tree.arena()
            .write(tree.root())
            .unwrap()
            .value_mut()
            .unwrap()
            .replace(0, 2)
            .unwrap();

        // [0, 1] no longer reaches its separator, and [2, 3] starts on it
        assert!(matches!(tree.validate(&NaturalOrder), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_detects_wrong_array_index_in_leaf() {
        let tree = tree();
        let first = tree.arena().leaf_node_ids(tree.root()).unwrap()[0];
        tree.arena()
            .write(first)
            .unwrap()
            .value_mut()
            .unwrap()
            .set(0, 0, 5)
            .unwrap();

        assert!(matches!(tree.validate(&NaturalOrder), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_detects_separator_with_wrong_array_index() {
        let tree = tree();
        tree.arena()
            .write(tree.root())
            .unwrap()
            .value_mut()
            .unwrap()
            .set(0, 1, 0)
            .unwrap();

        assert!(matches!(tree.validate(&NaturalOrder), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_detects_array_mismatch() {
        let mut tree = tree();
        tree.values.append(100);
        assert!(matches!(tree.validate(&NaturalOrder), Err(Error::Corruption(_))));
    }
}
