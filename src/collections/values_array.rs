//! Flat, index-addressable mirror of every value in a B-tree.
//!
//! Entries are never shifted: removing a value leaves a hole, so an index
//! handed out by `append` stays valid for the lifetime of the array.

use crate::common::{Error, Result};

/// Dense array of optional values.
#[derive(Debug, Clone)]
pub struct ValuesArray<T> {
    entries: Vec<Option<T>>,

    /// Number of non-hole entries.
    live: usize,
}

impl<T> ValuesArray<T> {
    /// Create an empty array.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty array with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            live: 0,
        }
    }

    /// Append a value, returning its index.
    pub fn append(&mut self, value: T) -> usize {
        self.entries.push(Some(value));
        self.live += 1;
        self.entries.len() - 1
    }

    /// Set the entry at `index`, returning what was there.
    ///
    /// `None` punches a hole.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if `index` is out of range.
    pub fn set(&mut self, index: usize, value: Option<T>) -> Result<Option<T>> {
        let len = self.entries.len();
        let slot = self
            .entries
            .get_mut(index)
            .ok_or_else(|| out_of_range(index, len))?;

        let previous = std::mem::replace(slot, value);
        match (&previous, slot.is_some()) {
            (None, true) => self.live += 1,
            (Some(_), false) => self.live -= 1,
            _ => {}
        }
        Ok(previous)
    }

    /// Entry at `index`; `None` for a hole.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if `index` is out of range.
    pub fn get(&self, index: usize) -> Result<Option<&T>> {
        self.entries
            .get(index)
            .map(Option::as_ref)
            .ok_or_else(|| out_of_range(index, self.entries.len()))
    }

    /// Number of entries, holes included.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry was ever appended.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-hole entries.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Iterate live entries with their indexes.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.as_ref().map(|value| (index, value)))
    }
}

impl<T> Default for ValuesArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect entries, holes included, keeping their positions.
impl<T> FromIterator<Option<T>> for ValuesArray<T> {
    fn from_iter<I: IntoIterator<Item = Option<T>>>(iter: I) -> Self {
        let entries: Vec<_> = iter.into_iter().collect();
        let live = entries.iter().filter(|entry| entry.is_some()).count();
        Self { entries, live }
    }
}

fn out_of_range(index: usize, len: usize) -> Error {
    Error::InvalidArgument(format!("array index {} out of range (len {})", index, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_returns_index() {
        let mut array = ValuesArray::new();
        assert_eq!(array.append("a"), 0);
        assert_eq!(array.append("b"), 1);
        assert_eq!(array.len(), 2);
        assert_eq!(array.live_count(), 2);
        assert_eq!(array.get(1).unwrap(), Some(&"b"));
    }

    #[test]
    fn test_holes_keep_indexes_stable() {
        let mut array = ValuesArray::with_capacity(4);
        array.append(1);
        array.append(2);
        array.append(3);

        assert_eq!(array.set(1, None).unwrap(), Some(2));
        assert_eq!(array.len(), 3);
        assert_eq!(array.live_count(), 2);
        assert_eq!(array.get(1).unwrap(), None);
        assert_eq!(array.get(2).unwrap(), Some(&3));

        let live: Vec<_> = array.iter().collect();
        assert_eq!(live, vec![(0, &1), (2, &3)]);

        // Filling the hole again restores the count
        assert_eq!(array.set(1, Some(7)).unwrap(), None);
        assert_eq!(array.live_count(), 3);
    }

    #[test]
    fn test_collect_keeps_holes() {
        let array: ValuesArray<i32> = vec![None, Some(4), None, Some(6)].into_iter().collect();
        assert_eq!(array.len(), 4);
        assert_eq!(array.live_count(), 2);
        assert_eq!(array.get(0).unwrap(), None);
        assert_eq!(array.get(3).unwrap(), Some(&6));
    }

    #[test]
    fn test_out_of_range() {
        let mut array: ValuesArray<u8> = ValuesArray::new();
        assert!(array.get(0).is_err());
        assert!(array.set(0, Some(1)).is_err());
    }
}
