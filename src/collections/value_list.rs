//! Ordered value list - the payload of every B-tree node.
//!
//! A [`ValueList`] keeps values in caller-defined order. Each value carries
//! the index of its entry in the tree's values array, so a value found in
//! a node leads straight to its array slot. Positions are addressed
//! through [`Element`] handles, which expose the value, its array index and
//! the neighbouring elements.

use crate::common::{Error, Result};

/// An ordered sequence of values, each tagged with its values array index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueList<T> {
    values: Vec<T>,

    /// `indexes[i]` is the values array index of `values[i]`.
    indexes: Vec<usize>,
}

impl<T> ValueList<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Create an empty list with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            indexes: Vec::with_capacity(capacity),
        }
    }

    /// Number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the list holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Append at the tail, ignoring order. Returns the new position.
    pub fn append(&mut self, value: T, array_index: usize) -> usize {
        self.values.push(value);
        self.indexes.push(array_index);
        self.values.len() - 1
    }

    /// Insert at an explicit position.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if `position > len`.
    pub fn insert_at(&mut self, position: usize, value: T, array_index: usize) -> Result<()> {
        if position > self.values.len() {
            return Err(out_of_range(position, self.values.len()));
        }
        self.values.insert(position, value);
        self.indexes.insert(position, array_index);
        Ok(())
    }

    /// Remove the element at `position`, returning its value and array
    /// index.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if `position` is out of range.
    pub fn remove(&mut self, position: usize) -> Result<(T, usize)> {
        if position >= self.values.len() {
            return Err(out_of_range(position, self.values.len()));
        }
        Ok((self.values.remove(position), self.indexes.remove(position)))
    }

    /// Overwrite the value at `position`, keeping its array index. Returns
    /// the previous value.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if `position` is out of range.
    pub fn replace(&mut self, position: usize, value: T) -> Result<T> {
        let len = self.values.len();
        let slot = self
            .values
            .get_mut(position)
            .ok_or_else(|| out_of_range(position, len))?;
        Ok(std::mem::replace(slot, value))
    }

    /// Overwrite the value and the array index at `position`. Returns the
    /// previous pair.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if `position` is out of range.
    pub fn set(&mut self, position: usize, value: T, array_index: usize) -> Result<(T, usize)> {
        let previous = self.replace(position, value)?;
        let previous_index = std::mem::replace(&mut self.indexes[position], array_index);
        Ok((previous, previous_index))
    }

    /// Cut the list in two; `self` keeps `[0, at)`.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if `at > len`.
    pub fn split_off(&mut self, at: usize) -> Result<ValueList<T>> {
        if at > self.values.len() {
            return Err(out_of_range(at, self.values.len()));
        }
        Ok(Self {
            values: self.values.split_off(at),
            indexes: self.indexes.split_off(at),
        })
    }

    /// Handle to the element at `position`.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if `position` is out of range.
    pub fn element(&self, position: usize) -> Result<Element<'_, T>> {
        if position >= self.values.len() {
            return Err(out_of_range(position, self.values.len()));
        }
        Ok(Element {
            list: self,
            position,
        })
    }

    /// Handle to the first element.
    pub fn first_element(&self) -> Option<Element<'_, T>> {
        self.element(0).ok()
    }

    /// Handle to the last element.
    pub fn last_element(&self) -> Option<Element<'_, T>> {
        let position = self.values.len().checked_sub(1)?;
        Some(Element {
            list: self,
            position,
        })
    }

    /// Value at `position`, if any.
    #[inline]
    pub fn get(&self, position: usize) -> Option<&T> {
        self.values.get(position)
    }

    /// Array index of the value at `position`, if any.
    #[inline]
    pub fn array_index(&self, position: usize) -> Option<usize> {
        self.indexes.get(position).copied()
    }

    /// First value.
    #[inline]
    pub fn first(&self) -> Option<&T> {
        self.values.first()
    }

    /// Last value.
    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.values.last()
    }

    /// Position of the value stored under `array_index`.
    pub fn position_of_index(&self, array_index: usize) -> Option<usize> {
        self.indexes.iter().position(|&index| index == array_index)
    }

    /// Iterate values in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    /// Iterate `(value, array index)` pairs in order.
    pub fn entries(&self) -> impl Iterator<Item = (&T, usize)> {
        self.values.iter().zip(self.indexes.iter().copied())
    }

    /// View the values as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// View the array indexes as a slice, in value order.
    pub fn array_indexes(&self) -> &[usize] {
        &self.indexes
    }

    /// Consume the list into its values.
    pub fn into_vec(self) -> Vec<T> {
        self.values
    }
}

impl<T> Default for ValueList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(T, usize)> for ValueList<T> {
    fn from_iter<I: IntoIterator<Item = (T, usize)>>(iter: I) -> Self {
        let (values, indexes) = iter.into_iter().unzip();
        Self { values, indexes }
    }
}

impl<T> IntoIterator for ValueList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ValueList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Handle to one element of a [`ValueList`].
#[derive(Debug)]
pub struct Element<'a, T> {
    list: &'a ValueList<T>,
    position: usize,
}

impl<'a, T> Element<'a, T> {
    /// Position of the element in its list.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// The element's value.
    #[inline]
    pub fn value(&self) -> &'a T {
        &self.list.values[self.position]
    }

    /// Values array index of the element's value.
    #[inline]
    pub fn array_index(&self) -> usize {
        self.list.indexes[self.position]
    }

    /// The following element.
    pub fn next(&self) -> Option<Element<'a, T>> {
        let position = self.position + 1;
        (position < self.list.len()).then_some(Element {
            list: self.list,
            position,
        })
    }

    /// The preceding element.
    pub fn previous(&self) -> Option<Element<'a, T>> {
        self.position.checked_sub(1).map(|position| Element {
            list: self.list,
            position,
        })
    }

    /// Whether this is the list's last element.
    #[inline]
    pub fn is_last(&self) -> bool {
        self.position + 1 == self.list.len()
    }
}

impl<T> Clone for Element<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Element<'_, T> {}

fn out_of_range(position: usize, len: usize) -> Error {
    Error::InvalidArgument(format!("element {} out of range (len {})", position, len))
}
