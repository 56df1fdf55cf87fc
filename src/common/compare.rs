//! Caller-supplied comparison capability.

use std::cmp::Ordering;

use crate::common::Result;

/// Three-way comparison that may fail.
///
/// Any `Fn(&T, &T) -> Result<Ordering>` closure is a comparator; for types
/// with a total order, [`NaturalOrder`] uses `Ord`.
///
/// The first argument is always the value being searched for or inserted,
/// the second the value already stored.
///
/// # Example
/// ```
/// use std::cmp::Ordering;
/// use arbortree::{Comparator, NaturalOrder};
///
/// let by_len = |a: &&str, b: &&str| -> arbortree::Result<Ordering> { Ok(a.len().cmp(&b.len())) };
/// assert_eq!(by_len.compare(&"ab", &"abc").unwrap(), Ordering::Less);
/// assert_eq!(NaturalOrder.compare(&3, &3).unwrap(), Ordering::Equal);
/// ```
pub trait Comparator<T: ?Sized> {
    /// Compare `a` against `b`.
    fn compare(&self, a: &T, b: &T) -> Result<Ordering>;
}

impl<T: ?Sized, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Result<Ordering>,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Result<Ordering> {
        self(a, b)
    }
}

/// Comparator backed by `Ord`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalOrder;

impl<T: Ord + ?Sized> Comparator<T> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Result<Ordering> {
        Ok(a.cmp(b))
    }
}

/// Comparator that orders `Arc`-like handles by their pointees.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerefOrder;

impl<T> Comparator<T> for DerefOrder
where
    T: std::ops::Deref,
    T::Target: Ord,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Result<Ordering> {
        Ok((**a).cmp(&**b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use std::sync::Arc;

    #[test]
    fn test_natural_order() {
        assert_eq!(NaturalOrder.compare(&1, &2).unwrap(), Ordering::Less);
        assert_eq!(NaturalOrder.compare("b", "a").unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_closure_comparator_can_fail() {
        let cmp = |_: &i32, _: &i32| -> Result<Ordering> {
            Err(Error::Comparison("incomparable".into()))
        };
        assert!(matches!(cmp.compare(&1, &1), Err(Error::Comparison(_))));
    }

    #[test]
    fn test_deref_order() {
        let a = Arc::new(5);
        let b = Arc::new(9);
        assert_eq!(DerefOrder.compare(&a, &b).unwrap(), Ordering::Less);
        assert_eq!(DerefOrder.compare(&b, &Arc::new(9)).unwrap(), Ordering::Equal);
    }
}
