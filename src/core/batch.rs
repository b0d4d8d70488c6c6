use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RigidError};

/// An ordered sequence of independent values.
///
/// Every binary operation on arrays goes through [`Batch::zip_with`]:
/// equal lengths pair elementwise, a singleton on either side is applied to
/// every element of the other, anything else is a length mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Batch<V> {
    items: Vec<V>,
}

/// Result length of broadcasting `left` elements against `right`.
pub fn broadcast_len(left: usize, right: usize) -> Result<usize> {
    match (left, right) {
        (l, r) if l == r => Ok(l),
        (1, r) => Ok(r),
        (l, 1) => Ok(l),
        (left, right) => Err(RigidError::LengthMismatch { left, right }),
    }
}

impl<V> Batch<V> {
    pub fn new(items: Vec<V>) -> Self {
        Self { items }
    }

    pub fn one(value: V) -> Self {
        Self { items: vec![value] }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// A single value rather than an array.
    pub fn is_singleton(&self) -> bool {
        self.items.len() == 1
    }

    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[V] {
        &self.items
    }

    pub fn get(&self, i: usize) -> Option<&V> {
        self.items.get(i)
    }

    pub fn into_vec(self) -> Vec<V> {
        self.items
    }

    /// The value, if this batch holds exactly one.
    pub fn into_single(self) -> Option<V> {
        let mut items = self.items;
        if items.len() == 1 { items.pop() } else { None }
    }

    /// Element `i` under broadcasting: a singleton answers for every index.
    fn broadcast_at(&self, i: usize) -> &V {
        if self.items.len() == 1 {
            &self.items[0]
        } else {
            &self.items[i]
        }
    }

    pub fn map<W>(&self, f: impl FnMut(&V) -> W) -> Batch<W> {
        Batch::new(self.items.iter().map(f).collect())
    }

    pub fn try_map<W>(&self, f: impl FnMut(&V) -> Result<W>) -> Result<Batch<W>> {
        self.items.iter().map(f).collect::<Result<Vec<_>>>().map(Batch::new)
    }

    /// Pairs this batch with `other` under the broadcasting rule.
    pub fn zip_with<U, W>(
        &self,
        other: &Batch<U>,
        mut f: impl FnMut(&V, &U) -> W,
    ) -> Result<Batch<W>> {
        let n = broadcast_len(self.len(), other.len())?;
        tracing::trace!(left = self.len(), right = other.len(), n, "broadcast");
        Ok((0..n)
            .map(|i| f(self.broadcast_at(i), other.broadcast_at(i)))
            .collect())
    }
}

impl<V: PartialEq> Batch<V> {
    /// Exact elementwise equality under broadcasting.
    pub fn eq_elementwise(&self, other: &Batch<V>) -> Result<Batch<bool>> {
        self.zip_with(other, |a, b| a == b)
    }

    pub fn ne_elementwise(&self, other: &Batch<V>) -> Result<Batch<bool>> {
        self.zip_with(other, |a, b| a != b)
    }
}

impl Batch<bool> {
    pub fn all(&self) -> bool {
        self.items.iter().all(|&b| b)
    }

    pub fn any(&self) -> bool {
        self.items.iter().any(|&b| b)
    }
}

impl<V> From<Vec<V>> for Batch<V> {
    fn from(items: Vec<V>) -> Self {
        Batch::new(items)
    }
}

impl<V> FromIterator<V> for Batch<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Batch::new(iter.into_iter().collect())
    }
}

impl<V> IntoIterator for Batch<V> {
    type Item = V;
    type IntoIter = std::vec::IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, V> IntoIterator for &'a Batch<V> {
    type Item = &'a V;
    type IntoIter = std::slice::Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<V> Index<usize> for Batch<V> {
    type Output = V;

    fn index(&self, i: usize) -> &V {
        &self.items[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_len() {
        assert_eq!(broadcast_len(3, 3).unwrap(), 3);
        assert_eq!(broadcast_len(1, 4).unwrap(), 4);
        assert_eq!(broadcast_len(4, 1).unwrap(), 4);
        assert_eq!(broadcast_len(1, 0).unwrap(), 0);
        assert_eq!(
            broadcast_len(2, 3),
            Err(RigidError::LengthMismatch { left: 2, right: 3 })
        );
        assert!(broadcast_len(0, 3).is_err());
    }

    #[test]
    fn test_zip_with_singleton_keeps_order() {
        let a = Batch::one(10);
        let b = Batch::new(vec![1, 2, 3]);
        assert_eq!(a.zip_with(&b, |x, y| x + y).unwrap().into_vec(), vec![11, 12, 13]);
        assert_eq!(b.zip_with(&a, |x, y| x - y).unwrap().into_vec(), vec![-9, -8, -7]);
    }

    #[test]
    fn test_zip_with_pairs() {
        let a = Batch::new(vec![1, 2, 3]);
        let b = Batch::new(vec![4, 5, 6]);
        assert_eq!(a.zip_with(&b, |x, y| x * y).unwrap().into_vec(), vec![4, 10, 18]);
    }

    #[test]
    fn test_elementwise_equality() {
        let a = Batch::new(vec![1, 2, 1]);
        let eq = a.eq_elementwise(&Batch::one(1)).unwrap();
        assert_eq!(eq.into_vec(), vec![true, false, true]);
        assert!(a.eq_elementwise(&Batch::new(vec![1, 2])).is_err());
        assert!(!a.ne_elementwise(&a).unwrap().any());
    }

    #[test]
    fn test_into_single() {
        assert_eq!(Batch::one(5).into_single(), Some(5));
        assert_eq!(Batch::new(vec![1, 2]).into_single(), None);
    }
}
