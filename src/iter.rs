//! Paired iteration over the dense key and value arrays.
//!
//! Both iterators walk the two arrays in lockstep by position and yield
//! `(key, value)` with the key copied out and the value borrowed. Order is
//! dense order, which depends on erase history.

use core::iter::FusedIterator;
use core::mem;

/// Iterator over `(K, &V)` pairs of a `SlotMap`.
#[derive(Debug)]
pub struct Iter<'a, K, V> {
    keys: &'a [K],
    values: &'a [V],
    front: usize,
    back: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(keys: &'a [K], values: &'a [V]) -> Self {
        debug_assert_eq!(keys.len(), values.len());
        Self {
            keys,
            values,
            front: 0,
            back: values.len(),
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, K: Copy, V> Iterator for Iter<'a, K, V> {
    type Item = (K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let p = self.front;
        self.front += 1;
        Some((self.keys[p], &self.values[p]))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<K: Copy, V> DoubleEndedIterator for Iter<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some((self.keys[self.back], &self.values[self.back]))
    }

    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        self.back = self.back.saturating_sub(n).max(self.front);
        self.next_back()
    }
}

impl<K: Copy, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K: Copy, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(K, &mut V)` pairs of a `SlotMap`.
#[derive(Debug)]
pub struct IterMut<'a, K, V> {
    keys: &'a [K],
    values: &'a mut [V],
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(keys: &'a [K], values: &'a mut [V]) -> Self {
        debug_assert_eq!(keys.len(), values.len());
        Self { keys, values }
    }
}

impl<'a, K: Copy, V> Iterator for IterMut<'a, K, V> {
    type Item = (K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (key, keys) = self.keys.split_first()?;
        let tmp = mem::take(&mut self.values);
        let (value, values) = tmp.split_first_mut()?;
        self.keys = keys;
        self.values = values;
        Some((*key, value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.keys.len();
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        let skip = n.min(self.keys.len());
        self.keys = &self.keys[skip..];
        let tmp = mem::take(&mut self.values);
        self.values = tmp.split_at_mut(skip).1;
        self.next()
    }
}

impl<K: Copy, V> DoubleEndedIterator for IterMut<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        let (key, keys) = self.keys.split_last()?;
        let tmp = mem::take(&mut self.values);
        let (value, values) = tmp.split_last_mut()?;
        self.keys = keys;
        self.values = values;
        Some((*key, value))
    }
}

impl<K: Copy, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K: Copy, V> FusedIterator for IterMut<'_, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: keys and values stay in positional correspondence from
    /// both ends.
    #[test]
    fn lockstep_from_both_ends() {
        let keys = [10u32, 11, 12, 13];
        let values = ["a", "b", "c", "d"];
        let mut it = Iter::new(&keys, &values);
        assert_eq!(it.len(), 4);
        assert_eq!(it.next(), Some((10, &"a")));
        assert_eq!(it.next_back(), Some((13, &"d")));
        assert_eq!(it.len(), 2);
        assert_eq!(it.next_back(), Some((12, &"c")));
        assert_eq!(it.next(), Some((11, &"b")));
        assert_eq!(it.next(), None);
        assert_eq!(it.next_back(), None);
    }

    /// Invariant: `nth`/`nth_back` jump in O(1) and never cross.
    #[test]
    fn random_access_jumps() {
        let keys = [0u32, 1, 2, 3, 4, 5];
        let values = [0u8, 10, 20, 30, 40, 50];
        let mut it = Iter::new(&keys, &values);
        assert_eq!(it.nth(2), Some((2, &20)));
        assert_eq!(it.nth_back(1), Some((4, &40)));
        assert_eq!(it.len(), 1);
        assert_eq!(it.nth(5), None);
        assert_eq!(it.len(), 0);

        let rev: Vec<u32> = Iter::new(&keys, &values).rev().map(|(k, _)| k).collect();
        assert_eq!(rev, vec![5, 4, 3, 2, 1, 0]);
    }

    /// Invariant: mutable iteration hands out each value exactly once.
    #[test]
    fn iter_mut_updates_each_value_once() {
        let keys = [1u32, 2, 3];
        let mut values = [1i32, 2, 3];
        for (k, v) in IterMut::new(&keys, &mut values) {
            *v += k as i32 * 100;
        }
        assert_eq!(values, [101, 202, 303]);

        let mut it = IterMut::new(&keys, &mut values);
        assert_eq!(it.len(), 3);
        let (k, v) = it.next_back().unwrap();
        assert_eq!(k, 3);
        *v = 0;
        let (k, _) = it.nth(1).unwrap();
        assert_eq!(k, 2);
        assert!(it.next().is_none());
        assert_eq!(values, [101, 202, 0]);
    }
}
