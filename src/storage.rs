//! Backing storage capabilities.
//!
//! A `SlotMap` keeps three arrays: dense values, dense keys and the slot
//! table. All three come from one [`Backing`] family so a single type
//! parameter picks the storage for the whole map. The base [`Storage`]
//! contract is a growable, contiguous array; [`ReserveStorage`] is an
//! optional capability that unlocks the map's capacity methods.

/// A growable, contiguous, random-access array.
pub trait Storage<T>: Default {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, value: T);

    fn pop(&mut self) -> Option<T>;

    fn clear(&mut self);

    fn as_slice(&self) -> &[T];

    fn as_mut_slice(&mut self) -> &mut [T];

    /// Removes the element at `index` by moving the last element into its
    /// place.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    fn swap_remove(&mut self, index: usize) -> T {
        let len = self.len();
        assert!(
            index < len,
            "swap_remove index (is {index}) should be < len (is {len})"
        );
        self.as_mut_slice().swap(index, len - 1);
        match self.pop() {
            Some(value) => value,
            None => unreachable!("store reported len {len} but was empty"),
        }
    }
}

/// Storage that can pre-allocate and release spare capacity.
pub trait ReserveStorage<T>: Storage<T> {
    fn with_capacity(capacity: usize) -> Self;

    /// Reserves room for at least `additional` more elements.
    fn reserve(&mut self, additional: usize);

    fn capacity(&self) -> usize;

    fn shrink_to_fit(&mut self);
}

/// A family of stores, one per element type.
pub trait Backing {
    type Store<T>: Storage<T>;
}

/// The default family: plain `Vec<T>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VecBacking;

impl Backing for VecBacking {
    type Store<T> = Vec<T>;
}

impl<T> Storage<T> for Vec<T> {
    #[inline]
    fn len(&self) -> usize {
        Vec::len(self)
    }

    #[inline]
    fn push(&mut self, value: T) {
        Vec::push(self, value)
    }

    #[inline]
    fn pop(&mut self) -> Option<T> {
        Vec::pop(self)
    }

    fn clear(&mut self) {
        Vec::clear(self)
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        self
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        self
    }

    #[inline]
    fn swap_remove(&mut self, index: usize) -> T {
        Vec::swap_remove(self, index)
    }
}

impl<T> ReserveStorage<T> for Vec<T> {
    fn with_capacity(capacity: usize) -> Self {
        Vec::with_capacity(capacity)
    }

    fn reserve(&mut self, additional: usize) {
        Vec::reserve(self, additional)
    }

    fn capacity(&self) -> usize {
        Vec::capacity(self)
    }

    fn shrink_to_fit(&mut self) {
        Vec::shrink_to_fit(self)
    }
}
