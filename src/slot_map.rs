//! SlotMap: dense value storage behind stable generational keys.

use crate::iter::{Iter, IterMut};
use crate::key::{DefaultKey, Key};
use crate::slot::{Slot, SlotTable, MAX_SLOTS};
use crate::storage::{Backing, ReserveStorage, Storage, VecBacking};
use core::fmt;
use core::ops::{Index, IndexMut};

/// Associative container issuing opaque keys for values kept in one
/// contiguous array.
///
/// Insert, lookup and removal are O(1). Removal swaps the last value into
/// the hole, so dense order is not stable across erases. Keys stay valid
/// until their entry is removed; a key kept past removal never resolves
/// again, even after its slot is reused.
///
/// `SlotMap` has no internal synchronization. Sharing one across threads
/// needs an external lock.
pub struct SlotMap<V, K = DefaultKey, B = VecBacking>
where
    B: Backing,
{
    values: B::Store<V>,
    keys: B::Store<K>,
    slots: SlotTable<B::Store<Slot>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InsertError {
    #[error("slot map is full: all {max_slots} slots are in use")]
    Full { max_slots: usize },
}

impl<V> SlotMap<V> {
    pub fn new() -> Self {
        Self::with_key()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_key_and_capacity(capacity)
    }
}

impl<V, K, B> Default for SlotMap<V, K, B>
where
    K: Key,
    B: Backing,
{
    fn default() -> Self {
        Self::with_key()
    }
}

impl<V, K, B> SlotMap<V, K, B>
where
    K: Key,
    B: Backing,
{
    /// Creates an empty map for a custom key type or backing family.
    pub fn with_key() -> Self {
        Self {
            values: Default::default(),
            keys: Default::default(),
            slots: SlotTable::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Most entries the map can ever hold at once.
    pub fn max_size(&self) -> usize {
        MAX_SLOTS
    }

    /// Inserts a value and returns its key.
    ///
    /// # Panics
    ///
    /// Panics if the map already holds [`max_size`](Self::max_size) slots
    /// and none is free.
    pub fn insert(&mut self, value: V) -> K {
        self.insert_with_key(|_| value)
    }

    /// Inserts a value built from its own key.
    ///
    /// # Panics
    ///
    /// Same as [`insert`](Self::insert).
    pub fn insert_with_key<F>(&mut self, f: F) -> K
    where
        F: FnOnce(K) -> V,
    {
        match self.try_insert_with_key(f) {
            Ok(key) => key,
            Err(e) => panic!("{e}"),
        }
    }

    /// Inserts a value and returns its key together with the stored value.
    ///
    /// The reference is valid until the next mutation of the map.
    pub fn emplace(&mut self, value: V) -> (K, &mut V) {
        let key = self.insert(value);
        let last = self.values.len() - 1;
        (key, &mut self.values.as_mut_slice()[last])
    }

    /// Fallible form of [`insert_with_key`](Self::insert_with_key). `f` runs
    /// only when a slot is available.
    pub fn try_insert_with_key<F>(&mut self, f: F) -> Result<K, InsertError>
    where
        F: FnOnce(K) -> V,
    {
        let data = self.slots.next_vacant().ok_or(InsertError::Full {
            max_slots: MAX_SLOTS,
        })?;
        let key = K::from(data);

        // Build the value before touching any storage in case `f` panics.
        let value = f(key);
        let position = self.values.len() as u32;
        self.values.push(value);
        self.keys.push(key);
        self.slots.allocate(data, position);
        Ok(key)
    }

    /// Dense position of `key`, or `None` if the key is stale or unknown.
    pub fn find(&self, key: K) -> Option<usize> {
        self.slots.position(key.data()).map(|p| p as usize)
    }

    #[doc(alias = "contains")]
    pub fn contains_key(&self, key: K) -> bool {
        self.find(key).is_some()
    }

    pub fn get(&self, key: K) -> Option<&V> {
        let position = self.find(key)?;
        Some(&self.values.as_slice()[position])
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        let position = self.find(key)?;
        Some(&mut self.values.as_mut_slice()[position])
    }

    /// Entry at a dense position.
    pub fn get_at(&self, position: usize) -> Option<(K, &V)> {
        let key = *self.keys.as_slice().get(position)?;
        Some((key, &self.values.as_slice()[position]))
    }

    pub fn get_at_mut(&mut self, position: usize) -> Option<(K, &mut V)> {
        let key = *self.keys.as_slice().get(position)?;
        Some((key, &mut self.values.as_mut_slice()[position]))
    }

    pub fn first(&self) -> Option<(K, &V)> {
        self.get_at(0)
    }

    pub fn last(&self) -> Option<(K, &V)> {
        self.get_at(self.len().checked_sub(1)?)
    }

    /// Removes the entry for a key known to be live.
    ///
    /// The generation is only checked in debug builds; see
    /// [`pop`](Self::pop).
    pub fn erase(&mut self, key: K) {
        let _ = self.pop(key);
    }

    /// Removes the entry for `key` if it is live. Returns whether anything
    /// was removed.
    pub fn try_erase(&mut self, key: K) -> bool {
        self.try_pop(key).is_some()
    }

    /// Removes and returns the value for a key known to be live.
    ///
    /// # Panics
    ///
    /// Panics if the key's slot is vacant or does not exist. In debug
    /// builds it also panics when the generation does not match. Release
    /// builds skip that comparison, so a stale key whose slot has been
    /// reused removes the slot's current occupant. Use
    /// [`try_pop`](Self::try_pop) for keys that may be stale.
    pub fn pop(&mut self, key: K) -> V {
        let position = self.slots.position_unchecked(key.data());
        self.remove_at(position as usize).1
    }

    /// Removes and returns the value for `key`, or `None` if it is stale.
    #[doc(alias = "remove")]
    pub fn try_pop(&mut self, key: K) -> Option<V> {
        let position = self.find(key)?;
        Some(self.remove_at(position).1)
    }

    /// Removes the entry at a dense position and returns the position that
    /// now holds the next entry to visit.
    ///
    /// Because removal swaps the last entry into the hole, the returned
    /// position equals `position`; it is `len()` once the removed entry was
    /// the last one. Forward traversal that erases should keep using the
    /// returned position without advancing.
    ///
    /// # Panics
    ///
    /// Panics if `position >= len()`.
    pub fn erase_at(&mut self, position: usize) -> usize {
        let _ = self.remove_at(position);
        position
    }

    /// Removes and returns the entry at a dense position.
    ///
    /// # Panics
    ///
    /// Panics if `position >= len()`.
    pub fn pop_at(&mut self, position: usize) -> (K, V) {
        self.remove_at(position)
    }

    fn remove_at(&mut self, position: usize) -> (K, V) {
        let key = self.keys.swap_remove(position);
        let value = self.values.swap_remove(position);
        let released = self.slots.release(key.data().index());
        debug_assert_eq!(released as usize, position);

        // Whatever took the hole now lives at `position`.
        if let Some(moved) = self.keys.as_slice().get(position) {
            self.slots.relocate(moved.data().index(), position as u32);
        }
        (key, value)
    }

    /// Keeps only the entries for which `f` returns `true`.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(K, &mut V) -> bool,
    {
        let mut position = 0;
        while position < self.len() {
            let key = self.keys.as_slice()[position];
            if f(key, &mut self.values.as_mut_slice()[position]) {
                position += 1;
            } else {
                position = self.erase_at(position);
            }
        }
    }

    /// Removes every entry.
    ///
    /// Each live slot is released exactly as an individual erase would,
    /// so keys issued before the clear never match keys issued after it.
    pub fn clear(&mut self) {
        for key in self.keys.as_slice() {
            self.slots.release(key.data().index());
        }
        self.keys.clear();
        self.values.clear();
    }

    /// Exchanges the contents of two maps. Keys stay attached to their
    /// entries.
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    /// Keys in dense order, positionally matching [`values`](Self::values).
    pub fn keys(&self) -> &[K] {
        self.keys.as_slice()
    }

    /// Contiguous view of all live values, in dense order.
    pub fn values(&self) -> &[V] {
        self.values.as_slice()
    }

    pub fn values_mut(&mut self) -> &mut [V] {
        self.values.as_mut_slice()
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.keys.as_slice(), self.values.as_slice())
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(self.keys.as_slice(), self.values.as_mut_slice())
    }

    #[cfg(test)]
    pub(crate) fn slot_table(&self) -> &SlotTable<B::Store<Slot>> {
        &self.slots
    }
}

impl<V, K, B> SlotMap<V, K, B>
where
    K: Key,
    B: Backing,
    B::Store<V>: ReserveStorage<V>,
    B::Store<K>: ReserveStorage<K>,
    B::Store<Slot>: ReserveStorage<Slot>,
{
    pub fn with_key_and_capacity(capacity: usize) -> Self {
        Self {
            values: ReserveStorage::with_capacity(capacity),
            keys: ReserveStorage::with_capacity(capacity),
            slots: SlotTable::with_store(ReserveStorage::with_capacity(capacity)),
        }
    }

    /// Reserves room for at least `additional` more entries.
    pub fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
        self.keys.reserve(additional);
        let needed = (self.len() + additional).saturating_sub(self.slots.len());
        self.slots.store_mut().reserve(needed);
    }

    /// Smallest capacity among the value, key and slot stores.
    pub fn capacity(&self) -> usize {
        self.values
            .capacity()
            .min(self.keys.capacity())
            .min(self.slots.store().capacity())
    }

    /// Releases spare capacity. The slot table keeps every slot it has
    /// ever allocated.
    pub fn shrink_to_fit(&mut self) {
        self.values.shrink_to_fit();
        self.keys.shrink_to_fit();
        self.slots.store_mut().shrink_to_fit();
    }
}

impl<V, K, B> Index<K> for SlotMap<V, K, B>
where
    K: Key,
    B: Backing,
{
    type Output = V;

    /// Unchecked lookup; the generation is compared in debug builds only.
    fn index(&self, key: K) -> &V {
        let position = self.slots.position_unchecked(key.data());
        &self.values.as_slice()[position as usize]
    }
}

impl<V, K, B> IndexMut<K> for SlotMap<V, K, B>
where
    K: Key,
    B: Backing,
{
    fn index_mut(&mut self, key: K) -> &mut V {
        let position = self.slots.position_unchecked(key.data());
        &mut self.values.as_mut_slice()[position as usize]
    }
}

/// Two maps are equal when they hold the same (key, value) pairs, in any
/// dense order.
impl<V, K, B> PartialEq for SlotMap<V, K, B>
where
    V: PartialEq,
    K: Key,
    B: Backing,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<V, K, B> Eq for SlotMap<V, K, B>
where
    V: Eq,
    K: Key,
    B: Backing,
{
}

impl<V, K, B> Clone for SlotMap<V, K, B>
where
    B: Backing,
    B::Store<V>: Clone,
    B::Store<K>: Clone,
    B::Store<Slot>: Clone,
{
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            keys: self.keys.clone(),
            slots: self.slots.clone(),
        }
    }
}

impl<V, K, B> fmt::Debug for SlotMap<V, K, B>
where
    V: fmt::Debug,
    K: Key,
    B: Backing,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, V, K, B> IntoIterator for &'a SlotMap<V, K, B>
where
    K: Key,
    B: Backing,
{
    type Item = (K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, V, K, B> IntoIterator for &'a mut SlotMap<V, K, B>
where
    K: Key,
    B: Backing,
{
    type Item = (K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
impl<V, K, B> SlotMap<V, K, B>
where
    K: Key,
    B: Backing,
{
    /// Checks every structural invariant; panics on the first violation.
    pub(crate) fn assert_consistent(&self) {
        use crate::key::INDEX_SENTINEL;
        use crate::slot::SlotState;

        let keys = self.keys.as_slice();
        assert_eq!(keys.len(), self.values.len(), "dense arrays differ in length");

        // Dense -> slot: every dense key names an occupied slot pointing back.
        for (p, key) in keys.iter().enumerate() {
            let data = key.data();
            let slot = self.slots.slot(data.index()).expect("dense key names a slot");
            assert_eq!(slot.state(), SlotState::Occupied(p as u32));
            assert_eq!(slot.generation(), data.generation());
        }

        // Slot -> dense, and count the free list.
        let mut occupied = 0;
        for index in 0..self.slots.len() as u32 {
            let slot = self.slots.slot(index).unwrap();
            if let SlotState::Occupied(p) = slot.state() {
                occupied += 1;
                assert_eq!(keys[p as usize].data().index(), index);
            }
        }
        assert_eq!(occupied, keys.len());

        let mut free = 0;
        let mut cursor = self.slots.free_head();
        while cursor != INDEX_SENTINEL {
            free += 1;
            assert!(free <= self.slots.len(), "free list has a cycle");
            match self.slots.slot(cursor).unwrap().state() {
                SlotState::Free(next) => cursor = next,
                other => panic!("slot {cursor} on free list is {other:?}"),
            }
        }
        let retired = (0..self.slots.len() as u32)
            .filter(|&i| self.slots.slot(i).unwrap().state() == SlotState::Retired)
            .count();
        assert_eq!(occupied + free + retired, self.slots.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyData;
    use std::collections::BTreeSet;

    /// Invariant: insert followed by lookup yields the inserted value.
    #[test]
    fn insert_then_lookup() {
        let mut m: SlotMap<i32> = SlotMap::new();
        let k1 = m.insert(10);
        let k2 = m.insert(20);
        assert_eq!(m.get(k1), Some(&10));
        assert_eq!(m[k2], 20);
        assert_eq!(m.find(k1), Some(0));
        assert_eq!(m.find(k2), Some(1));
        assert_eq!(m.len(), 2);
        m.assert_consistent();
    }

    /// Invariant: erasing the first entry moves the last one into its dense
    /// position and patches that entry's slot.
    #[test]
    fn erase_swaps_last_into_hole() {
        let mut m: SlotMap<&str> = SlotMap::new();
        let a = m.insert("a");
        let b = m.insert("b");
        let c = m.insert("c");
        m.erase(a);
        assert_eq!(m.values(), &["c", "b"]);
        assert_eq!(m.keys(), &[c, b]);
        assert_eq!(m.find(c), Some(0));
        assert_eq!(m.get(c), Some(&"c"));
        assert!(!m.contains_key(a));
        m.assert_consistent();
    }

    /// Invariant: erasing the last dense entry needs no relocation.
    #[test]
    fn erase_last_entry() {
        let mut m: SlotMap<u8> = SlotMap::new();
        let a = m.insert(1);
        let b = m.insert(2);
        m.erase(b);
        assert_eq!(m.keys(), &[a]);
        m.erase(a);
        assert!(m.is_empty());
        m.assert_consistent();
    }

    /// Invariant: a reused slot issues a key with a bumped generation and
    /// every earlier key for that slot stays dead.
    #[test]
    fn generation_bumps_on_reuse() {
        let mut m: SlotMap<u32> = SlotMap::new();
        let mut stale = Vec::new();
        for round in 0..3 {
            let k = m.insert(round);
            assert_eq!(k.data().index(), 0);
            assert_eq!(k.data().generation(), round);
            m.erase(k);
            stale.push(k);
        }
        let k = m.insert(99);
        assert_eq!(k.data().index(), 0);
        assert_eq!(k.data().generation(), 3);
        for s in stale {
            assert!(m.find(s).is_none());
            assert!(m.get(s).is_none());
        }
        m.assert_consistent();
    }

    /// Invariant: clear releases every live slot through the free list, so
    /// old keys never resolve and slot indices are recycled.
    #[test]
    fn clear_preserves_generations() {
        let mut m: SlotMap<i32> = SlotMap::new();
        let old: Vec<_> = (0..4).map(|i| m.insert(i)).collect();
        m.clear();
        assert!(m.is_empty());
        m.assert_consistent();

        let new: Vec<_> = (0..4).map(|i| m.insert(i)).collect();
        assert_eq!(m.slot_table().len(), 4, "slots reused, not appended");
        for k in &old {
            assert!(!m.contains_key(*k));
        }
        let old_set: BTreeSet<_> = old.into_iter().collect();
        assert!(new.iter().all(|k| !old_set.contains(k)));
        m.assert_consistent();
    }

    /// Invariant: `try_*` entry points report misses without side effects.
    #[test]
    fn try_variants_report_misses() {
        let mut m: SlotMap<String> = SlotMap::new();
        let k = m.insert("x".to_string());
        let other = m.insert("y".to_string());
        assert_eq!(m.try_pop(k), Some("x".to_string()));
        assert_eq!(m.try_pop(k), None);
        assert!(!m.try_erase(k));
        assert!(m.try_erase(other));
        assert!(!m.try_erase(other));
        assert!(!m.try_erase(DefaultKey::null()));
        assert!(m.is_empty());
        m.assert_consistent();
    }

    /// Invariant: keys from beyond the slot table and the null key miss.
    #[test]
    fn out_of_range_keys_miss() {
        let mut big: SlotMap<i32> = SlotMap::new();
        let far = (0..10).map(|i| big.insert(i)).last().unwrap();
        let m: SlotMap<i32> = SlotMap::new();
        assert!(m.find(far).is_none());
        assert!(m.get(DefaultKey::null()).is_none());
        assert!(!m.contains_key(DefaultKey::null()));
    }

    /// Invariant: `insert_with_key` hands the closure the key it returns.
    #[test]
    fn insert_with_key_sees_own_key() {
        let mut m: SlotMap<(DefaultKey, i32)> = SlotMap::new();
        let k = m.insert_with_key(|k| (k, 7));
        assert_eq!(m[k], (k, 7));
    }

    /// Invariant: `emplace` returns the key and a reference to the stored
    /// value.
    #[test]
    fn emplace_returns_reference() {
        let mut m: SlotMap<Vec<u8>> = SlotMap::new();
        let _ = m.insert(vec![0]);
        let (k, v) = m.emplace(vec![1]);
        v.push(2);
        assert_eq!(m[k], vec![1, 2]);
    }

    /// Invariant: a panicking constructor leaves the map untouched.
    #[test]
    fn panicking_constructor_leaves_map_intact() {
        let mut m: SlotMap<i32> = SlotMap::new();
        let k = m.insert(1);
        m.erase(k);
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            m.insert_with_key(|_| panic!("boom"));
        }));
        assert!(res.is_err());
        assert!(m.is_empty());
        m.assert_consistent();
        let k2 = m.insert(2);
        assert_eq!(k2.data().index(), k.data().index());
        assert_eq!(m[k2], 2);
    }

    /// Invariant: a slot whose generation is exhausted is retired; keys for
    /// it never resolve again and a new slot is appended instead.
    #[test]
    fn exhausted_generation_retires_slot() {
        let mut m: SlotMap<i32> = SlotMap::new();
        let k = m.insert(1);
        let idx = k.data().index() as usize;
        m.slots.force_generation(idx as u32, u32::MAX);
        let stale: DefaultKey = KeyData::new(idx as u32, u32::MAX).into();
        // Keep the dense key in sync with the forced generation.
        m.keys.as_mut_slice()[0] = stale;
        assert_eq!(m.pop(stale), 1);
        assert!(m.get(stale).is_none());

        let fresh = m.insert(2);
        assert_ne!(fresh.data().index() as usize, idx);
        assert!(m.get(stale).is_none());
        assert_eq!(m[fresh], 2);
        m.assert_consistent();
    }

    /// Invariant: unchecked indexing with a stale key is caught in debug
    /// builds.
    #[cfg(debug_assertions)]
    #[test]
    fn stale_index_panics_in_debug() {
        let mut m: SlotMap<i32> = SlotMap::new();
        let k = m.insert(1);
        m.erase(k);
        let _k2 = m.insert(2);
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| m[k]));
        assert!(res.is_err(), "expected stale index to panic in debug builds");
    }

    /// Invariant: `retain` visits each entry once and drops rejected ones.
    #[test]
    fn retain_filters_in_place() {
        let mut m: SlotMap<i32> = SlotMap::new();
        let keys: Vec<_> = (0..10).map(|i| m.insert(i)).collect();
        let mut seen = 0;
        m.retain(|_, v| {
            seen += 1;
            *v % 3 == 0
        });
        assert_eq!(seen, 10);
        let mut left: Vec<_> = m.values().to_vec();
        left.sort();
        assert_eq!(left, vec![0, 3, 6, 9]);
        for (i, k) in keys.into_iter().enumerate() {
            assert_eq!(m.contains_key(k), i % 3 == 0);
        }
        m.assert_consistent();
    }

    /// Invariant: equality compares (key, value) pairs and ignores dense
    /// order.
    #[test]
    fn equality_is_order_insensitive() {
        // a: [y, w] in dense order.
        let mut a: SlotMap<i32> = SlotMap::new();
        let x = a.insert(0);
        let y = a.insert(1);
        a.erase(x);
        let w = a.insert(2);

        // b: the same keys and values, but [w, y].
        let mut b: SlotMap<i32> = SlotMap::new();
        let xb = b.insert(0);
        b.erase(xb);
        let wb = b.insert(2);
        let yb = b.insert(1);

        assert_eq!((w, y), (wb, yb));
        assert_ne!(a.values(), b.values());
        assert_eq!(a, b);
        assert_eq!(a, a.clone());

        b[wb] = 5;
        assert_ne!(a, b);
        b.erase(wb);
        assert_ne!(a, b);
        assert_eq!(SlotMap::<i32>::new(), SlotMap::<i32>::new());
    }

    #[test]
    fn debug_prints_map() {
        let mut m: SlotMap<&str> = SlotMap::new();
        m.insert("v");
        assert_eq!(format!("{:?}", m), "{DefaultKey(0v0): \"v\"}");
    }

    /// Invariant: capacity plumbing reports the minimum across stores.
    #[test]
    fn capacity_plumbing() {
        let mut m: SlotMap<u64> = SlotMap::new();
        assert_eq!(m.capacity(), 0);
        m.reserve(10);
        assert!(m.capacity() >= 10);
        for i in 0..5 {
            m.insert(i);
        }
        m.clear();
        m.shrink_to_fit();
        assert!(m.capacity() <= m.len());

        let w: SlotMap<u64> = SlotMap::with_capacity(8);
        assert!(w.capacity() >= 8);
    }
}
