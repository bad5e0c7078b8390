//! Slot table: the indirection layer between keys and dense positions.
//!
//! Every slot ever allocated stays in the table. A slot is either occupied
//! (holding the dense position of its value), free (linking to the next
//! free slot), or retired once its generation counter is exhausted.
//! Releasing a slot bumps its generation, which is what invalidates every
//! key issued for it so far.

use crate::key::{KeyData, INDEX_SENTINEL};
use crate::storage::Storage;

/// Largest number of slots a table can hold; `INDEX_SENTINEL` itself is
/// never a slot index.
pub(crate) const MAX_SLOTS: usize = (INDEX_SENTINEL - 1) as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotState {
    /// Dense position of the value owned by this slot.
    Occupied(u32),
    /// Next slot on the free list, or `INDEX_SENTINEL`.
    Free(u32),
    /// Generation exhausted; never handed out again.
    Retired,
}

/// One slot-table entry. Opaque outside the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    state: SlotState,
    generation: u32,
}

#[cfg(test)]
impl Slot {
    pub(crate) fn state(&self) -> SlotState {
        self.state
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SlotTable<S> {
    slots: S,
    free_head: u32,
}

impl<S: Storage<Slot>> Default for SlotTable<S> {
    fn default() -> Self {
        Self::with_store(S::default())
    }
}

impl<S: Storage<Slot>> SlotTable<S> {
    pub(crate) fn with_store(slots: S) -> Self {
        Self {
            slots,
            free_head: INDEX_SENTINEL,
        }
    }

    pub(crate) fn store(&self) -> &S {
        &self.slots
    }

    pub(crate) fn store_mut(&mut self) -> &mut S {
        &mut self.slots
    }

    /// Number of slots ever allocated (occupied, free or retired).
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    #[cfg(test)]
    pub(crate) fn free_head(&self) -> u32 {
        self.free_head
    }

    pub(crate) fn slot(&self, index: u32) -> Option<&Slot> {
        self.slots.as_slice().get(index as usize)
    }

    /// The key the next `allocate` will produce, without mutating anything.
    /// `None` when the table is full.
    pub(crate) fn next_vacant(&self) -> Option<KeyData> {
        if self.free_head != INDEX_SENTINEL {
            let slot = &self.slots.as_slice()[self.free_head as usize];
            return Some(KeyData::new(self.free_head, slot.generation));
        }
        let index = self.slots.len();
        if index >= MAX_SLOTS {
            return None;
        }
        Some(KeyData::new(index as u32, 0))
    }

    /// Marks the slot named by `next_vacant` as occupied at `position`.
    ///
    /// Pops the free-list head when there is one; otherwise appends a fresh
    /// slot at generation 0.
    pub(crate) fn allocate(&mut self, key: KeyData, position: u32) {
        if self.free_head != INDEX_SENTINEL {
            debug_assert_eq!(key.index(), self.free_head);
            let slot = &mut self.slots.as_mut_slice()[self.free_head as usize];
            let next = match slot.state {
                SlotState::Free(next) => next,
                other => unreachable!("free list head is not free: {other:?}"),
            };
            debug_assert_eq!(slot.generation, key.generation());
            slot.state = SlotState::Occupied(position);
            self.free_head = next;
        } else {
            debug_assert_eq!(key.index() as usize, self.slots.len());
            self.slots.push(Slot {
                state: SlotState::Occupied(position),
                generation: 0,
            });
        }
    }

    /// Frees an occupied slot and returns the dense position it held.
    ///
    /// The generation is incremented and the slot pushed onto the free
    /// list. A slot already at `u32::MAX` is retired instead, so its
    /// generation never wraps back to a value an old key might carry.
    pub(crate) fn release(&mut self, index: u32) -> u32 {
        let free_head = self.free_head;
        let slot = &mut self.slots.as_mut_slice()[index as usize];
        let position = match slot.state {
            SlotState::Occupied(position) => position,
            other => panic!("releasing slot {index} which is not occupied: {other:?}"),
        };
        match slot.generation.checked_add(1) {
            Some(generation) => {
                slot.generation = generation;
                slot.state = SlotState::Free(free_head);
                self.free_head = index;
            }
            None => {
                slot.state = SlotState::Retired;
                log::warn!("slot {index} exhausted its generations and was retired");
            }
        }
        position
    }

    /// Dense position for `key` if it is live, `None` for stale, vacant or
    /// out-of-range keys.
    #[inline]
    pub(crate) fn position(&self, key: KeyData) -> Option<u32> {
        match self.slot(key.index())? {
            Slot {
                state: SlotState::Occupied(position),
                generation,
            } if *generation == key.generation() => Some(*position),
            _ => None,
        }
    }

    /// Dense position for a key the caller promises is live.
    ///
    /// The generation is only compared in debug builds. A stale key whose
    /// slot was reused resolves to the current occupant in release builds.
    ///
    /// # Panics
    ///
    /// Panics if the slot does not exist or is not occupied, and in debug
    /// builds if the generation does not match.
    #[inline]
    pub(crate) fn position_unchecked(&self, key: KeyData) -> u32 {
        let slot = match self.slot(key.index()) {
            Some(slot) => slot,
            None => panic!("key {key:?} does not belong to this slot map"),
        };
        debug_assert_eq!(
            slot.generation,
            key.generation(),
            "stale key {key:?} used on an unchecked path"
        );
        match slot.state {
            SlotState::Occupied(position) => position,
            _ => panic!("key {key:?} refers to a vacant slot"),
        }
    }

    /// Records that the value owned by slot `index` now lives at `position`.
    #[inline]
    pub(crate) fn relocate(&mut self, index: u32, position: u32) {
        let slot = &mut self.slots.as_mut_slice()[index as usize];
        debug_assert!(matches!(slot.state, SlotState::Occupied(_)));
        slot.state = SlotState::Occupied(position);
    }

    #[cfg(test)]
    pub(crate) fn force_generation(&mut self, index: u32, generation: u32) {
        self.slots.as_mut_slice()[index as usize].generation = generation;
    }
}
