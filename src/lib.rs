//! packed-slotmap: an associative container that hands out stable,
//! generational keys for values kept in one dense, contiguous array.
//!
//! ```
//! use packed_slotmap::SlotMap;
//!
//! let mut m = SlotMap::new();
//! let k1 = m.insert(10);
//! let k2 = m.insert(20);
//! m.erase(k1);
//! assert!(m.get(k1).is_none());
//! assert_eq!(m[k2], 20);
//! assert_eq!(m.values(), &[20]);
//! ```
//!
//! Internal Design:
//!
//! Summary
//! - Goal: O(1) insert, lookup and removal by key, with every live value
//!   in one contiguous array for bulk iteration, and reliable detection
//!   of keys used after their entry was removed.
//! - Layers:
//!   - `KeyData` / `Key`: `{index, generation}` pairs. Only the map mints
//!     them; `new_key_type!` declares distinct key types per map.
//!   - `SlotTable`: one slot per index ever allocated. A slot is
//!     `Occupied(dense position)`, `Free(next free slot)` or `Retired`,
//!     plus a generation counter. Free slots form a LIFO list threaded
//!     through the table.
//!   - `SlotMap<V, K, B>`: dense values and dense keys in parallel
//!     arrays. `keys[p]` names the slot that points at `values[p]`, which
//!     is what lets a swap-remove patch the moved entry's slot.
//!   - `Backing`: a family of growable contiguous stores (`Vec` by
//!     default) used for all three arrays.
//!
//! Constraints
//! - Single-threaded: no interior mutability and no locking. `&mut self`
//!   is the only way to mutate; share across threads behind a lock.
//! - No `unsafe`. Cross references are plain indices.
//! - Dense order is an artifact of erase history and carries no meaning;
//!   equality between maps compares (key, value) pairs as a set.
//!
//! Stale keys
//! - Releasing a slot (erase, pop, clear) increments its generation, so
//!   every key issued for it earlier stops matching. `clear()` releases
//!   each live slot individually rather than resetting the table, so keys
//!   from before the clear never alias keys issued after it.
//! - Checked entry points (`find`, `get`, `contains_key`, `try_erase`,
//!   `try_pop`) treat stale keys as an ordinary miss.
//! - Unchecked entry points (`Index`, `erase`, `pop`) compare generations
//!   with `debug_assert!` only. In release builds a stale key addresses
//!   whatever currently occupies its slot, and panics if the slot is
//!   vacant.
//!
//! Overflow semantics
//! - Generations are `u32`. A slot released at `u32::MAX` is retired for
//!   good instead of wrapping, so no stale key can ever match again. The
//!   retirement is logged through `log` at warn level.
//! - Slot indices are `u32` with `u32::MAX` reserved for the null key;
//!   inserting past `max_size()` fails with `InsertError::Full` (or panics
//!   from `insert`).
//!
//! Invalidation
//! - Keys survive any number of unrelated inserts and removals.
//! - References and iterators into dense storage do not: the borrow
//!   checker ends them at the next `&mut self` call.

mod iter;
mod key;
mod slot;
mod slot_map;
mod slot_map_proptest;
pub mod storage;

// Public surface
pub use iter::{Iter, IterMut};
pub use key::{DefaultKey, Key, KeyData};
pub use slot::Slot;
pub use slot_map::{InsertError, SlotMap};
pub use storage::{Backing, ReserveStorage, Storage, VecBacking};
