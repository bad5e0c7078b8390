//! Opaque generational keys.
//!
//! A key names a slot index plus the generation that slot had when the key
//! was issued. Keys are only minted by a `SlotMap`; callers can copy,
//! compare and hash them but cannot build one from raw parts.

use core::fmt;
use core::hash::Hash;

/// Slot index reserved for the null key and the end of the free list.
pub(crate) const INDEX_SENTINEL: u32 = u32::MAX;

/// The raw `{index, generation}` pair behind every key type.
///
/// Ordering is index-major, generation-minor.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyData {
    index: u32,
    generation: u32,
}

impl KeyData {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The null key. It is never issued by a map and never resolves.
    pub const fn null() -> Self {
        Self::new(INDEX_SENTINEL, 0)
    }

    pub const fn is_null(&self) -> bool {
        self.index == INDEX_SENTINEL
    }

    /// Slot index this key refers to.
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time the key was issued.
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl Default for KeyData {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for KeyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "{}v{}", self.index, self.generation)
        }
    }
}

/// A typed key usable with `SlotMap`.
///
/// Implement it with [`new_key_type!`](crate::new_key_type) rather than by
/// hand.
pub trait Key: Copy + Eq + Ord + Hash + fmt::Debug + From<KeyData> {
    fn data(&self) -> KeyData;

    fn null() -> Self {
        KeyData::null().into()
    }

    fn is_null(&self) -> bool {
        self.data().is_null()
    }
}

/// Declares one or more key newtypes.
///
/// Distinct key types keep handles of one map from being used on another
/// map holding a different kind of entry.
///
/// ```
/// use packed_slotmap::{new_key_type, SlotMap};
///
/// new_key_type! {
///     pub struct EntityKey;
///     struct NodeKey;
/// }
///
/// let mut entities: SlotMap<&str, EntityKey> = SlotMap::with_key();
/// let k = entities.insert("player");
/// assert_eq!(entities[k], "player");
/// ```
#[macro_export]
macro_rules! new_key_type {
    ( $(#[$outer:meta])* $vis:vis struct $name:ident; $($rest:tt)* ) => {
        $(#[$outer])*
        #[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        #[repr(transparent)]
        $vis struct $name($crate::KeyData);

        impl ::core::convert::From<$crate::KeyData> for $name {
            fn from(data: $crate::KeyData) -> Self {
                $name(data)
            }
        }

        impl $crate::Key for $name {
            fn data(&self) -> $crate::KeyData {
                self.0
            }
        }

        $crate::new_key_type!($($rest)*);
    };

    () => {};
}

new_key_type! {
    /// Key type used by `SlotMap` unless another one is named.
    pub struct DefaultKey;
}
