//! Collision layer taxonomy and the generic bitmask container behind it.
//!
//! Queries carry a [`CollisionFilter`]; every world node carries a category
//! built from the same layers. A node passes a filter when the two masks
//! share at least one bit.

use num_traits::{One, PrimInt};

/// Trait implemented by user-defined flag enums.
///
/// The enum's discriminant (via `#[repr(u8)]`) determines the bit index.
/// The backing integer type is chosen via the associated `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // Equivalent to: 1 << index
        // NOTE: Ensure your `bit_index()` is < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A plain bitmask container over any primitive integer storage.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    // --- Single Tag Operations ---
    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    // --- Bulk Operations ---
    pub fn add_many<U: FlagBitmask<Storage = T> + Copy>(&mut self, tags: &[U]) {
        for &tag in tags {
            self.add(tag);
        }
    }

    pub fn remove_many<U: FlagBitmask<Storage = T> + Copy>(&mut self, tags: &[U]) {
        for &tag in tags {
            self.remove(tag);
        }
    }

    // --- Logic Gates ---
    pub fn has_all<U: FlagBitmask<Storage = T> + Copy>(&self, tags: &[U]) -> bool {
        if tags.is_empty() {
            return true;
        }
        let combined = tags.iter().fold(T::zero(), |acc, t| acc | t.mask());
        (self.bits & combined) == combined
    }

    pub fn has_any<U: FlagBitmask<Storage = T> + Copy>(&self, tags: &[U]) -> bool {
        if tags.is_empty() {
            return false;
        }
        let combined = tags.iter().fold(T::zero(), |acc, t| acc | t.mask());
        (self.bits & combined) != T::zero()
    }

    /// Whether the two masks share at least one set bit.
    ///
    /// This is the filter-vs-category test used by every collision query.
    pub fn intersects(&self, other: &BitmaskFlags<T>) -> bool {
        (self.bits & other.bits) != T::zero()
    }

    pub fn clear(&mut self) {
        self.bits = T::zero();
    }
}

/// Declare a bitmask-backed enum and implement `FlagBitmask` for it.
///
/// Example:
/// ```rust
/// locomotion::define_bitmask_flags!(SurfaceKind, u16, {
///     Rock,
///     Water,
///     Lava,
/// });
/// ```
#[macro_export]
macro_rules! define_bitmask_flags {
    ($name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $crate::mask::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

// Layer taxonomy: Character is the player volume, Level is the ground and
// walls, Trigger marks volumes that fire scripted actions, Collectable marks
// pickups (gems, keys).
define_bitmask_flags!(CollisionLayer, u16, {
    Character,
    Level,
    Enemy,
    Trigger,
    Collectable,
});

/// Filter carried by ray tests and convex sweeps.
pub type CollisionFilter = BitmaskFlags<u16>;

/// Build a [`CollisionFilter`] matching any of the given layers.
#[inline]
pub fn filter_of(layers: &[CollisionLayer]) -> CollisionFilter {
    let mut filter = CollisionFilter::default();
    filter.add_many(layers);
    filter
}
