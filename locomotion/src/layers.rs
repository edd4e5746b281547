use num_traits::{One, PrimInt};
use serde::{Deserialize, Serialize};

/// Trait implemented by user-defined collision layer enums.
///
/// The enum's discriminant (via `#[repr(u8)]`) typically determines the bit index.
pub trait CollisionLayer {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must stay below the bit width of `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// Set of collision layers a cast is allowed to hit.
///
/// Backends compare this against the membership bits of each collider: a collider is
/// considered when the two share at least one bit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask<T: PrimInt = u32> {
    pub bits: T,
}

impl<T: PrimInt> Default for LayerMask<T> {
    fn default() -> Self {
        Self::all()
    }
}

impl<T: PrimInt> LayerMask<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn all() -> Self {
        Self { bits: !T::zero() }
    }

    pub fn none() -> Self {
        Self { bits: T::zero() }
    }

    pub fn with<U: CollisionLayer<Storage = T>>(mut self, layer: U) -> Self {
        self.add(layer);
        self
    }

    pub fn add<U: CollisionLayer<Storage = T>>(&mut self, layer: U) {
        self.bits = self.bits | layer.mask();
    }

    pub fn remove<U: CollisionLayer<Storage = T>>(&mut self, layer: U) {
        self.bits = self.bits & !layer.mask();
    }

    pub fn has<U: CollisionLayer<Storage = T>>(&self, layer: U) -> bool {
        (self.bits & layer.mask()) != T::zero()
    }

    /// Whether a collider with the given membership bits passes this filter.
    pub fn accepts(&self, memberships: T) -> bool {
        (self.bits & memberships) != T::zero()
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }
}

/// Declare a layer enum and implement `CollisionLayer` for it.
///
/// Example:
/// ```rust
/// locomotion::define_collision_layers!(WorldLayer, u32, {
///     Terrain,
///     Platforms,
///     Characters,
/// });
/// ```
#[macro_export]
macro_rules! define_collision_layers {
    ($name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $crate::layers::CollisionLayer for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}
