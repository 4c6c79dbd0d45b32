//! Patch slots and distance-sorted group selection.

mod selector;

pub use selector::GroupSelector;

use crate::transform::{Coefficient, PATCH_AREA};

/// One group member: offset to the reference patch, distance and samples.
///
/// `values` holds pixel samples after materialization and transform
/// coefficients while the group is being filtered.
#[derive(Clone, Debug)]
pub struct Patch<C> {
    /// Horizontal offset of the patch relative to its reference patch.
    pub dx: isize,
    /// Vertical offset of the patch relative to its reference patch.
    pub dy: isize,
    /// Dissimilarity to the reference patch.
    pub dist: u64,
    pub values: [C; PATCH_AREA],
}

impl<C: Coefficient> Default for Patch<C> {
    fn default() -> Self {
        Self {
            dx: 0,
            dy: 0,
            dist: 0,
            values: [C::default(); PATCH_AREA],
        }
    }
}

impl<C> Patch<C> {
    /// Returns true for the reference patch itself.
    pub fn is_reference(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}
