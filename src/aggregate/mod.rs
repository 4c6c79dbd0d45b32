//! Weighted overlap-add of filtered groups.
//!
//! The [`Accumulator`] holds numerator and denominator planes for a window of
//! `patch_size + 2 * radius_v` rows of the padded image. Rows leave the window
//! from the top once no reference patch can touch them any more.

pub(crate) mod kaiser;

use crate::group::GroupSelector;
use crate::transform::{Coefficient, PATCH_SIZE};

/// Rolling numerator/denominator window.
#[derive(Clone, Debug)]
pub struct Accumulator<C: Coefficient> {
    numerator: Vec<C::Accum>,
    denominator: Vec<C::Accum>,
    width: usize,
    rows: usize,
}

impl<C: Coefficient> Accumulator<C> {
    /// Allocates a zeroed `width x rows` window.
    pub fn new(width: usize, rows: usize) -> Self {
        Self {
            numerator: vec![Default::default(); width * rows],
            denominator: vec![Default::default(); width * rows],
            width,
            rows,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn clear(&mut self) {
        self.numerator.fill(Default::default());
        self.denominator.fill(Default::default());
    }

    /// Adds `window * weight * value` and `window * weight` for every member
    /// of `group`. The reference patch's top-left corner sits at window
    /// coordinates `(ref_x, ref_y)`; members are placed at their offsets.
    pub fn add_group(
        &mut self,
        group: &GroupSelector<C>,
        weight: C::Accum,
        ref_x: usize,
        ref_y: usize,
    ) {
        let window = C::kaiser();
        let mut weighted = [Default::default(); PATCH_SIZE * PATCH_SIZE];
        for (w, &k) in weighted.iter_mut().zip(window.iter()) {
            *w = k * weight;
        }
        for patch in group.members() {
            let x = ref_x.wrapping_add_signed(patch.dx);
            let y = ref_y.wrapping_add_signed(patch.dy);
            debug_assert!(x + PATCH_SIZE <= self.width && y + PATCH_SIZE <= self.rows);
            for r in 0..PATCH_SIZE {
                let start = (y + r) * self.width + x;
                let num = &mut self.numerator[start..start + PATCH_SIZE];
                let den = &mut self.denominator[start..start + PATCH_SIZE];
                let src = &patch.values[r * PATCH_SIZE..(r + 1) * PATCH_SIZE];
                let kw = &weighted[r * PATCH_SIZE..(r + 1) * PATCH_SIZE];
                for c in 0..PATCH_SIZE {
                    num[c] += kw[c] * src[c].widen();
                    den[c] += kw[c];
                }
            }
        }
    }

    /// Resolves window row `row`, columns `x0..x0 + out.len()`, into samples.
    pub fn resolve_row(&self, row: usize, x0: usize, out: &mut [u16], max: u16) {
        let start = row * self.width + x0;
        let num = &self.numerator[start..start + out.len()];
        let den = &self.denominator[start..start + out.len()];
        for ((o, &n), &d) in out.iter_mut().zip(num).zip(den) {
            *o = C::resolve(n, d, max);
        }
    }

    /// Accumulated weight at window coordinates `(x, y)`.
    pub fn weight_at(&self, x: usize, y: usize) -> C::Accum {
        self.denominator[y * self.width + x]
    }

    /// Drops the top `rows` rows, moves the rest up and zeroes the tail.
    pub fn shift_up(&mut self, rows: usize) {
        let rows = rows.min(self.rows);
        let moved = rows * self.width;
        let len = self.numerator.len();
        self.numerator.copy_within(moved.., 0);
        self.denominator.copy_within(moved.., 0);
        self.numerator[len - moved..].fill(Default::default());
        self.denominator[len - moved..].fill(Default::default());
    }
}
