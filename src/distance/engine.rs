//! Incremental block-matching distances along one line of reference patches.
//!
//! The reference patch moves right by `step < patch_size` columns at a time,
//! so consecutive positions share most of their columns. For each offset the
//! distance is kept as a ring of `ceil(patch_size / step)` partial sums, one
//! per step-wide column chunk, plus their running total. Chunk `k` of the
//! line covers absolute columns `[k * step, (k + 1) * step)` and lives in ring
//! slot `k % nbuf`; the last chunk under the patch is usually partial.
//!
//! Moving from position `j - 1` to `j`:
//! - chunk `j - 1` leaves the patch and its slot is cleared;
//! - the previously partial chunk `j + nbuf - 2` gains its remaining columns;
//! - the new trailing chunk `j + nbuf - 1` takes the cleared slot.
//!
//! Each move therefore touches `step * patch_size` pixel pairs per offset
//! instead of `patch_size^2`. Rings are rebuilt from scratch at the start of
//! every line.

use crate::distance::{DistanceMetric, SearchWindow};
use crate::plane::PaddedPlane;
use std::ops::Range;

/// Per-offset incremental distances for the current reference patch.
#[derive(Clone, Debug)]
pub struct DistanceEngine {
    geometry: RingGeometry,
    metric: DistanceMetric,
    offsets: Vec<(isize, isize)>,
    rings: Vec<u64>,
    totals: Vec<u64>,
    position: usize,
}

impl DistanceEngine {
    /// Creates an engine for `window` with patches advancing by `step`.
    ///
    /// `step` must be in `1..patch_size`; [`Bm3dConfig::validate`] enforces it.
    ///
    /// [`Bm3dConfig::validate`]: crate::Bm3dConfig::validate
    pub fn new(
        window: &SearchWindow,
        patch_size: usize,
        step: usize,
        metric: DistanceMetric,
    ) -> Self {
        debug_assert!(step > 0 && step < patch_size);
        let geometry = RingGeometry::new(patch_size, step);
        let offsets = window.offsets();
        Self {
            rings: vec![0; offsets.len() * geometry.nbuf],
            totals: vec![0; offsets.len()],
            geometry,
            metric,
            offsets,
            position: 0,
        }
    }

    /// Search offsets in scan order; `totals()[i]` belongs to `offsets()[i]`.
    pub fn offsets(&self) -> &[(isize, isize)] {
        &self.offsets
    }

    /// Distances of the current reference patch to every offset.
    pub fn totals(&self) -> &[u64] {
        &self.totals
    }

    /// Index of the current reference patch along the line.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Recomputes every ring for the first reference patch of a line, whose
    /// top-left corner is `(ref_x, ref_y)` in padded coordinates.
    pub fn rebuild_row(&mut self, plane: &PaddedPlane, ref_x: usize, ref_y: usize) {
        let sampler = self.sampler(plane, ref_x, ref_y);
        let geometry = self.geometry;
        let nbuf = geometry.nbuf;
        for ((ring, total), &offset) in self
            .rings
            .chunks_exact_mut(nbuf)
            .zip(self.totals.iter_mut())
            .zip(self.offsets.iter())
        {
            geometry.rebuild(&sampler, offset, ring, total);
        }
        self.position = 0;
    }

    /// Slides the reference patch one step right, to `(ref_x, ref_y)`.
    pub fn advance(&mut self, plane: &PaddedPlane, ref_x: usize, ref_y: usize) {
        self.position += 1;
        let sampler = self.sampler(plane, ref_x, ref_y);
        let geometry = self.geometry;
        let position = self.position;
        for ((ring, total), &offset) in self
            .rings
            .chunks_exact_mut(geometry.nbuf)
            .zip(self.totals.iter_mut())
            .zip(self.offsets.iter())
        {
            geometry.advance(&sampler, position, offset, ring, total);
        }
    }

    /// Distance between the patch at `(ref_x, ref_y)` and the one at
    /// `(ref_x + dx, ref_y + dy)`, computed from scratch.
    pub fn full_distance(
        &self,
        plane: &PaddedPlane,
        ref_x: usize,
        ref_y: usize,
        offset: (isize, isize),
    ) -> u64 {
        let sampler = self.sampler(plane, ref_x, ref_y);
        sampler.columns(offset, 0..self.geometry.patch_size)
    }

    pub(super) fn sampler<'a>(
        &self,
        plane: &'a PaddedPlane,
        ref_x: usize,
        ref_y: usize,
    ) -> Sampler<'a> {
        Sampler {
            plane,
            metric: self.metric,
            patch_size: self.geometry.patch_size,
            ref_x,
            ref_y,
        }
    }

    pub(super) fn parts_mut(
        &mut self,
    ) -> (RingGeometry, &mut [u64], &mut [u64], &[(isize, isize)]) {
        (
            self.geometry,
            &mut self.rings,
            &mut self.totals,
            &self.offsets,
        )
    }

    pub(super) fn set_position(&mut self, position: usize) {
        self.position = position;
    }
}

/// Read-only view of the reference patch used by distance workers.
#[derive(Copy, Clone)]
pub(super) struct Sampler<'a> {
    plane: &'a PaddedPlane,
    metric: DistanceMetric,
    patch_size: usize,
    ref_x: usize,
    ref_y: usize,
}

impl Sampler<'_> {
    /// Distance restricted to patch-relative columns `cols`.
    fn columns(&self, (dx, dy): (isize, isize), cols: Range<usize>) -> u64 {
        if cols.is_empty() {
            return 0;
        }
        let cand_x = self.ref_x.wrapping_add_signed(dx);
        let cand_y = self.ref_y.wrapping_add_signed(dy);
        let mut sum = 0u64;
        for r in 0..self.patch_size {
            let a = &self.plane.row(self.ref_y + r)[self.ref_x + cols.start..self.ref_x + cols.end];
            let b = &self.plane.row(cand_y + r)[cand_x + cols.start..cand_x + cols.end];
            for (&p, &q) in a.iter().zip(b) {
                sum += self.metric.eval(p, q);
            }
        }
        sum
    }
}

/// Chunk layout of the per-offset ring.
#[derive(Copy, Clone, Debug)]
pub(super) struct RingGeometry {
    patch_size: usize,
    step: usize,
    pub(super) nbuf: usize,
}

impl RingGeometry {
    fn new(patch_size: usize, step: usize) -> Self {
        Self {
            patch_size,
            step,
            nbuf: patch_size.div_ceil(step),
        }
    }

    /// Patch-relative columns `[ps - step, (nbuf - 1) * step)` that complete
    /// the formerly partial chunk. Empty when `step` divides `patch_size`.
    fn completion(&self) -> Range<usize> {
        self.patch_size - self.step..(self.nbuf - 1) * self.step
    }

    /// Patch-relative columns of the trailing (possibly partial) chunk.
    fn trailing(&self) -> Range<usize> {
        (self.nbuf - 1) * self.step..self.patch_size
    }

    pub(super) fn rebuild(
        &self,
        sampler: &Sampler<'_>,
        offset: (isize, isize),
        ring: &mut [u64],
        total: &mut u64,
    ) {
        *total = 0;
        for (k, slot) in ring.iter_mut().enumerate() {
            let start = k * self.step;
            let end = (start + self.step).min(self.patch_size);
            *slot = sampler.columns(offset, start..end);
            *total += *slot;
        }
    }

    pub(super) fn advance(
        &self,
        sampler: &Sampler<'_>,
        position: usize,
        offset: (isize, isize),
        ring: &mut [u64],
        total: &mut u64,
    ) {
        debug_assert!(position > 0);
        let nbuf = self.nbuf;
        let evicted = (position - 1) % nbuf;
        *total -= ring[evicted];
        ring[evicted] = 0;

        let rest = sampler.columns(offset, self.completion());
        ring[(position + nbuf - 2) % nbuf] += rest;
        *total += rest;

        let tail = sampler.columns(offset, self.trailing());
        ring[(position + nbuf - 1) % nbuf] = tail;
        *total += tail;
    }
}

#[cfg(test)]
mod tests {
    use super::DistanceEngine;
    use crate::distance::{DistanceMetric, SearchWindow};
    use crate::plane::{OwnedPlane, PaddedPlane};

    fn textured_plane(width: usize, height: usize, step: usize, radius: usize) -> PaddedPlane {
        let data: Vec<u16> = (0..width * height)
            .map(|i| ((i * 7919 + (i / width) * 31) % 251) as u16)
            .collect();
        let src = OwnedPlane::new(data, width, height).unwrap();
        let mut plane = PaddedPlane::new(width, height, 8, step, radius, radius).unwrap();
        plane.fill(src.view()).unwrap();
        plane
    }

    #[test]
    fn incremental_totals_match_full_recompute() {
        for step in 1..8 {
            for metric in [DistanceMetric::SquaredL2, DistanceMetric::AbsoluteL1] {
                let radius = 3;
                let plane = textured_plane(29, 12, step, radius);
                let window = SearchWindow::square(radius);
                let mut engine = DistanceEngine::new(&window, 8, step, metric);
                let ref_y = radius + 2;
                let mut ref_x = radius;
                engine.rebuild_row(&plane, ref_x, ref_y);
                loop {
                    for (i, &offset) in engine.offsets().iter().enumerate() {
                        let full = engine.full_distance(&plane, ref_x, ref_y, offset);
                        assert_eq!(engine.totals()[i], full, "step {step} x {ref_x} {offset:?}");
                    }
                    if ref_x + step + 8 + radius > plane.width() {
                        break;
                    }
                    ref_x += step;
                    engine.advance(&plane, ref_x, ref_y);
                }
            }
        }
    }

    #[test]
    fn self_offset_has_zero_distance() {
        let plane = textured_plane(16, 16, 3, 2);
        let engine_window = SearchWindow::square(2);
        let mut engine = DistanceEngine::new(&engine_window, 8, 3, DistanceMetric::SquaredL2);
        engine.rebuild_row(&plane, 2, 2);
        let center = engine
            .offsets()
            .iter()
            .position(|&o| o == (0, 0))
            .unwrap();
        assert_eq!(engine.totals()[center], 0);
    }
}
