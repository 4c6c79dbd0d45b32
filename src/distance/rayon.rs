//! Rayon-parallel distance updates (feature-gated).
//!
//! Each search offset owns its ring slice and total, and only reads the
//! shared plane, so offsets fan out across workers without synchronization.
//! Results are bit-identical to the sequential path; group admission still
//! runs afterwards in scan order.

use crate::distance::DistanceEngine;
use crate::plane::PaddedPlane;
use rayon::prelude::*;

/// Minimum number of offsets handed to one rayon task.
const RAYON_MIN_CHUNK_LEN: usize = 64;

impl DistanceEngine {
    /// Parallel variant of [`rebuild_row`](Self::rebuild_row).
    pub fn rebuild_row_par(&mut self, plane: &PaddedPlane, ref_x: usize, ref_y: usize) {
        let sampler = self.sampler(plane, ref_x, ref_y);
        let (geometry, rings, totals, offsets) = self.parts_mut();
        rings
            .par_chunks_mut(geometry.nbuf)
            .zip(totals.par_iter_mut())
            .zip(offsets.par_iter())
            .with_min_len(RAYON_MIN_CHUNK_LEN)
            .for_each(|((ring, total), &offset)| {
                geometry.rebuild(&sampler, offset, ring, total);
            });
        self.set_position(0);
    }

    /// Parallel variant of [`advance`](Self::advance).
    pub fn advance_par(&mut self, plane: &PaddedPlane, ref_x: usize, ref_y: usize) {
        let position = self.position() + 1;
        let sampler = self.sampler(plane, ref_x, ref_y);
        let (geometry, rings, totals, offsets) = self.parts_mut();
        rings
            .par_chunks_mut(geometry.nbuf)
            .zip(totals.par_iter_mut())
            .zip(offsets.par_iter())
            .with_min_len(RAYON_MIN_CHUNK_LEN)
            .for_each(|((ring, total), &offset)| {
                geometry.advance(&sampler, position, offset, ring, total);
            });
        self.set_position(position);
    }
}
