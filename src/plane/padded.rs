//! Padded working plane used by the line scheduler.
//!
//! Layout (per axis): a zero border of the search radius on both sides, the
//! original samples, and an edge-replicated tail that makes
//! `(len + pad - patch_size)` a multiple of the patch step. Reference patches
//! therefore tile the padded content exactly, and every candidate in the
//! search window of a reference patch lies inside the buffer.

use crate::plane::PlaneView;
use crate::util::math::step_alignment_pad;
use crate::util::{Bm3dError, Bm3dResult};

/// Padded plane with a zero search border and edge-replicated step padding.
#[derive(Clone, Debug)]
pub struct PaddedPlane {
    data: Vec<u16>,
    width: usize,
    height: usize,
    orig_width: usize,
    orig_height: usize,
    pad_width: usize,
    pad_height: usize,
    border_h: usize,
    border_v: usize,
}

impl PaddedPlane {
    /// Allocates a zeroed plane for an `orig_width x orig_height` input.
    pub fn new(
        orig_width: usize,
        orig_height: usize,
        patch_size: usize,
        patch_step: usize,
        border_h: usize,
        border_v: usize,
    ) -> Bm3dResult<Self> {
        if orig_width < patch_size || orig_height < patch_size {
            return Err(Bm3dError::ImageSmallerThanPatch {
                width: orig_width,
                height: orig_height,
                patch_size,
            });
        }
        if patch_step == 0 || patch_step >= patch_size {
            return Err(Bm3dError::InvalidPatchStep {
                step: patch_step,
                patch_size,
            });
        }
        let pad_width = step_alignment_pad(orig_width, patch_size, patch_step);
        let pad_height = step_alignment_pad(orig_height, patch_size, patch_step);
        let width = orig_width + pad_width + 2 * border_h;
        let height = orig_height + pad_height + 2 * border_v;
        let len = width
            .checked_mul(height)
            .ok_or(Bm3dError::InvalidDimensions { width, height })?;
        Ok(Self {
            data: vec![0; len],
            width,
            height,
            orig_width,
            orig_height,
            pad_width,
            pad_height,
            border_h,
            border_v,
        })
    }

    /// Copies `src` into the interior and rebuilds the step padding.
    ///
    /// The zero border is left untouched; it is written once at allocation.
    pub fn fill(&mut self, src: PlaneView<'_, u16>) -> Bm3dResult<()> {
        if src.width() != self.orig_width || src.height() != self.orig_height {
            return Err(Bm3dError::PlaneSizeMismatch {
                channel: 0,
                width: src.width(),
                height: src.height(),
                expected_width: self.orig_width,
                expected_height: self.orig_height,
            });
        }
        let content_w = self.orig_width + self.pad_width;
        for y in 0..self.orig_height {
            let row = src.row(y).ok_or(Bm3dError::InvalidDimensions {
                width: src.width(),
                height: src.height(),
            })?;
            let start = (y + self.border_v) * self.width + self.border_h;
            let dst = &mut self.data[start..start + content_w];
            dst[..self.orig_width].copy_from_slice(row);
            let edge = row[self.orig_width - 1];
            dst[self.orig_width..].fill(edge);
        }
        let last = (self.border_v + self.orig_height - 1) * self.width + self.border_h;
        for y in 0..self.pad_height {
            let start = (self.border_v + self.orig_height + y) * self.width + self.border_h;
            self.data.copy_within(last..last + content_w, start);
        }
        Ok(())
    }

    /// Full padded width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Full padded height.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn orig_width(&self) -> usize {
        self.orig_width
    }

    pub fn orig_height(&self) -> usize {
        self.orig_height
    }

    /// Step-alignment padding `(columns, rows)`.
    pub fn step_pad(&self) -> (usize, usize) {
        (self.pad_width, self.pad_height)
    }

    /// Zero border `(horizontal, vertical)`, equal to the search radii.
    pub fn border(&self) -> (usize, usize) {
        (self.border_h, self.border_v)
    }

    /// Returns padded row `y`.
    #[inline]
    pub fn row(&self, y: usize) -> &[u16] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Returns the sample at padded coordinates `(x, y)`.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> u16 {
        self.data[y * self.width + x]
    }

    /// Borrowed view over the whole padded buffer.
    pub fn view(&self) -> PlaneView<'_, u16> {
        PlaneView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PaddedPlane;
    use crate::plane::OwnedPlane;

    #[test]
    fn border_is_zero_and_tail_replicates_edges() {
        // 9x9 input, patch 8, step 3: one column and row of step padding.
        let data: Vec<u16> = (0..81).map(|v| v + 1).collect();
        let src = OwnedPlane::new(data, 9, 9).unwrap();
        let mut plane = PaddedPlane::new(9, 9, 8, 3, 2, 1).unwrap();
        plane.fill(src.view()).unwrap();

        assert_eq!(plane.step_pad(), (2, 2));
        assert_eq!(plane.width(), 9 + 2 + 4);
        assert_eq!(plane.height(), 9 + 2 + 2);
        assert!(plane.row(0).iter().all(|&v| v == 0));
        assert_eq!(plane.at(0, 1), 0);
        assert_eq!(plane.at(2, 1), 1);
        // Replicated right edge of the first row.
        assert_eq!(plane.at(2 + 8, 1), 9);
        assert_eq!(plane.at(2 + 10, 1), 9);
        // Replicated bottom rows copy the last row, including its tail.
        assert_eq!(plane.at(2, 1 + 10), 73);
        assert_eq!(plane.at(2 + 10, 1 + 10), 81);
        assert_eq!(plane.at(plane.width() - 1, 5), 0);
    }

    #[test]
    fn rejects_tiny_inputs_and_bad_steps() {
        assert!(PaddedPlane::new(7, 16, 8, 3, 0, 0).is_err());
        assert!(PaddedPlane::new(16, 16, 8, 8, 0, 0).is_err());
    }
}
