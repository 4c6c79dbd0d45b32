//! Patch dissimilarity over a search window.
//!
//! [`DistanceEngine`] keeps, for every search offset, the distance between the
//! current reference patch and the candidate at that offset. Distances are
//! maintained incrementally as the reference patch slides along a line; with
//! the `rayon` feature the per-offset updates can fan out across threads.

mod engine;
#[cfg(feature = "rayon")]
mod rayon;

pub use engine::DistanceEngine;

/// Per-pixel distance function, selected once per run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Sum of squared differences.
    #[default]
    SquaredL2,
    /// Sum of absolute differences.
    AbsoluteL1,
}

impl DistanceMetric {
    #[inline]
    pub fn eval(self, a: u16, b: u16) -> u64 {
        let d = u64::from(a.abs_diff(b));
        match self {
            Self::SquaredL2 => d * d,
            Self::AbsoluteL1 => d,
        }
    }
}

/// Rectangular search window around the reference patch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchWindow {
    /// Horizontal radius in pixels.
    pub radius_h: usize,
    /// Horizontal sampling step.
    pub step_h: usize,
    /// Vertical radius in pixels.
    pub radius_v: usize,
    /// Vertical sampling step.
    pub step_v: usize,
}

impl Default for SearchWindow {
    fn default() -> Self {
        Self {
            radius_h: 16,
            step_h: 1,
            radius_v: 16,
            step_v: 1,
        }
    }
}

impl SearchWindow {
    /// Square window with unit steps.
    pub fn square(radius: usize) -> Self {
        Self {
            radius_h: radius,
            step_h: 1,
            radius_v: radius,
            step_v: 1,
        }
    }

    /// Offsets `(dx, dy)` in row-major order, including `(0, 0)`.
    ///
    /// Both axes run from `-radius` to `+radius` in steps; the scan order is
    /// fixed so group tie-breaking is reproducible.
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        let rh = self.radius_h as isize;
        let rv = self.radius_v as isize;
        let mut out = Vec::with_capacity(self.len());
        for dy in (-rv..=rv).step_by(self.step_v.max(1)) {
            for dx in (-rh..=rh).step_by(self.step_h.max(1)) {
                out.push((dx, dy));
            }
        }
        out
    }

    /// Number of offsets produced by [`offsets`](Self::offsets).
    pub fn len(&self) -> usize {
        let nh = 2 * self.radius_h / self.step_h.max(1) + 1;
        let nv = 2 * self.radius_v / self.step_v.max(1) + 1;
        nh * nv
    }

    /// True when the only offset is the reference position itself.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}
