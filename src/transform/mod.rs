//! Numeric modes and the transforms applied to a group.
//!
//! A group is filtered in the transform domain: every patch goes through the
//! 2D [`BlockTransform`] and the stack of patches is then decorrelated along
//! the group axis by the Walsh-Hadamard butterfly in [`hadamard`].
//!
//! The [`Coefficient`] trait abstracts over the two numeric modes:
//! - `i32`: fixed point, exact rounding via half-unit bias before right shifts,
//!   `i64` accumulators.
//! - `f32`: floating point, `f64` accumulators.

use crate::aggregate::kaiser::{KAISER_FIXED, KAISER_FLOAT};
use crate::util::math::{div_round, round_shift};
use num_traits::{NumAssign, Signed};
use std::fmt::Debug;

mod bior;
pub mod hadamard;

pub use bior::Bior15;

/// Patch side length supported by the block transform.
pub const PATCH_SIZE: usize = 8;
/// Number of samples in one patch.
pub const PATCH_AREA: usize = PATCH_SIZE * PATCH_SIZE;

/// Multiplier applied to sigma to obtain the hard threshold.
pub const HARD_THRESHOLD_MULTIPLIER: f64 = 2.7;

/// `32 * sqrt(N)` for `N = 2^i`, compensating the unnormalized butterfly gain.
const SQRT_GROUP_GAIN_X32: [i32; 8] = [32, 45, 64, 90, 128, 180, 256, 360];

/// Fixed-point weights are expressed in units of `1 / FIXED_WEIGHT_ONE`.
pub const FIXED_WEIGHT_ONE: i64 = 1 << 16;

/// Scalar type of transform coefficients for one numeric mode.
pub trait Coefficient:
    Copy + Default + Debug + PartialOrd + Send + Sync + Signed + NumAssign + 'static
{
    /// Wide type for numerator/denominator accumulation.
    type Accum: Copy + Default + Debug + PartialOrd + Send + Sync + NumAssign + 'static;

    /// True for integer (fixed-point) arithmetic.
    const FIXED: bool;

    /// Converts a small integer constant.
    fn lit(v: i32) -> Self;

    /// Converts an input sample.
    fn from_sample(sample: u16) -> Self;

    /// Divides by `2^shift`, rounding to nearest in fixed point.
    fn descale(self, shift: u32) -> Self;

    fn to_f64(self) -> f64;

    /// Converts back from `f64`, truncating toward zero in fixed point.
    fn from_f64(v: f64) -> Self;

    fn widen(self) -> Self::Accum;

    /// Separable aggregation window for an 8x8 patch.
    fn kaiser() -> &'static [Self::Accum; PATCH_AREA];

    /// Converts a group weight (1.0 = unit weight) into the accumulator domain.
    fn group_weight(w: f64) -> Self::Accum;

    /// Base hard threshold `2.7 * sigma`, scaled to the coefficient domain.
    fn hard_threshold(sigma: f64, frac_bits: u32) -> Self;

    /// Scales a base threshold by `sqrt(N)` for a group of `N = 2^log_n` patches.
    fn scale_threshold(self, log_n: u32) -> Self;

    /// Turns an accumulated pixel into an output sample in `[0, max]`.
    fn resolve(num: Self::Accum, den: Self::Accum, max: u16) -> u16;
}

impl Coefficient for i32 {
    type Accum = i64;
    const FIXED: bool = true;

    #[inline]
    fn lit(v: i32) -> Self {
        v
    }

    #[inline]
    fn from_sample(sample: u16) -> Self {
        i32::from(sample)
    }

    #[inline]
    fn descale(self, shift: u32) -> Self {
        round_shift(self, shift)
    }

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as i32
    }

    #[inline]
    fn widen(self) -> i64 {
        i64::from(self)
    }

    fn kaiser() -> &'static [i64; PATCH_AREA] {
        &KAISER_FIXED
    }

    fn group_weight(w: f64) -> i64 {
        ((w * FIXED_WEIGHT_ONE as f64).round() as i64).max(1)
    }

    fn hard_threshold(sigma: f64, frac_bits: u32) -> Self {
        // Saturates at i32::MAX for very large sigma.
        let base = (HARD_THRESHOLD_MULTIPLIER * sigma) as i64;
        base.saturating_mul(1 << frac_bits).min(i64::from(i32::MAX)) as i32
    }

    fn scale_threshold(self, log_n: u32) -> Self {
        let scaled = i64::from(self) * SQRT_GROUP_GAIN_X32[log_n as usize] as i64 / 32;
        scaled.min(i64::from(i32::MAX)) as i32
    }

    fn resolve(num: i64, den: i64, max: u16) -> u16 {
        debug_assert!(den > 0, "pixel received no aggregation weight");
        if den <= 0 {
            return 0;
        }
        div_round(num, den).clamp(0, i64::from(max)) as u16
    }
}

impl Coefficient for f32 {
    type Accum = f64;
    const FIXED: bool = false;

    #[inline]
    fn lit(v: i32) -> Self {
        v as f32
    }

    #[inline]
    fn from_sample(sample: u16) -> Self {
        f32::from(sample)
    }

    #[inline]
    fn descale(self, shift: u32) -> Self {
        self / (1u32 << shift) as f32
    }

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn widen(self) -> f64 {
        f64::from(self)
    }

    fn kaiser() -> &'static [f64; PATCH_AREA] {
        &KAISER_FLOAT
    }

    fn group_weight(w: f64) -> f64 {
        w
    }

    fn hard_threshold(sigma: f64, frac_bits: u32) -> Self {
        (HARD_THRESHOLD_MULTIPLIER * sigma * f64::from(1u32 << frac_bits)) as f32
    }

    fn scale_threshold(self, log_n: u32) -> Self {
        self * SQRT_GROUP_GAIN_X32[log_n as usize] as f32 / 32.0
    }

    fn resolve(num: f64, den: f64, max: u16) -> u16 {
        debug_assert!(den > 0.0, "pixel received no aggregation weight");
        if den <= 0.0 {
            return 0;
        }
        (num / den + 0.5).floor().clamp(0.0, f64::from(max)) as u16
    }
}

/// Wiener shrinkage threshold `sigma^2 * 4^frac_bits`.
pub fn wiener_threshold(sigma: f64, frac_bits: u32) -> f64 {
    sigma * sigma * f64::from(1u32 << (2 * frac_bits))
}

/// Separable, invertible 2D transform over one 8x8 patch.
///
/// Implementations must be reentrant: no shared scratch, so distance workers
/// and filtering can run on different threads.
pub trait BlockTransform<C: Coefficient>: Send + Sync {
    /// Fractional bits carried by forward coefficients in fixed point.
    fn coeff_frac_bits(&self) -> u32;

    fn forward(&self, block: &mut [C; PATCH_AREA]);

    fn inverse(&self, block: &mut [C; PATCH_AREA]);
}
