//! Bior-1.5 8x8 wavelet transform in both numeric modes.
//!
//! Forward: the 8-point Bior-1.5 lifting matrix (scaled by `64 * sqrt(2)`)
//! over rows then columns, then a Haar level on the top-left 4x4 and another
//! on the top-left 2x2. The inverse runs the same stages in reverse order,
//! columns before rows.
//!
//! The integer kernel keeps one fractional bit in its coefficients (they are
//! twice the floating-point ones). Intermediate sums need 18 bits on top of
//! the sample depth, which bounds fixed-point input to 12-bit samples.

use super::{BlockTransform, Coefficient, PATCH_AREA, PATCH_SIZE};

/// Bior-1.5 transform with stack-local scratch.
#[derive(Copy, Clone, Debug, Default)]
pub struct Bior15;

/// Log2 of the squared 8-point gain `(64 * sqrt(2))^2 = 8192`.
const GAIN_SHIFT: u32 = 13;

impl<C: Coefficient> BlockTransform<C> for Bior15 {
    fn coeff_frac_bits(&self) -> u32 {
        u32::from(C::FIXED)
    }

    fn forward(&self, block: &mut [C; PATCH_AREA]) {
        rows(block, PATCH_SIZE, fwd8);
        cols(block, PATCH_SIZE, fwd8);
        rows(block, 4, haar4);
        cols(block, 4, |s| halve(haar4(s)));
        rows(block, 2, haar2);
        cols(block, 2, |s| halve(haar2(s)));
        let shift = GAIN_SHIFT - <Self as BlockTransform<C>>::coeff_frac_bits(self);
        for v in block.iter_mut() {
            *v = v.descale(shift);
        }
    }

    fn inverse(&self, block: &mut [C; PATCH_AREA]) {
        cols(block, 2, haar2);
        rows(block, 2, |s| halve(haar2(s)));
        cols(block, 4, inv_haar4);
        rows(block, 4, |s| halve(inv_haar4(s)));
        cols(block, PATCH_SIZE, inv8);
        rows(block, PATCH_SIZE, inv8);
        let shift = GAIN_SHIFT + <Self as BlockTransform<C>>::coeff_frac_bits(self);
        for v in block.iter_mut() {
            *v = v.descale(shift);
        }
    }
}

fn rows<C: Coefficient, const N: usize>(
    block: &mut [C; PATCH_AREA],
    n: usize,
    f: impl Fn([C; N]) -> [C; N],
) {
    debug_assert_eq!(n, N);
    for r in 0..N {
        let base = r * PATCH_SIZE;
        let mut lane = [C::zero(); N];
        lane.copy_from_slice(&block[base..base + N]);
        block[base..base + N].copy_from_slice(&f(lane));
    }
}

fn cols<C: Coefficient, const N: usize>(
    block: &mut [C; PATCH_AREA],
    n: usize,
    f: impl Fn([C; N]) -> [C; N],
) {
    debug_assert_eq!(n, N);
    for c in 0..N {
        let mut lane = [C::zero(); N];
        for (r, v) in lane.iter_mut().enumerate() {
            *v = block[r * PATCH_SIZE + c];
        }
        for (r, v) in f(lane).into_iter().enumerate() {
            block[r * PATCH_SIZE + c] = v;
        }
    }
}

#[inline]
fn halve<C: Coefficient, const N: usize>(lane: [C; N]) -> [C; N] {
    lane.map(|v| v.descale(1))
}

#[inline]
fn fwd8<C: Coefficient>(s: [C; 8]) -> [C; 8] {
    let k64 = C::lit(64);
    let k11 = C::lit(11);
    let b0 = s[0] - s[1];
    let b1 = s[2] - s[3];
    let b2 = s[4] - s[5];
    let b3 = s[6] - s[7];
    [
        k64 * (s[0] + s[1]) + k11 * (b1 - b3),
        k64 * (s[2] + s[3]) + k11 * (b2 - b0),
        k64 * (s[4] + s[5]) + k11 * (b3 - b1),
        k64 * (s[6] + s[7]) + k11 * (b0 - b2),
        k64 * b0,
        k64 * b1,
        k64 * b2,
        k64 * b3,
    ]
}

#[inline]
fn inv8<C: Coefficient>(s: [C; 8]) -> [C; 8] {
    let k64 = C::lit(64);
    let k11 = C::lit(11);
    let e = k11 * (s[5] - s[7]);
    let f = k11 * (s[6] - s[4]);
    [
        k64 * (s[0] + s[4]) - e,
        k64 * (s[0] - s[4]) - e,
        k64 * (s[1] + s[5]) - f,
        k64 * (s[1] - s[5]) - f,
        k64 * (s[2] + s[6]) + e,
        k64 * (s[2] - s[6]) + e,
        k64 * (s[3] + s[7]) + f,
        k64 * (s[3] - s[7]) + f,
    ]
}

#[inline]
fn haar4<C: Coefficient>(s: [C; 4]) -> [C; 4] {
    [s[0] + s[1], s[2] + s[3], s[0] - s[1], s[2] - s[3]]
}

#[inline]
fn inv_haar4<C: Coefficient>(s: [C; 4]) -> [C; 4] {
    [s[0] + s[2], s[0] - s[2], s[1] + s[3], s[1] - s[3]]
}

#[inline]
fn haar2<C: Coefficient>(s: [C; 2]) -> [C; 2] {
    [s[0] + s[1], s[0] - s[1]]
}
