//! Integer helpers for padding, group sizing and fixed-point rounding.

/// Returns `floor(log2(n))` for `n >= 1`, and 0 for `n == 0`.
pub(crate) fn floor_log2(n: usize) -> u32 {
    if n == 0 {
        0
    } else {
        usize::BITS - 1 - n.leading_zeros()
    }
}

/// Right shift with round-to-nearest (half-unit bias added before the shift).
#[inline]
pub(crate) fn round_shift(value: i32, shift: u32) -> i32 {
    if shift == 0 {
        value
    } else {
        (value + (1 << (shift - 1))) >> shift
    }
}

/// Divides `num` by a positive `den`, rounding half up.
#[inline]
pub(crate) fn div_round(num: i64, den: i64) -> i64 {
    debug_assert!(den > 0);
    (2 * num + den).div_euclid(2 * den)
}

/// Extra columns (or rows) needed so that `(len + pad - patch)` is a multiple of `step`.
pub(crate) fn step_alignment_pad(len: usize, patch: usize, step: usize) -> usize {
    debug_assert!(len >= patch && step > 0);
    (len - patch).div_ceil(step) * step + patch - len
}
