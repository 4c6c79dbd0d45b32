//! 8x8 Kaiser-style aggregation windows.

/// Integer window used in fixed point.
#[rustfmt::skip]
pub(crate) const KAISER_FIXED: [i64; 64] = [
    3,  5,  6,  7,  7,  6,  5, 3,
    5,  7,  9, 10, 10,  9,  7, 5,
    6,  9, 12, 13, 13, 12,  9, 6,
    7, 10, 13, 15, 15, 13, 10, 7,
    7, 10, 13, 15, 15, 13, 10, 7,
    6,  9, 12, 13, 13, 12,  9, 6,
    5,  7,  9, 10, 10,  9,  7, 5,
    3,  5,  6,  7,  7,  6,  5, 3,
];

/// Floating-point window.
#[rustfmt::skip]
pub(crate) const KAISER_FLOAT: [f64; 64] = [
    0.1924, 0.2989, 0.3846, 0.4325, 0.4325, 0.3845, 0.2989, 0.1924,
    0.2989, 0.4642, 0.5974, 0.6717, 0.6717, 0.5974, 0.4642, 0.2989,
    0.3846, 0.5974, 0.7688, 0.8644, 0.8644, 0.7689, 0.5974, 0.3846,
    0.4325, 0.6717, 0.8644, 0.9718, 0.9718, 0.8644, 0.6717, 0.4325,
    0.4325, 0.6717, 0.8644, 0.9718, 0.9718, 0.8644, 0.6717, 0.4325,
    0.3846, 0.5974, 0.7688, 0.8644, 0.8644, 0.7689, 0.5974, 0.3846,
    0.2989, 0.4642, 0.5974, 0.6717, 0.6717, 0.5974, 0.4642, 0.2989,
    0.1924, 0.2989, 0.3846, 0.4325, 0.4325, 0.3845, 0.2989, 0.1924,
];

#[cfg(test)]
mod tests {
    use super::{KAISER_FIXED, KAISER_FLOAT};

    #[test]
    fn windows_are_positive_and_peak_in_the_centre() {
        assert!(KAISER_FIXED.iter().all(|&k| k > 0));
        assert!(KAISER_FLOAT.iter().all(|&k| k > 0.0));
        assert_eq!(KAISER_FIXED.iter().max(), Some(&15));
        assert_eq!(KAISER_FIXED[3 * 8 + 3], 15);
        for r in 0..8 {
            for c in 0..8 {
                assert_eq!(KAISER_FIXED[r * 8 + c], KAISER_FIXED[(7 - r) * 8 + c]);
                assert_eq!(KAISER_FIXED[r * 8 + c], KAISER_FIXED[r * 8 + 7 - c]);
            }
        }
    }
}
