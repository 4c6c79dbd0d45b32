//! Walsh-Hadamard butterfly along the group axis.
//!
//! For `N = 2^k` patches the transform runs `k` passes. Each pass replaces
//! every adjacent pair `(a, b)` with `(a + b, a - b)` in place and then
//! reorders the slot indices so all sums come first and all differences after
//! (a perfect unshuffle). After `k` passes the first slot holds the sum of all
//! patches and the slot order is back to the input order, so applying the
//! butterfly twice returns `N` times the input. The transform is unnormalized;
//! callers divide by `N` after the inverse.
//!
//! Only slot indices move between passes; patch buffers never do.

use crate::group::Patch;
use crate::transform::Coefficient;

/// Applies the butterfly in place to the patches listed by `order`.
///
/// `order.len()` must be a power of two; `scratch` is reused across calls.
pub fn butterfly<C: Coefficient>(
    slots: &mut [Patch<C>],
    order: &mut [usize],
    scratch: &mut Vec<usize>,
) {
    let n = order.len();
    if n < 2 {
        return;
    }
    debug_assert!(n.is_power_of_two());
    let half = n / 2;
    scratch.clear();
    scratch.resize(n, 0);

    for _ in 0..n.trailing_zeros() {
        for p in 0..half {
            scratch[p] = order[2 * p];
            scratch[p + half] = order[2 * p + 1];
        }
        for pair in order.chunks_exact(2) {
            let (sum, diff) = pair_mut(slots, pair[0], pair[1]);
            for (a, b) in sum.values.iter_mut().zip(diff.values.iter_mut()) {
                let d = *a - *b;
                *a += *b;
                *b = d;
            }
        }
        order.copy_from_slice(scratch);
    }
}

fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (lo, hi) = items.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}

#[cfg(test)]
mod tests {
    use super::butterfly;
    use crate::group::Patch;

    fn slots(n: usize) -> Vec<Patch<i32>> {
        (0..n)
            .map(|p| {
                let mut patch = Patch::default();
                for (i, v) in patch.values.iter_mut().enumerate() {
                    *v = ((p * 131 + i * 17) % 97) as i32 - 48;
                }
                patch
            })
            .collect()
    }

    #[test]
    fn first_slot_holds_group_sum() {
        for n in [2usize, 4, 8, 16] {
            let mut s = slots(n);
            let expected: Vec<i32> = (0..64)
                .map(|i| s.iter().map(|p| p.values[i]).sum())
                .collect();
            let mut order: Vec<usize> = (0..n).collect();
            let mut scratch = Vec::new();
            butterfly(&mut s, &mut order, &mut scratch);
            assert_eq!(order, (0..n).collect::<Vec<_>>());
            assert_eq!(s[order[0]].values.to_vec(), expected);
        }
    }

    #[test]
    fn applying_twice_scales_by_group_size() {
        for n in [1usize, 2, 4, 8, 32] {
            let original = slots(n);
            let mut s = original.clone();
            let mut order: Vec<usize> = (0..n).collect();
            let mut scratch = Vec::new();
            butterfly(&mut s, &mut order, &mut scratch);
            butterfly(&mut s, &mut order, &mut scratch);
            for (a, b) in original.iter().zip(s.iter()) {
                for (x, y) in a.values.iter().zip(b.values.iter()) {
                    assert_eq!(*x * n as i32, *y);
                }
            }
        }
    }
}
