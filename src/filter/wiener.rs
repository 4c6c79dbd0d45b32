use crate::group::GroupSelector;
use crate::transform::Coefficient;

/// Collaborative Wiener shrinkage of `noisy` driven by `basic`.
///
/// Both groups must share the same layout and be in the transform domain.
/// Each noisy coefficient is scaled by `w = b^2 / (b^2 + threshold)` computed
/// from the matching basic coefficient `b` (truncated toward zero in fixed
/// point). Returns the sum of `w` over the group.
pub fn wiener_shrink<C: Coefficient>(
    basic: &GroupSelector<C>,
    noisy: &mut GroupSelector<C>,
    threshold: f64,
) -> f64 {
    debug_assert_eq!(basic.len(), noisy.len());
    let mut sum = 0.0;
    for i in 0..basic.len() {
        let guide = &basic.member(i).values;
        let target = &mut noisy.member_mut(i).values;
        for (b, n) in guide.iter().zip(target.iter_mut()) {
            let energy = b.to_f64() * b.to_f64();
            let denom = energy + threshold;
            let w = if denom > 0.0 { energy / denom } else { 1.0 };
            sum += w;
            *n = C::from_f64(n.to_f64() * w);
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::wiener_shrink;
    use crate::group::GroupSelector;

    #[test]
    fn shrinks_by_basic_energy() {
        let mut basic = GroupSelector::<i32>::new(1);
        basic.reset_to_reference();
        basic.truncate_pow2();
        let mut noisy = basic.clone();
        basic.member_mut(0).values[0] = 30;
        basic.member_mut(0).values[1] = 10;
        noisy.member_mut(0).values[0] = 100;
        noisy.member_mut(0).values[1] = -100;
        noisy.member_mut(0).values[2] = 77;
        let sum = wiener_shrink(&basic, &mut noisy, 100.0);
        // 900 / 1000 and 100 / 200; the remaining basic coefficients are 0.
        assert!((sum - 1.4).abs() < 1e-12);
        let out = &noisy.member(0).values;
        assert_eq!(&out[..3], &[90, -50, 0]);
    }

    #[test]
    fn zero_threshold_leaves_noisy_untouched() {
        let mut basic = GroupSelector::<f32>::new(1);
        basic.reset_to_reference();
        basic.truncate_pow2();
        let mut noisy = basic.clone();
        noisy.member_mut(0).values[5] = 3.5;
        let sum = wiener_shrink(&basic, &mut noisy, 0.0);
        assert_eq!(sum, 64.0);
        assert_eq!(noisy.member(0).values[5], 3.5);
    }
}
