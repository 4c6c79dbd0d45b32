use crate::group::GroupSelector;
use crate::transform::Coefficient;

/// Zeroes every coefficient whose magnitude is below `base * sqrt(N)` and
/// returns how many coefficients survived.
///
/// A coefficient equal to the threshold survives. `base` comes from
/// [`Coefficient::hard_threshold`].
pub fn hard_threshold<C: Coefficient>(group: &mut GroupSelector<C>, base: C) -> usize {
    let threshold = base.scale_threshold(group.log_len());
    let neg = -threshold;
    let mut nonzeros = 0;
    for i in 0..group.len() {
        for v in group.member_mut(i).values.iter_mut() {
            if *v >= threshold || *v <= neg {
                nonzeros += 1;
            } else {
                *v = C::zero();
            }
        }
    }
    nonzeros
}
