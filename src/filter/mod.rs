//! Collaborative filtering of a materialized group.
//!
//! A group is moved to the transform domain with [`forward_group`], shrunk by
//! one of the [`Shrinkage`] rules and brought back with [`inverse_group`].
//! The shrink step also yields the statistics the aggregation weight is
//! derived from.

mod hard;
mod weighting;
mod wiener;

pub use hard::hard_threshold;
pub use weighting::{wiener_weight, GroupWeighting};
pub use wiener::wiener_shrink;

use crate::group::GroupSelector;
use crate::transform::{BlockTransform, Coefficient};

/// Shrinkage rule applied to group coefficients.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Shrinkage {
    /// Zero coefficients below `2.7 * sigma * sqrt(N)`.
    #[default]
    HardThreshold,
    /// Scale noisy coefficients by `b^2 / (b^2 + sigma^2)` from a basic estimate.
    Wiener,
}

impl Shrinkage {
    /// Wiener shrinkage needs a basic estimate next to the noisy input.
    pub fn needs_basic(self) -> bool {
        matches!(self, Self::Wiener)
    }
}

/// Applies the 2D transform to every member, then the group-axis butterfly.
pub fn forward_group<C, T>(group: &mut GroupSelector<C>, transform: &T)
where
    C: Coefficient,
    T: BlockTransform<C> + ?Sized,
{
    for i in 0..group.len() {
        transform.forward(&mut group.member_mut(i).values);
    }
    group.butterfly();
}

/// Undoes [`forward_group`]: butterfly, division by the group size and the
/// inverse 2D transform.
pub fn inverse_group<C, T>(group: &mut GroupSelector<C>, transform: &T)
where
    C: Coefficient,
    T: BlockTransform<C> + ?Sized,
{
    let log_n = group.log_len();
    group.butterfly();
    for i in 0..group.len() {
        let values = &mut group.member_mut(i).values;
        if log_n > 0 {
            for v in values.iter_mut() {
                *v = v.descale(log_n);
            }
        }
        transform.inverse(values);
    }
}
