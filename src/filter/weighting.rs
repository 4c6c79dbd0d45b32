use crate::transform::Coefficient;

/// Aggregation weight policy for hard-thresholded groups.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum GroupWeighting {
    /// Every group contributes with unit weight.
    #[default]
    Uniform,
    /// Weight `1 / nonzeros`, favouring sparser (cleaner) groups.
    InverseNonzero,
}

impl GroupWeighting {
    /// Weight of a hard-thresholded group with `nonzeros` surviving coefficients.
    pub fn hard_weight(self, nonzeros: usize) -> f64 {
        match self {
            Self::Uniform => 1.0,
            Self::InverseNonzero if nonzeros == 0 => 1.0,
            Self::InverseNonzero => 1.0 / nonzeros as f64,
        }
    }
}

/// Weight of a Wiener-filtered group from the sum of its shrink factors.
///
/// Fixed point pins the weight to 1; floating point uses `64 / sum`.
pub fn wiener_weight<C: Coefficient>(shrink_sum: f64) -> f64 {
    if C::FIXED {
        1.0
    } else {
        64.0 / shrink_sum.max(1.0)
    }
}
