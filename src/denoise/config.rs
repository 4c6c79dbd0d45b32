use crate::distance::{DistanceMetric, SearchWindow};
use crate::filter::{GroupWeighting, Shrinkage};
use crate::transform::PATCH_SIZE;
use crate::util::{Bm3dError, Bm3dResult};

/// Largest supported group; the threshold gain table covers `N <= 2^7`.
pub const MAX_GROUP_LIMIT: usize = 128;

/// Deepest input samples accepted in fixed point (intermediate sums stay in `i32`).
pub const FIXED_MAX_BIT_DEPTH: u32 = 12;

/// Deepest input samples accepted at all.
pub const MAX_BIT_DEPTH: u32 = 16;

/// Numeric mode of the transform pipeline.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Precision {
    /// Integer arithmetic with explicit rounding.
    #[default]
    Fixed,
    /// `f32` coefficients with `f64` accumulation.
    Float,
}

/// How group membership is decided for multi-channel input.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum GroupingMode {
    /// Distances are computed on channel 0 and reused by every channel.
    #[default]
    SharedLuma,
    /// Every channel runs its own block matching.
    PerChannel,
}

/// Construction-time configuration, fixed for the lifetime of a scheduler.
#[derive(Clone, Debug, PartialEq)]
pub struct Bm3dConfig {
    /// Original image width in samples.
    pub width: usize,
    /// Original image height in samples.
    pub height: usize,
    /// Maximum number of patches in a group (rounded down to a power of two).
    pub max_group_size: usize,
    /// Patch side length; the block transform supports 8 only.
    pub patch_size: usize,
    /// Distance between neighbouring reference patches, both axes.
    pub patch_step: usize,
    /// Block-matching search window.
    pub search: SearchWindow,
    pub metric: DistanceMetric,
    pub shrinkage: Shrinkage,
    /// Group weight policy in hard-threshold mode.
    pub weighting: GroupWeighting,
    pub precision: Precision,
    /// Bits per input sample.
    pub bit_depth: u32,
    /// Number of planes per image.
    pub channels: usize,
    pub grouping: GroupingMode,
    /// Fan out distance updates with rayon (requires the `rayon` feature).
    pub parallel: bool,
    /// Worker threads for `parallel`; 0 uses the global rayon pool.
    pub workers: usize,
}

impl Default for Bm3dConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            max_group_size: 16,
            patch_size: PATCH_SIZE,
            patch_step: 3,
            search: SearchWindow::default(),
            metric: DistanceMetric::SquaredL2,
            shrinkage: Shrinkage::HardThreshold,
            weighting: GroupWeighting::Uniform,
            precision: Precision::Fixed,
            bit_depth: 8,
            channels: 1,
            grouping: GroupingMode::SharedLuma,
            parallel: false,
            workers: 0,
        }
    }
}

impl Bm3dConfig {
    /// Default configuration for a `width x height` image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Default second-pass configuration: Wiener shrinkage with larger groups.
    pub fn wiener(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            max_group_size: 32,
            shrinkage: Shrinkage::Wiener,
            ..Self::default()
        }
    }

    /// Largest representable sample for the configured bit depth.
    pub fn max_sample(&self) -> u16 {
        ((1u32 << self.bit_depth.min(MAX_BIT_DEPTH)) - 1) as u16
    }

    /// Checks the configuration against its own `precision`.
    pub fn validate(&self) -> Bm3dResult<()> {
        self.validate_for(self.precision)
    }

    pub(crate) fn validate_for(&self, precision: Precision) -> Bm3dResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Bm3dError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.patch_size != PATCH_SIZE {
            return Err(Bm3dError::UnsupportedPatchSize {
                patch_size: self.patch_size,
                supported: PATCH_SIZE,
            });
        }
        if self.patch_step == 0 || self.patch_step >= self.patch_size {
            return Err(Bm3dError::InvalidPatchStep {
                step: self.patch_step,
                patch_size: self.patch_size,
            });
        }
        if self.search.step_h == 0 || self.search.step_v == 0 {
            return Err(Bm3dError::InvalidSearchStep);
        }
        if self.search.is_empty() {
            return Err(Bm3dError::EmptySearchWindow);
        }
        if self.max_group_size == 0 || self.max_group_size > MAX_GROUP_LIMIT {
            return Err(Bm3dError::InvalidGroupSize {
                max: self.max_group_size,
                limit: MAX_GROUP_LIMIT,
            });
        }
        let max_depth = match precision {
            Precision::Fixed => FIXED_MAX_BIT_DEPTH,
            Precision::Float => MAX_BIT_DEPTH,
        };
        if self.bit_depth == 0 || self.bit_depth > max_depth {
            return Err(Bm3dError::UnsupportedBitDepth {
                bit_depth: self.bit_depth,
                max: max_depth,
            });
        }
        if self.channels == 0 {
            return Err(Bm3dError::NoChannels);
        }
        if self.width < self.patch_size || self.height < self.patch_size {
            return Err(Bm3dError::ImageSmallerThanPatch {
                width: self.width,
                height: self.height,
                patch_size: self.patch_size,
            });
        }
        Ok(())
    }
}

/// Per-load noise parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseParams {
    /// Noise standard deviation per channel; a single value applies to all.
    pub sigma: Vec<f64>,
    /// Admission limit per channel as a mean per-pixel distance; a single
    /// value applies to all. With [`GroupingMode::SharedLuma`] only the
    /// luma limit decides membership.
    pub max_mean_distance: Vec<u64>,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            sigma: vec![0.0],
            max_mean_distance: vec![2500],
        }
    }
}

impl NoiseParams {
    /// Same sigma for every channel.
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma: vec![sigma],
            ..Self::default()
        }
    }

    /// One sigma per channel.
    pub fn per_channel(sigma: Vec<f64>) -> Self {
        Self {
            sigma,
            ..Self::default()
        }
    }

    /// Same admission limit for every channel.
    pub fn with_max_mean_distance(mut self, max_mean_distance: u64) -> Self {
        self.max_mean_distance = vec![max_mean_distance];
        self
    }

    /// One admission limit per channel.
    pub fn with_channel_max_mean_distance(mut self, max_mean_distance: Vec<u64>) -> Self {
        self.max_mean_distance = max_mean_distance;
        self
    }

    /// Resolves and checks the sigma of every channel.
    pub fn resolve(&self, channels: usize) -> Bm3dResult<Vec<f64>> {
        let sigmas = broadcast(&self.sigma, channels)?;
        if let Some(channel) = sigmas.iter().position(|s| !s.is_finite() || *s < 0.0) {
            return Err(Bm3dError::InvalidSigma { channel });
        }
        Ok(sigmas)
    }

    /// Resolves the admission limit of every channel for whole patches of
    /// `patch_size^2` pixels.
    pub fn resolve_max_distance(
        &self,
        channels: usize,
        patch_size: usize,
    ) -> Bm3dResult<Vec<u64>> {
        let area = (patch_size * patch_size) as u64;
        Ok(broadcast(&self.max_mean_distance, channels)?
            .into_iter()
            .map(|d| d.saturating_mul(area))
            .collect())
    }
}

/// Expands a single value to every channel, or checks one value per channel.
fn broadcast<T: Copy>(values: &[T], channels: usize) -> Bm3dResult<Vec<T>> {
    match values {
        [value] => Ok(vec![*value; channels]),
        _ if values.len() == channels => Ok(values.to_vec()),
        _ => Err(Bm3dError::ChannelMismatch {
            expected: channels,
            got: values.len(),
        }),
    }
}
