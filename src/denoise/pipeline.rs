//! Two-pass BM3D: hard thresholding produces a basic estimate that guides a
//! Wiener pass over the same noisy input.

use crate::denoise::config::{Bm3dConfig, NoiseParams};
use crate::denoise::denoiser::Denoiser;
use crate::filter::Shrinkage;
use crate::plane::{OwnedPlane, PlaneView};
use crate::trace::trace_span;
use crate::util::{Bm3dError, Bm3dResult};

/// Configuration of both passes.
#[derive(Clone, Debug, PartialEq)]
pub struct TwoPassConfig {
    pub hard: Bm3dConfig,
    pub wiener: Bm3dConfig,
    pub hard_noise: NoiseParams,
    pub wiener_noise: NoiseParams,
}

impl TwoPassConfig {
    /// Default passes for a `width x height` image with noise level `sigma`.
    pub fn new(width: usize, height: usize, sigma: f64) -> Self {
        Self {
            hard: Bm3dConfig::new(width, height),
            wiener: Bm3dConfig::wiener(width, height),
            hard_noise: NoiseParams::new(sigma),
            wiener_noise: NoiseParams::new(sigma),
        }
    }

    /// Checks both configurations and that they describe the same image.
    pub fn validate(&self) -> Bm3dResult<()> {
        self.hard.validate()?;
        self.wiener.validate()?;
        if self.hard.shrinkage != Shrinkage::HardThreshold
            || self.wiener.shrinkage != Shrinkage::Wiener
        {
            return Err(Bm3dError::ShrinkageMismatch {
                reason: "two-pass needs hard thresholding then wiener",
            });
        }
        let (h, w) = (&self.hard, &self.wiener);
        if (h.width, h.height, h.channels, h.bit_depth)
            != (w.width, w.height, w.channels, w.bit_depth)
        {
            return Err(Bm3dError::InvalidInput(
                "both passes must share image size, channels and bit depth",
            ));
        }
        Ok(())
    }
}

/// Planes produced by [`denoise_two_pass`].
#[derive(Clone, Debug)]
pub struct TwoPassOutput {
    /// Output of the hard-threshold pass.
    pub basic: Vec<OwnedPlane>,
    /// Output of the Wiener pass.
    pub denoised: Vec<OwnedPlane>,
}

/// Runs the hard-threshold pass, then the Wiener pass guided by its output.
pub fn denoise_two_pass(
    config: &TwoPassConfig,
    noisy: &[PlaneView<'_, u16>],
) -> Bm3dResult<TwoPassOutput> {
    let _span = trace_span!("bm3d_two_pass").entered();
    config.validate()?;

    let mut first = Denoiser::new(config.hard.clone())?;
    let basic = first.denoise(noisy, None, &config.hard_noise)?;

    let basic_views: Vec<PlaneView<'_, u16>> = basic.iter().map(OwnedPlane::view).collect();
    let mut second = Denoiser::new(config.wiener.clone())?;
    let denoised = second.denoise(noisy, Some(&basic_views), &config.wiener_noise)?;

    Ok(TwoPassOutput { basic, denoised })
}

#[cfg(test)]
mod tests {
    use super::{denoise_two_pass, TwoPassConfig};
    use crate::filter::Shrinkage;
    use crate::plane::OwnedPlane;
    use crate::util::Bm3dError;

    #[test]
    fn rejects_swapped_passes() {
        let mut config = TwoPassConfig::new(16, 16, 5.0);
        config.hard.shrinkage = Shrinkage::Wiener;
        assert!(matches!(
            config.validate(),
            Err(Bm3dError::ShrinkageMismatch { .. })
        ));
    }

    #[test]
    fn rejects_mismatched_sizes() {
        let mut config = TwoPassConfig::new(16, 16, 5.0);
        config.wiener.width = 24;
        assert!(matches!(config.validate(), Err(Bm3dError::InvalidInput(_))));
    }

    #[test]
    fn flat_image_survives_both_passes() {
        let config = TwoPassConfig::new(16, 16, 5.0);
        let plane = OwnedPlane::new(vec![90; 256], 16, 16).unwrap();
        let out = denoise_two_pass(&config, &[plane.view()]).unwrap();
        assert_eq!(out.basic.len(), 1);
        assert!(out.denoised[0].data().iter().all(|&v| v.abs_diff(90) <= 1));
    }
}
