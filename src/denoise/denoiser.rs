use crate::denoise::config::{Bm3dConfig, NoiseParams, Precision};
use crate::denoise::observer::StageObserver;
use crate::denoise::scheduler::LineScheduler;
use crate::plane::{OwnedPlane, PlaneView};
use crate::util::Bm3dResult;
use std::ops::Range;
use std::sync::Arc;

/// Line scheduler in the numeric mode picked by [`Bm3dConfig::precision`].
pub enum Denoiser {
    Fixed(LineScheduler<i32>),
    Float(LineScheduler<f32>),
}

macro_rules! dispatch {
    ($self:expr, $inner:ident => $body:expr) => {
        match $self {
            Denoiser::Fixed($inner) => $body,
            Denoiser::Float($inner) => $body,
        }
    };
}

impl Denoiser {
    /// Validates `config` and builds the matching scheduler.
    pub fn new(config: Bm3dConfig) -> Bm3dResult<Self> {
        Ok(match config.precision {
            Precision::Fixed => Self::Fixed(LineScheduler::new(config)?),
            Precision::Float => Self::Float(LineScheduler::new(config)?),
        })
    }

    pub fn config(&self) -> &Bm3dConfig {
        dispatch!(self, s => s.config())
    }

    pub fn set_observer(&mut self, observer: Arc<dyn StageObserver>) {
        dispatch!(self, s => s.set_observer(observer))
    }

    pub fn load(&mut self, noisy: &[PlaneView<'_, u16>], noise: &NoiseParams) -> Bm3dResult<()> {
        dispatch!(self, s => s.load(noisy, noise))
    }

    pub fn load_with_basic(
        &mut self,
        noisy: &[PlaneView<'_, u16>],
        basic: &[PlaneView<'_, u16>],
        noise: &NoiseParams,
    ) -> Bm3dResult<()> {
        dispatch!(self, s => s.load_with_basic(noisy, basic, noise))
    }

    pub fn reset(&mut self) {
        dispatch!(self, s => s.reset())
    }

    pub fn is_finished(&self) -> bool {
        dispatch!(self, s => s.is_finished())
    }

    pub fn next_line(&mut self, out: &mut [OwnedPlane]) -> Bm3dResult<Option<Range<usize>>> {
        dispatch!(self, s => s.next_line(out))
    }

    pub fn run(&mut self) -> Bm3dResult<Vec<OwnedPlane>> {
        dispatch!(self, s => s.run())
    }

    pub fn run_into(&mut self, out: &mut [OwnedPlane]) -> Bm3dResult<()> {
        dispatch!(self, s => s.run_into(out))
    }

    /// Loads and filters a whole image in one call.
    ///
    /// `basic` must be given exactly when the configuration uses Wiener
    /// shrinkage.
    pub fn denoise(
        &mut self,
        noisy: &[PlaneView<'_, u16>],
        basic: Option<&[PlaneView<'_, u16>]>,
        noise: &NoiseParams,
    ) -> Bm3dResult<Vec<OwnedPlane>> {
        match basic {
            Some(basic) => self.load_with_basic(noisy, basic, noise)?,
            None => self.load(noisy, noise)?,
        }
        self.run()
    }
}

#[cfg(test)]
mod tests {
    use super::Denoiser;
    use crate::denoise::config::{Bm3dConfig, NoiseParams, Precision};
    use crate::plane::OwnedPlane;
    use crate::util::Bm3dError;

    #[test]
    fn picks_scheduler_from_precision() {
        let fixed = Denoiser::new(Bm3dConfig::new(16, 16)).unwrap();
        assert!(matches!(fixed, Denoiser::Fixed(_)));
        let float = Denoiser::new(Bm3dConfig {
            precision: Precision::Float,
            bit_depth: 16,
            ..Bm3dConfig::new(16, 16)
        })
        .unwrap();
        assert!(matches!(float, Denoiser::Float(_)));
    }

    #[test]
    fn sixteen_bit_input_needs_float() {
        let config = Bm3dConfig {
            bit_depth: 16,
            ..Bm3dConfig::new(16, 16)
        };
        assert!(matches!(
            Denoiser::new(config),
            Err(Bm3dError::UnsupportedBitDepth { .. })
        ));
    }

    #[test]
    fn denoise_requires_basic_for_wiener() {
        let mut denoiser = Denoiser::new(Bm3dConfig::wiener(16, 16)).unwrap();
        let plane = OwnedPlane::zeroed(16, 16).unwrap();
        let err = denoiser
            .denoise(&[plane.view()], None, &NoiseParams::new(3.0))
            .unwrap_err();
        assert!(matches!(err, Bm3dError::ShrinkageMismatch { .. }));
        let out = denoiser
            .denoise(&[plane.view()], Some(&[plane.view()]), &NoiseParams::new(3.0))
            .unwrap();
        assert_eq!(out[0].data(), plane.data());
    }
}
