//! Streaming line-by-line BM3D image denoising.
//!
//! The denoiser walks an image one line of reference patches at a time,
//! keeping only a window of `patch_size + 2 * search_radius` rows of
//! accumulation state. Each reference patch is grouped with its most similar
//! neighbours, filtered collaboratively in a separable 3D transform domain
//! (hard thresholding or Wiener shrinkage) and aggregated back with a Kaiser
//! window. Both a fixed-point (`i32`) and a floating-point (`f32`) pipeline
//! are provided; with the `rayon` feature the block-matching distance updates
//! can fan out across threads.
//!
//! ```no_run
//! use bm3d_line::{Bm3dConfig, Denoiser, NoiseParams, OwnedPlane};
//!
//! # fn main() -> bm3d_line::Bm3dResult<()> {
//! let noisy = OwnedPlane::zeroed(64, 48)?;
//! let mut denoiser = Denoiser::new(Bm3dConfig::new(64, 48))?;
//! let out = denoiser.denoise(&[noisy.view()], None, &NoiseParams::new(10.0))?;
//! assert_eq!(out[0].width(), 64);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod denoise;
pub mod distance;
pub mod filter;
pub mod group;
pub mod lowlevel;
pub mod plane;
pub(crate) mod trace;
pub mod transform;
pub mod util;

pub use denoise::{
    denoise_two_pass, Bm3dConfig, Denoiser, GroupStats, GroupingMode, LineScheduler, NoiseParams,
    Precision, Stage, StageObserver, StageTimings, TwoPassConfig, TwoPassOutput,
};
pub use distance::{DistanceMetric, SearchWindow};
pub use filter::{GroupWeighting, Shrinkage};
pub use plane::{OwnedPlane, PlaneView};
pub use transform::{Bior15, BlockTransform, Coefficient};
pub use util::{Bm3dError, Bm3dResult};
