//! Low-level building blocks for custom denoising pipelines.
//!
//! These types expose the distance engine, group selection, filtering steps
//! and accumulation window used by [`LineScheduler`](crate::LineScheduler).
//! Most users should prefer [`Denoiser`](crate::Denoiser) or
//! [`denoise_two_pass`](crate::denoise_two_pass).

pub use crate::aggregate::Accumulator;
pub use crate::distance::DistanceEngine;
pub use crate::filter::{forward_group, hard_threshold, inverse_group, wiener_shrink, wiener_weight};
pub use crate::group::{GroupSelector, Patch};
pub use crate::plane::PaddedPlane;
pub use crate::transform::hadamard::butterfly;
pub use crate::transform::{wiener_threshold, HARD_THRESHOLD_MULTIPLIER, PATCH_AREA, PATCH_SIZE};
