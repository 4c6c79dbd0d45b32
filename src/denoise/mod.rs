//! Line-by-line BM3D driver.
//!
//! [`LineScheduler`] owns the padded planes, distance engines, groups and
//! accumulation windows of one numeric mode. [`Denoiser`] picks the mode
//! from [`Bm3dConfig::precision`], and [`denoise_two_pass`] chains the
//! hard-threshold and Wiener passes.

mod config;
mod denoiser;
mod observer;
mod pipeline;
mod scheduler;

pub use config::{
    Bm3dConfig, GroupingMode, NoiseParams, Precision, FIXED_MAX_BIT_DEPTH, MAX_BIT_DEPTH,
    MAX_GROUP_LIMIT,
};
pub use denoiser::Denoiser;
pub use observer::{GroupStats, Stage, StageObserver, StageTimings};
pub use pipeline::{denoise_two_pass, TwoPassConfig, TwoPassOutput};
pub use scheduler::LineScheduler;
