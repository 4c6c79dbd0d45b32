//! Error types for bm3d-line.

use thiserror::Error;

/// Result alias for bm3d-line operations.
pub type Bm3dResult<T> = std::result::Result<T, Bm3dError>;

/// Errors that can occur when configuring or driving the denoiser.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Bm3dError {
    /// Width or height is zero or overflows the addressable range.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The backing buffer is too small for the requested view.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// The image is smaller than a single patch.
    #[error("image {width}x{height} is smaller than the {patch_size}x{patch_size} patch")]
    ImageSmallerThanPatch {
        width: usize,
        height: usize,
        patch_size: usize,
    },
    /// The block transform only supports one patch size.
    #[error("unsupported patch size {patch_size} (the block transform is fixed at {supported})")]
    UnsupportedPatchSize { patch_size: usize, supported: usize },
    /// The reference patch step must be in `1..patch_size`.
    #[error("invalid patch step {step} for patch size {patch_size}")]
    InvalidPatchStep { step: usize, patch_size: usize },
    /// A search step of zero was requested.
    #[error("search step must be at least 1")]
    InvalidSearchStep,
    /// The search window contains no candidate besides the reference.
    #[error("search window has no candidate offsets")]
    EmptySearchWindow,
    /// Maximum group size is outside the supported range.
    #[error("max group size {max} outside 1..={limit}")]
    InvalidGroupSize { max: usize, limit: usize },
    /// Sample bit depth cannot be processed in the selected numeric mode.
    #[error("unsupported bit depth {bit_depth} (max {max} for this precision)")]
    UnsupportedBitDepth { bit_depth: u32, max: u32 },
    /// Channel count is zero.
    #[error("channel count must be at least 1")]
    NoChannels,
    /// Number of supplied planes does not match the configured channels.
    #[error("expected {expected} planes, got {got}")]
    ChannelMismatch { expected: usize, got: usize },
    /// A supplied plane does not match the configured image size.
    #[error("plane {channel} is {width}x{height}, expected {expected_width}x{expected_height}")]
    PlaneSizeMismatch {
        channel: usize,
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },
    /// Noise level is negative or not finite.
    #[error("invalid noise sigma for channel {channel}")]
    InvalidSigma { channel: usize },
    /// The load call does not match the configured shrinkage mode.
    #[error("shrinkage mode mismatch: {reason}")]
    ShrinkageMismatch { reason: &'static str },
    /// Processing was requested before any image was loaded.
    #[error("no image loaded")]
    NotLoaded,
    /// Image decoding or encoding failed.
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}
