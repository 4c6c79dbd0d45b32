//! Sample planes: borrowed views, owned buffers and the padded working plane.
//!
//! `PlaneView` is a borrowed 2D view into a 1D buffer with an explicit stride.
//! The stride counts elements between the starts of consecutive rows, so a
//! stride larger than the width represents padded rows. Planes carry one
//! channel each; multi-channel images are passed as a slice of planes.

use crate::util::{Bm3dError, Bm3dResult};

#[cfg(feature = "image-io")]
pub mod io;
mod owned;
mod padded;

pub use owned::OwnedPlane;
pub use padded::PaddedPlane;

/// Borrowed 2D plane view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct PlaneView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> PlaneView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> Bm3dResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> Bm3dResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(Bm3dError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the plane width in samples.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the plane height in samples.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> Bm3dResult<usize> {
    if width == 0 || height == 0 {
        return Err(Bm3dError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(Bm3dError::InvalidStride { width, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(Bm3dError::InvalidDimensions { width, height })
}
