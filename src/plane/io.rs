//! Convenience helpers for loading and saving planes via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::plane::{OwnedPlane, PlaneView};
use crate::util::{Bm3dError, Bm3dResult};
use std::path::Path;

/// Creates a borrowed view from a grayscale image buffer.
pub fn view_from_gray_image(img: &image::GrayImage) -> Bm3dResult<PlaneView<'_, u8>> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    PlaneView::from_slice(img.as_raw(), width, height)
}

/// Creates an owned plane from a dynamic image, converted to 8-bit luma.
pub fn plane_from_dynamic_image(img: &image::DynamicImage) -> Bm3dResult<OwnedPlane> {
    let gray = img.to_luma8();
    OwnedPlane::from_view(view_from_gray_image(&gray)?)
}

/// Loads an image from disk and converts it to a grayscale plane.
pub fn load_gray_plane<P: AsRef<Path>>(path: P) -> Bm3dResult<OwnedPlane> {
    let img = image::open(path).map_err(|err| Bm3dError::ImageIo {
        reason: err.to_string(),
    })?;
    plane_from_dynamic_image(&img)
}

/// Saves an 8-bit plane as a grayscale image; the format follows the extension.
pub fn save_gray_plane<P: AsRef<Path>>(path: P, plane: &OwnedPlane) -> Bm3dResult<()> {
    let width = u32::try_from(plane.width()).map_err(|_| Bm3dError::InvalidDimensions {
        width: plane.width(),
        height: plane.height(),
    })?;
    let height = u32::try_from(plane.height()).map_err(|_| Bm3dError::InvalidDimensions {
        width: plane.width(),
        height: plane.height(),
    })?;
    let img = image::GrayImage::from_raw(width, height, plane.to_u8()).ok_or(
        Bm3dError::BufferTooSmall {
            needed: plane.width() * plane.height(),
            got: plane.data().len(),
        },
    )?;
    img.save(path).map_err(|err| Bm3dError::ImageIo {
        reason: err.to_string(),
    })
}
