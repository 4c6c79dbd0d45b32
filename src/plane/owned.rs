use crate::plane::PlaneView;
use crate::util::{Bm3dError, Bm3dResult};

/// Owned contiguous plane of unsigned samples (up to 16 bits).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedPlane {
    data: Vec<u16>,
    width: usize,
    height: usize,
}

impl OwnedPlane {
    /// Wraps a contiguous buffer of exactly `width * height` samples.
    pub fn new(data: Vec<u16>, width: usize, height: usize) -> Bm3dResult<Self> {
        let needed = area(width, height)?;
        if data.len() < needed {
            return Err(Bm3dError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(Bm3dError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Allocates a zero-filled plane.
    pub fn zeroed(width: usize, height: usize) -> Bm3dResult<Self> {
        let needed = area(width, height)?;
        Ok(Self {
            data: vec![0; needed],
            width,
            height,
        })
    }

    /// Widens an 8-bit contiguous buffer.
    pub fn from_u8(data: &[u8], width: usize, height: usize) -> Bm3dResult<Self> {
        Self::new(data.iter().map(|&v| u16::from(v)).collect(), width, height)
    }

    /// Copies a (possibly strided) view into a contiguous plane.
    pub fn from_view<T>(view: PlaneView<'_, T>) -> Bm3dResult<Self>
    where
        T: Copy + Into<u16>,
    {
        let width = view.width();
        let height = view.height();
        let mut data = Vec::with_capacity(area(width, height)?);
        for y in 0..height {
            let row = view.row(y).ok_or(Bm3dError::InvalidDimensions { width, height })?;
            data.extend(row.iter().map(|&v| v.into()));
        }
        Self::new(data, width, height)
    }

    /// Returns a borrowed view of the plane.
    pub fn view(&self) -> PlaneView<'_, u16> {
        PlaneView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the contiguous sample buffer.
    pub fn data(&self) -> &[u16] {
        &self.data
    }

    /// Returns a mutable slice for row `y`.
    pub fn row_mut(&mut self, y: usize) -> Option<&mut [u16]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.data.get_mut(start..start + self.width)
    }

    /// Narrows the samples to 8 bits, saturating at 255.
    pub fn to_u8(&self) -> Vec<u8> {
        self.data.iter().map(|&v| v.min(255) as u8).collect()
    }

    /// Consumes the plane and returns its samples.
    pub fn into_vec(self) -> Vec<u16> {
        self.data
    }
}

fn area(width: usize, height: usize) -> Bm3dResult<usize> {
    if width == 0 || height == 0 {
        return Err(Bm3dError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(Bm3dError::InvalidDimensions { width, height })
}

#[cfg(test)]
mod tests {
    use super::OwnedPlane;
    use crate::plane::PlaneView;
    use crate::util::Bm3dError;

    #[test]
    fn from_view_drops_stride_padding() {
        let data: Vec<u8> = vec![1, 2, 99, 3, 4, 99];
        let view = PlaneView::new(&data, 2, 2, 3).unwrap();
        let plane = OwnedPlane::from_view(view).unwrap();
        assert_eq!(plane.data(), &[1, 2, 3, 4]);
    }

    #[test]
    fn rejects_mismatched_lengths() {
        assert_eq!(
            OwnedPlane::new(vec![0; 5], 2, 2).unwrap_err(),
            Bm3dError::InvalidDimensions {
                width: 2,
                height: 2
            }
        );
        assert!(OwnedPlane::zeroed(0, 4).is_err());
    }

    #[test]
    fn to_u8_saturates() {
        let plane = OwnedPlane::new(vec![0, 255, 256, 1023], 2, 2).unwrap();
        assert_eq!(plane.to_u8(), vec![0, 255, 255, 255]);
    }
}
