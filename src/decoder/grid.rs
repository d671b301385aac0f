//! Square grayscale image produced by the decoder.

use crate::params::perfect_square_root;
use crate::{Error, Result};

/// Row-major square grid of intensities in [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    side: usize,
    pixels: Vec<f32>,
}

impl PixelGrid {
    /// Lay out a flattened output as a `side`×`side` grid.
    ///
    /// Fails with [`Shape`](crate::Error::Shape) when `flat.len()` is not a
    /// perfect square or is not `side²`.
    pub fn from_flat(flat: Vec<f32>, side: usize) -> Result<Self> {
        let root = perfect_square_root(flat.len()).ok_or_else(|| {
            Error::shape(format!("decoder produced {} values, not a perfect square", flat.len()))
        })?;
        if root != side {
            return Err(Error::shape(format!(
                "decoder produced a {root}x{root} image, expected {side}x{side}"
            )));
        }
        Ok(Self { side, pixels: flat })
    }

    /// Side length in pixels
    #[must_use]
    pub fn side(&self) -> usize {
        self.side
    }

    /// Intensity at `(row, col)`
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.side && col < self.side {
            self.pixels.get(row * self.side + col).copied()
        } else {
            None
        }
    }

    /// Iterate over rows, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.pixels.chunks_exact(self.side.max(1))
    }

    /// All pixels, row-major
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.pixels
    }

    /// Nested rows, the shape an external renderer usually takes
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.rows().map(<[f32]>::to_vec).collect()
    }

    /// Convert 0.0-1.0 intensities to 0-255 bytes, row-major
    #[must_use]
    pub fn to_grayscale_bytes(&self) -> Vec<u8> {
        self.pixels.iter().map(|p| (p.clamp(0.0, 1.0) * 255.0) as u8).collect()
    }
}
