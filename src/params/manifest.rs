//! Size manifest: layer widths from the pixel side to the latent side.

use crate::config::MorpherConfig;
use crate::{Error, Result};

/// Ordered layer widths `s_0, …, s_L`.
///
/// `s_0` is the flattened pixel count and `s_L` the latent width. Decoder
/// layer `k` maps width `s_{k+1}` to width `s_k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSizes {
    sizes: Vec<usize>,
}

/// Parse a size manifest.
///
/// The manifest is one line of comma-separated positive integers, e.g.
/// `2304,2000,2000,400`. Whitespace around values and a trailing newline are
/// ignored; anything after the first line is ignored.
///
/// # Example
///
/// ```
/// use morpher::params::load_manifest;
///
/// let sizes = load_manifest(b"2304,2000,2000,400\n").expect("valid manifest");
/// assert_eq!(sizes.layer_count(), 3);
/// assert_eq!(sizes.expected_blob_count(), 6);
/// ```
pub fn load_manifest(bytes: &[u8]) -> Result<LayerSizes> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::manifest(format!("manifest is not UTF-8: {e}")))?;

    let line = text.lines().next().map(str::trim).unwrap_or_default();
    if line.is_empty() {
        return Err(Error::manifest("manifest is empty"));
    }

    let sizes = line
        .split(',')
        .map(str::trim)
        .map(|field| match field.parse::<usize>() {
            Ok(0) => Err(Error::manifest("layer widths must be positive, got 0")),
            Ok(width) => Ok(width),
            Err(_) => Err(Error::manifest(format!("'{field}' is not a non-negative integer"))),
        })
        .collect::<Result<Vec<_>>>()?;

    LayerSizes::new(sizes)
}

impl LayerSizes {
    /// Build from explicit widths; at least one layer boundary is required.
    pub fn new(sizes: Vec<usize>) -> Result<Self> {
        if sizes.len() < 2 {
            return Err(Error::manifest(format!(
                "need at least 2 widths (pixels and latent), got {}",
                sizes.len()
            )));
        }
        Ok(Self { sizes })
    }

    /// All widths, pixel side first
    #[must_use]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Number of decoder layers
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.sizes.len() - 1
    }

    /// Number of parameter blobs (one weight and one bias per layer)
    #[must_use]
    pub fn expected_blob_count(&self) -> usize {
        2 * self.layer_count()
    }

    /// Flattened pixel count of the output image
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.sizes[0]
    }

    /// Width of the latent space
    #[must_use]
    pub fn latent_dim(&self) -> usize {
        self.sizes[self.sizes.len() - 1]
    }

    /// `(out, in)` shape of decoder layer `layer`, or `None` past the last layer.
    #[must_use]
    pub fn layer_shape(&self, layer: usize) -> Option<(usize, usize)> {
        if layer < self.layer_count() {
            Some((self.sizes[layer], self.sizes[layer + 1]))
        } else {
            None
        }
    }

    /// Side of the square output image.
    pub fn image_side(&self) -> Result<usize> {
        perfect_square_root(self.pixel_count()).ok_or_else(|| {
            Error::shape(format!("pixel count {} is not a perfect square", self.pixel_count()))
        })
    }

    /// Check the manifest against the configured image side and latent width.
    pub fn check_against(&self, config: &MorpherConfig) -> Result<()> {
        let side = self.image_side()?;
        if side != config.image_side {
            return Err(Error::shape(format!(
                "manifest describes {side}x{side} images, configuration expects {0}x{0}",
                config.image_side
            )));
        }
        if self.latent_dim() != config.latent_dim {
            return Err(Error::shape(format!(
                "manifest latent width {} does not match configured latent_dim {}",
                self.latent_dim(),
                config.latent_dim
            )));
        }
        Ok(())
    }
}

/// Integer square root when `n` is a perfect square.
pub(crate) fn perfect_square_root(n: usize) -> Option<usize> {
    let root = (n as f64).sqrt().round() as usize;
    (root.checked_mul(root) == Some(n)).then_some(root)
}
