//! YAML schema for the morpher configuration.

use serde::{Deserialize, Serialize};

use crate::latent::STANDARD_INDEX_MAPPING;

/// Width of the latent space of the shipped face model.
pub const DEFAULT_LATENT_DIM: usize = 400;

/// Side of the square images the shipped face model produces.
pub const DEFAULT_IMAGE_SIDE: usize = 48;

/// Prior used when (re)sampling the latent vector: U[-1, 1] per coordinate.
pub const DEFAULT_SAMPLING_RANGE: SamplingRange = SamplingRange { low: -1.0, high: 1.0 };

/// Range produced by one historical revision, which computed `U[0,1] - 1`.
///
/// Kept addressable so the discrepancy with [`DEFAULT_SAMPLING_RANGE`] stays
/// visible until the intended prior is confirmed.
pub const LEGACY_SAMPLING_RANGE: SamplingRange = SamplingRange { low: -1.0, high: 0.0 };

/// Semantic dimensions selected by the two-dimension API at construction.
pub const DEFAULT_DIMENSIONS: (usize, usize) = (28, 11);

/// Coordinate offset applied by one random-walk step.
pub const DEFAULT_WALK_STEP: f32 = 0.5;

/// Closed interval each latent coordinate is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingRange {
    /// Lower bound (inclusive)
    pub low: f32,
    /// Upper bound (inclusive)
    pub high: f32,
}

impl SamplingRange {
    /// Whether `value` lies inside the range.
    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        (self.low..=self.high).contains(&value)
    }

    /// A usable range is finite with `low < high`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low < self.high
    }
}

impl Default for SamplingRange {
    fn default() -> Self {
        DEFAULT_SAMPLING_RANGE
    }
}

/// File naming of the parameter assets served by the transport.
///
/// Blob names are `<prefix><layer><extension>`, e.g. `d_W_0.bin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterNaming {
    /// Name of the size manifest
    pub manifest: String,
    /// Prefix of weight blobs
    pub weight_prefix: String,
    /// Prefix of bias blobs
    pub bias_prefix: String,
    /// Extension shared by all blobs
    pub extension: String,
}

impl ParameterNaming {
    /// Name of the weight blob for decoder layer `layer`.
    #[must_use]
    pub fn weight(&self, layer: usize) -> String {
        format!("{}{layer}{}", self.weight_prefix, self.extension)
    }

    /// Name of the bias blob for decoder layer `layer`.
    #[must_use]
    pub fn bias(&self, layer: usize) -> String {
        format!("{}{layer}{}", self.bias_prefix, self.extension)
    }
}

impl Default for ParameterNaming {
    fn default() -> Self {
        Self {
            manifest: "sizes.csv".to_string(),
            weight_prefix: "d_W_".to_string(),
            bias_prefix: "d_b_".to_string(),
            extension: ".bin".to_string(),
        }
    }
}

/// Complete morpher configuration
///
/// Every field has a default matching the shipped 400 → 2000 → 2000 → 48×48
/// face model, so an empty YAML document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorpherConfig {
    /// Width of the latent space
    pub latent_dim: usize,
    /// Side of the generated square image
    pub image_side: usize,
    /// Per-coordinate sampling interval for the latent prior
    pub sampling: SamplingRange,
    /// Whether the freeze gate on coordinate writes is available
    pub freeze_enabled: bool,
    /// Semantic dimensions driven by `set_coordinates` until reselected
    pub default_dimensions: (usize, usize),
    /// Raw latent index of every semantic dimension, in semantic order
    pub index_mapping: Vec<usize>,
    /// Magnitude of one random-walk step
    pub walk_step: f32,
    /// Asset names
    pub naming: ParameterNaming,
}

impl Default for MorpherConfig {
    fn default() -> Self {
        Self {
            latent_dim: DEFAULT_LATENT_DIM,
            image_side: DEFAULT_IMAGE_SIDE,
            sampling: DEFAULT_SAMPLING_RANGE,
            freeze_enabled: true,
            default_dimensions: DEFAULT_DIMENSIONS,
            index_mapping: STANDARD_INDEX_MAPPING.to_vec(),
            walk_step: DEFAULT_WALK_STEP,
            naming: ParameterNaming::default(),
        }
    }
}

impl MorpherConfig {
    /// Flattened pixel count of one generated image.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.image_side * self.image_side
    }

    /// Builder-style override of the image side.
    #[must_use]
    pub fn with_image_side(mut self, side: usize) -> Self {
        self.image_side = side;
        self
    }

    /// Builder-style override of the latent width and semantic mapping.
    #[must_use]
    pub fn with_latent(mut self, latent_dim: usize, index_mapping: Vec<usize>) -> Self {
        self.latent_dim = latent_dim;
        self.index_mapping = index_mapping;
        self
    }

    /// Builder-style override of the default semantic dimension pair.
    #[must_use]
    pub fn with_default_dimensions(mut self, d0: usize, d1: usize) -> Self {
        self.default_dimensions = (d0, d1);
        self
    }

    /// Builder-style override of the sampling range.
    #[must_use]
    pub fn with_sampling(mut self, sampling: SamplingRange) -> Self {
        self.sampling = sampling;
        self
    }

    /// Builder-style override of the freeze gate.
    #[must_use]
    pub fn with_freeze_enabled(mut self, enabled: bool) -> Self {
        self.freeze_enabled = enabled;
        self
    }
}
