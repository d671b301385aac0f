//! Morpher configuration
//!
//! Loaded from YAML; every field defaults to the shipped face model.

mod schema;

pub use schema::{
    MorpherConfig, ParameterNaming, SamplingRange, DEFAULT_DIMENSIONS, DEFAULT_IMAGE_SIDE,
    DEFAULT_LATENT_DIM, DEFAULT_SAMPLING_RANGE, DEFAULT_WALK_STEP, LEGACY_SAMPLING_RANGE,
};

use crate::latent::IndexMapping;
use crate::{Error, Result};
use std::path::Path;

impl MorpherConfig {
    /// Parse and validate a configuration from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config { message: format!("YAML deserialization failed: {e}") })?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_yaml_str(&content)
    }

    /// Render the configuration as YAML, e.g. to record the settings a
    /// session ran with.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| Error::Config { message: format!("YAML serialization failed: {e}") })
    }

    /// Validate this configuration; see [`validate_config`].
    pub fn validate(&self) -> Result<()> {
        validate_config(self)
    }
}

/// Validate a morpher configuration
///
/// Checks:
/// - Widths are non-zero
/// - The sampling range is finite and non-empty
/// - The walk step is finite
/// - The index mapping is distinct and inside the latent space
/// - Both default dimensions are in the mapping
pub fn validate_config(config: &MorpherConfig) -> Result<()> {
    if config.latent_dim == 0 {
        return Err(Error::Config { message: "latent_dim must be > 0".to_string() });
    }

    if config.image_side == 0 {
        return Err(Error::Config { message: "image_side must be > 0".to_string() });
    }

    if !config.sampling.is_valid() {
        return Err(Error::Config {
            message: format!(
                "sampling range [{}, {}] must be finite with low < high",
                config.sampling.low, config.sampling.high
            ),
        });
    }

    if !config.walk_step.is_finite() {
        return Err(Error::Config { message: "walk_step must be finite".to_string() });
    }

    let mapping = IndexMapping::new(config.index_mapping.clone(), config.latent_dim)?;
    let (d0, d1) = config.default_dimensions;
    for dim in [d0, d1] {
        mapping
            .resolve(dim)
            .map_err(|e| Error::Config { message: format!("default_dimensions: {e}") })?;
    }

    Ok(())
}
