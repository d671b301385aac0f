//! Error types with actionable diagnostics.
//!
//! Asset errors (manifest, blobs, transport) surface at load time and are
//! never recovered locally. Caller-input errors are reported synchronously and
//! leave the engine state untouched.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for morpher operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the decoder engine.
///
/// Cloneable so a load failure can be reported to every waiter.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// The size manifest is missing, empty, or not a list of integers.
    #[error("Malformed size manifest: {message}\n  → Expected one line of comma-separated widths, pixel count first, e.g. \"2304,2000,2000,400\"")]
    Manifest { message: String },

    /// A parameter blob does not hold exactly the number of floats its shape declares.
    #[error("Parameter blob '{name}' has {actual} bytes, expected {expected}\n  → Re-export the blob or check the manifest widths")]
    ParameterSize { name: String, expected: usize, actual: usize },

    /// The decoder output cannot be laid out as the configured square image.
    #[error("Output shape mismatch: {message}\n  → Check that the manifest pixel count is side² for the configured image side")]
    Shape { message: String },

    /// A semantic dimension index is outside the mapping.
    #[error("Invalid semantic dimension {index}: must be in [0, {max}]")]
    InvalidDimension { index: usize, max: usize },

    /// A replacement latent vector has the wrong width.
    #[error("Latent vector has {actual} coordinates, expected {expected}")]
    LatentLength { expected: usize, actual: usize },

    /// A forward pass was requested before every parameter blob was loaded.
    ///
    /// `expected` is 0 while the manifest itself is still loading.
    #[error("Decoder parameters not ready: {loaded}/{expected} blobs loaded\n  → Await `wait_until_ready()` or poll `is_ready()` before generating")]
    NotReady { loaded: usize, expected: usize },

    /// The freeze gate was toggled on an engine configured without it.
    #[error("Coordinate freezing is disabled\n  → Set `freeze_enabled: true` in the morpher configuration")]
    FreezeDisabled,

    /// The transport failed to deliver a named asset, or delivered it twice.
    #[error("Failed to load '{name}': {message}")]
    Load { name: String, message: String },

    /// The configuration file or value is invalid.
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// IO error with the path that caused it.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source: Arc::new(source) }
    }

    /// Create a manifest error.
    pub fn manifest(message: impl Into<String>) -> Self {
        Self::Manifest { message: message.into() }
    }

    /// Create a shape error.
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape { message: message.into() }
    }

    /// Create a load error for a named asset.
    pub fn load(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load { name: name.into(), message: message.into() }
    }

    /// Check if this error was caused by caller input rather than by the assets.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDimension { .. }
                | Self::LatentLength { .. }
                | Self::NotReady { .. }
                | Self::FreezeDisabled
        )
    }

    /// Get the error code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Manifest { .. } => "M001",
            Self::ParameterSize { .. } => "M002",
            Self::Shape { .. } => "M003",
            Self::InvalidDimension { .. } => "M010",
            Self::LatentLength { .. } => "M011",
            Self::NotReady { .. } => "M020",
            Self::FreezeDisabled => "M021",
            Self::Load { .. } => "M030",
            Self::Config { .. } => "M040",
            Self::Io { .. } => "M050",
        }
    }
}
