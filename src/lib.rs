//! Interactive face decoder.
//!
//! This crate runs the decoder half of a trained variational autoencoder:
//! - Parameter loading from a size manifest and raw float blobs
//! - A 400-wide latent vector edited through 29 semantic dimensions
//! - A dense ReLU/sigmoid forward pass producing a 48×48 grayscale face
//!
//! Parameters load asynchronously; the latent vector can be inspected and
//! edited before they arrive, and generation is refused until they have.
//!
//! # Example
//!
//! ```no_run
//! use morpher::{FileSource, Morpher, MorpherConfig};
//!
//! # async fn run() -> morpher::Result<()> {
//! let morpher = Morpher::create(FileSource::new("assets"), MorpherConfig::default())?;
//! morpher.set_coordinate(0, -0.5)?;
//! morpher.wait_until_ready().await?;
//!
//! let face = morpher.generate_face()?;
//! let pixels: Vec<u8> = face.to_grayscale_bytes();
//! assert_eq!(pixels.len(), 48 * 48);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod latent;
pub mod morpher;
pub mod params;

pub use config::MorpherConfig;
pub use decoder::{DecoderNetwork, PixelGrid};
pub use error::{Error, Result};
pub use latent::{IndexMapping, LatentVector};
pub use morpher::{FileSource, LoadStatus, MemorySource, Morpher, ParameterSource};
