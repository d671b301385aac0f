//! Decoder forward pass
//!
//! ```text
//! Z (latent) ─► [W·h + b, ReLU] × hidden ─► W·h + b, sigmoid ─► reshape ─► PixelGrid
//! ```
//!
//! The encoder direction (image → latent) is not part of this module.

mod activation;
mod grid;
mod network;

pub use activation::{relu, sigmoid};
pub use grid::PixelGrid;
pub use network::{DecoderNetwork, LayerParameters};
