//! Latent space operations
//!
//! A [`LatentVector`] is the point Z the decoder maps to an image. Only a few
//! of its coordinates influence the output; those are addressed through an
//! [`IndexMapping`] by a small semantic index instead of their raw position.
//!
//! ```text
//! semantic 0..28 ──► IndexMapping ──► raw 0..399 ──► Z[raw] = value
//! ```

mod mapping;
mod vector;

pub use mapping::{IndexMapping, STANDARD_INDEX_MAPPING};
pub use vector::LatentVector;
