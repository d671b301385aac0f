//! Morpher facade
//!
//! Ties the pieces together: parameters stream in from a [`ParameterSource`]
//! on a background task while the caller edits the latent vector, and
//! [`Morpher::generate_face`] becomes available once every blob has landed.
//!
//! ```text
//! ParameterSource ──fetch──► loader (JoinSet) ──► ParameterStore ──┐
//!                                                                  ▼
//! set_coordinate / shuffle ──► LatentVector ──snapshot──► DecoderNetwork ──► PixelGrid
//! ```

mod facade;
mod loader;
mod source;

pub use facade::Morpher;
pub use loader::LoadStatus;
pub use source::{FileSource, MemorySource, ParameterSource};
