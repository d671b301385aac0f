//! Decoder parameter loading
//!
//! Turns the size manifest and raw parameter blobs into typed per-layer
//! weights and biases, and tracks how many blobs have arrived.
//!
//! ```text
//! sizes.csv ──► LayerSizes ──► ParameterStore ◄── d_W_k.bin / d_b_k.bin
//!                                    │
//!                                    └──► DecoderNetwork (once ready)
//! ```

mod blob;
mod manifest;
mod store;

pub use blob::{deserialize_layer, BiasVector, Deserialized, WeightMatrix};
pub use manifest::{load_manifest, LayerSizes};
pub use store::{is_fully_loaded, BlobRole, LoadState, ParameterStore};

pub(crate) use manifest::perfect_square_root;
