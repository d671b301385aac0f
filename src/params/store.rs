//! Parameter store: per-layer slots filled once, plus load progress.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use super::blob::{deserialize_layer, BiasVector, Deserialized, WeightMatrix};
use super::manifest::LayerSizes;
use crate::decoder::{DecoderNetwork, LayerParameters};
use crate::{Error, Result};

/// Which half of a layer a blob holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobRole {
    /// `(out, in)` weight matrix
    Weight,
    /// Length-`out` bias vector
    Bias,
}

/// Count of parameter blobs that finished deserializing.
///
/// Only ever increases.
#[derive(Debug, Default)]
pub struct LoadState {
    loaded: AtomicUsize,
}

impl LoadState {
    /// A state with nothing loaded
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more loaded blob and return the new count.
    pub fn record(&self) -> usize {
        self.loaded.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Blobs loaded so far
    #[must_use]
    pub fn loaded(&self) -> usize {
        self.loaded.load(Ordering::Acquire)
    }
}

/// True iff every one of `expected` blobs has loaded.
#[must_use]
pub fn is_fully_loaded(state: &LoadState, expected: usize) -> bool {
    state.loaded() == expected
}

/// Typed parameters of every decoder layer, filled as blobs arrive.
///
/// Slots are indexed by file layer `k` (0 = pixel side). Each slot accepts
/// exactly one value, so the load counter can never pass the expected count.
#[derive(Debug)]
pub struct ParameterStore {
    sizes: LayerSizes,
    weights: Vec<OnceLock<Arc<WeightMatrix>>>,
    biases: Vec<OnceLock<Arc<BiasVector>>>,
    state: LoadState,
}

impl ParameterStore {
    /// Empty store shaped by a manifest
    #[must_use]
    pub fn new(sizes: LayerSizes) -> Self {
        let layers = sizes.layer_count();
        Self {
            sizes,
            weights: (0..layers).map(|_| OnceLock::new()).collect(),
            biases: (0..layers).map(|_| OnceLock::new()).collect(),
            state: LoadState::new(),
        }
    }

    /// The manifest this store was built from
    #[must_use]
    pub fn sizes(&self) -> &LayerSizes {
        &self.sizes
    }

    /// Decode `raw` as the `role` blob of layer `layer` and store it.
    ///
    /// `name` only labels errors. Returns the number of blobs loaded so far.
    pub fn load_blob(&self, layer: usize, role: BlobRole, name: &str, raw: &[u8]) -> Result<usize> {
        let (out_dim, in_dim) = self
            .sizes
            .layer_shape(layer)
            .ok_or_else(|| Error::load(name, format!("layer {layer} is not in the manifest")))?;

        let in_dim = match role {
            BlobRole::Weight => in_dim,
            BlobRole::Bias => 0,
        };

        let decoded = deserialize_layer(raw, out_dim, in_dim).map_err(|e| match e {
            Error::ParameterSize { expected, actual, .. } => {
                Error::ParameterSize { name: name.to_string(), expected, actual }
            }
            other => other,
        })?;

        match decoded {
            Deserialized::Weight(weight) => self.insert_weight(layer, weight),
            Deserialized::Bias(bias) => self.insert_bias(layer, bias),
        }
    }

    /// Store the weight matrix of layer `layer`.
    pub fn insert_weight(&self, layer: usize, weight: WeightMatrix) -> Result<usize> {
        let (out_dim, in_dim) = self.shape_of(layer)?;
        if (weight.out_dim(), weight.in_dim()) != (out_dim, in_dim) {
            return Err(Error::shape(format!(
                "layer {layer} weight is {}x{}, manifest declares {out_dim}x{in_dim}",
                weight.out_dim(),
                weight.in_dim()
            )));
        }
        self.weights[layer]
            .set(Arc::new(weight))
            .map_err(|_| Error::load(format!("weight {layer}"), "already loaded"))?;
        Ok(self.state.record())
    }

    /// Store the bias vector of layer `layer`.
    pub fn insert_bias(&self, layer: usize, bias: BiasVector) -> Result<usize> {
        let (out_dim, _) = self.shape_of(layer)?;
        if bias.len() != out_dim {
            return Err(Error::shape(format!(
                "layer {layer} bias has {} values, manifest declares {out_dim}",
                bias.len()
            )));
        }
        self.biases[layer]
            .set(Arc::new(bias))
            .map_err(|_| Error::load(format!("bias {layer}"), "already loaded"))?;
        Ok(self.state.record())
    }

    fn shape_of(&self, layer: usize) -> Result<(usize, usize)> {
        self.sizes.layer_shape(layer).ok_or_else(|| {
            Error::shape(format!(
                "layer {layer} is outside the {}-layer manifest",
                self.sizes.layer_count()
            ))
        })
    }

    /// Blobs loaded so far
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.state.loaded()
    }

    /// Blobs needed before the decoder can run
    #[must_use]
    pub fn expected_count(&self) -> usize {
        self.sizes.expected_blob_count()
    }

    /// Whether every blob has loaded
    #[must_use]
    pub fn is_ready(&self) -> bool {
        is_fully_loaded(&self.state, self.expected_count())
    }

    /// Assemble the decoder, layers ordered from the latent side to the pixel side.
    pub fn decoder(&self, image_side: usize) -> Result<DecoderNetwork> {
        let not_ready =
            || Error::NotReady { loaded: self.loaded_count(), expected: self.expected_count() };
        if !self.is_ready() {
            return Err(not_ready());
        }

        let layers = (0..self.sizes.layer_count())
            .rev()
            .map(|k| {
                let weight = self.weights[k].get().ok_or_else(&not_ready)?;
                let bias = self.biases[k].get().ok_or_else(&not_ready)?;
                LayerParameters::from_shared(Arc::clone(weight), Arc::clone(bias))
            })
            .collect::<Result<Vec<_>>>()?;

        DecoderNetwork::new(layers, image_side)
    }
}
