//! Decoder network: latent vector → pixel grid.

use std::sync::Arc;

use ndarray::{Array1, ArrayView1};

use super::activation::{relu, sigmoid};
use super::grid::PixelGrid;
use crate::latent::LatentVector;
use crate::params::{BiasVector, WeightMatrix};
use crate::{Error, Result};

/// Weight and bias of one dense layer.
///
/// Parameters are shared with the [`ParameterStore`](crate::params::ParameterStore)
/// that loaded them, so assembling a network does not copy any weights.
#[derive(Debug, Clone)]
pub struct LayerParameters {
    weight: Arc<WeightMatrix>,
    bias: Arc<BiasVector>,
}

impl LayerParameters {
    /// Pair a weight matrix with its bias.
    pub fn new(weight: WeightMatrix, bias: BiasVector) -> Result<Self> {
        Self::from_shared(Arc::new(weight), Arc::new(bias))
    }

    /// Pair shared parameters; the bias length must equal the weight's output width.
    pub fn from_shared(weight: Arc<WeightMatrix>, bias: Arc<BiasVector>) -> Result<Self> {
        if bias.len() != weight.out_dim() {
            return Err(Error::shape(format!(
                "bias has {} values for a layer with {} outputs",
                bias.len(),
                weight.out_dim()
            )));
        }
        Ok(Self { weight, bias })
    }

    /// A layer whose weights and biases are all zero
    #[must_use]
    pub fn zeros(out_dim: usize, in_dim: usize) -> Self {
        Self {
            weight: Arc::new(WeightMatrix::zeros(out_dim, in_dim)),
            bias: Arc::new(BiasVector::zeros(out_dim)),
        }
    }

    /// Input width
    #[must_use]
    pub fn in_dim(&self) -> usize {
        self.weight.in_dim()
    }

    /// Output width
    #[must_use]
    pub fn out_dim(&self) -> usize {
        self.weight.out_dim()
    }

    /// Weight matrix
    #[must_use]
    pub fn weight(&self) -> &WeightMatrix {
        &self.weight
    }

    /// Bias vector
    #[must_use]
    pub fn bias(&self) -> &BiasVector {
        &self.bias
    }

    /// `W · h + b`
    fn affine(&self, input: ArrayView1<'_, f32>) -> Array1<f32> {
        self.weight.as_array().dot(&input) + self.bias.as_array()
    }
}

/// Feedforward decoder
///
/// Hidden layers apply an affine map followed by ReLU; the final layer applies
/// an affine map followed by a sigmoid, and its output is laid out as a square
/// image. The forward pass is a pure function of the latent vector.
///
/// # Example
///
/// ```
/// use morpher::decoder::{DecoderNetwork, LayerParameters};
/// use morpher::latent::LatentVector;
///
/// let network = DecoderNetwork::new(vec![LayerParameters::zeros(4, 3)], 2)
///     .expect("3 → 4 pixels");
/// let grid = network.forward(&LatentVector::zeros(3)).expect("forward pass");
/// assert!(grid.as_slice().iter().all(|p| *p == 0.5));
/// ```
#[derive(Debug, Clone)]
pub struct DecoderNetwork {
    /// Layers from the latent side to the pixel side
    layers: Vec<LayerParameters>,
    image_side: usize,
}

impl DecoderNetwork {
    /// Build a decoder from layers ordered latent side first.
    ///
    /// Consecutive layers must chain: each layer's output width is the next
    /// layer's input width.
    pub fn new(layers: Vec<LayerParameters>, image_side: usize) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::shape("decoder needs at least one layer"));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].out_dim() != pair[1].in_dim() {
                return Err(Error::shape(format!(
                    "layer {i} outputs {} values but layer {} expects {}",
                    pair[0].out_dim(),
                    i + 1,
                    pair[1].in_dim()
                )));
            }
        }
        Ok(Self { layers, image_side })
    }

    /// Map a latent vector to an image.
    pub fn forward(&self, z: &LatentVector) -> Result<PixelGrid> {
        if z.dim() != self.latent_dim() {
            return Err(Error::LatentLength { expected: self.latent_dim(), actual: z.dim() });
        }

        let (output, hidden) = self
            .layers
            .split_last()
            .ok_or_else(|| Error::shape("decoder needs at least one layer"))?;

        let mut h = ArrayView1::from(z.as_slice()).to_owned();
        for layer in hidden {
            h = layer.affine(h.view()).mapv_into(relu);
        }
        let flat = output.affine(h.view()).mapv_into(sigmoid);

        PixelGrid::from_flat(flat.to_vec(), self.image_side)
    }

    /// Width of the latent input
    #[must_use]
    pub fn latent_dim(&self) -> usize {
        self.layers.first().map_or(0, LayerParameters::in_dim)
    }

    /// Side of the output image
    #[must_use]
    pub fn image_side(&self) -> usize {
        self.image_side
    }

    /// Number of dense layers
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Layers from the latent side to the pixel side
    #[must_use]
    pub fn layers(&self) -> &[LayerParameters] {
        &self.layers
    }

    /// Total number of weights and biases
    #[must_use]
    pub fn num_parameters(&self) -> usize {
        self.layers.iter().map(|l| l.out_dim() * l.in_dim() + l.out_dim()).sum()
    }
}
