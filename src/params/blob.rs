//! Raw parameter blob decoding.
//!
//! Blobs are little-endian IEEE-754 `f32` values with no header. A weight
//! blob for a layer of shape `(out, in)` stores element `(r, c)` at float
//! offset `r + out * c`: the output index varies fastest. Bias blobs are read
//! in order.

use ndarray::{Array1, Array2, ShapeBuilder};

use crate::{Error, Result};

/// Weight matrix of a decoder layer, shape `(out, in)`
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    data: Array2<f32>,
}

/// Bias vector of a decoder layer, length `out`
#[derive(Debug, Clone, PartialEq)]
pub struct BiasVector {
    data: Array1<f32>,
}

/// Result of decoding one blob
#[derive(Debug, Clone, PartialEq)]
pub enum Deserialized {
    /// Decoded with `in_dim > 0`
    Weight(WeightMatrix),
    /// Decoded with `in_dim == 0`
    Bias(BiasVector),
}

impl Deserialized {
    /// The weight matrix, if this blob was one.
    #[must_use]
    pub fn into_weight(self) -> Option<WeightMatrix> {
        match self {
            Self::Weight(w) => Some(w),
            Self::Bias(_) => None,
        }
    }

    /// The bias vector, if this blob was one.
    #[must_use]
    pub fn into_bias(self) -> Option<BiasVector> {
        match self {
            Self::Bias(b) => Some(b),
            Self::Weight(_) => None,
        }
    }
}

/// Decode a parameter blob.
///
/// `in_dim == 0` marks the buffer as a bias vector of length `out_dim`;
/// otherwise it is an `(out_dim, in_dim)` weight matrix. The buffer must hold
/// exactly `4 * out_dim * max(in_dim, 1)` bytes.
///
/// # Example
///
/// ```
/// use morpher::params::{deserialize_layer, Deserialized};
///
/// // 2x2 weights stored output-fastest: (0,0) (1,0) (0,1) (1,1)
/// let bytes: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0].iter().flat_map(|v| v.to_le_bytes()).collect();
/// let weight = deserialize_layer(&bytes, 2, 2)
///     .expect("16 bytes for 2x2")
///     .into_weight()
///     .expect("in_dim > 0");
/// assert_eq!(weight.get(1, 0), Some(2.0));
/// assert_eq!(weight.get(0, 1), Some(3.0));
/// ```
pub fn deserialize_layer(raw: &[u8], out_dim: usize, in_dim: usize) -> Result<Deserialized> {
    let expected = out_dim
        .checked_mul(in_dim.max(1))
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| Error::shape(format!("blob shape {out_dim}x{in_dim} overflows")))?;

    if raw.len() != expected {
        let name = if in_dim == 0 {
            format!("bias[{out_dim}]")
        } else {
            format!("weight[{out_dim}x{in_dim}]")
        };
        return Err(Error::ParameterSize { name, expected, actual: raw.len() });
    }

    let values: Vec<f32> = raw
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    if in_dim == 0 {
        return Ok(Deserialized::Bias(BiasVector::new(values)));
    }

    let data = Array2::from_shape_vec((out_dim, in_dim).f(), values)
        .map_err(|e| Error::shape(format!("weight matrix build error: {e}")))?;
    Ok(Deserialized::Weight(WeightMatrix { data }))
}

impl WeightMatrix {
    /// Wrap an `(out, in)` array
    #[must_use]
    pub fn new(data: Array2<f32>) -> Self {
        Self { data }
    }

    /// All-zero matrix of shape `(out, in)`
    #[must_use]
    pub fn zeros(out_dim: usize, in_dim: usize) -> Self {
        Self { data: Array2::zeros((out_dim, in_dim)) }
    }

    /// Build from rows, one row per output unit.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let out_dim = rows.len();
        let in_dim = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != in_dim) {
            return Err(Error::shape("weight rows have different lengths"));
        }
        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        let data = Array2::from_shape_vec((out_dim, in_dim), flat)
            .map_err(|e| Error::shape(format!("weight matrix build error: {e}")))?;
        Ok(Self { data })
    }

    /// Number of output units
    #[must_use]
    pub fn out_dim(&self) -> usize {
        self.data.nrows()
    }

    /// Number of input units
    #[must_use]
    pub fn in_dim(&self) -> usize {
        self.data.ncols()
    }

    /// Element `(row, col)`
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        self.data.get((row, col)).copied()
    }

    /// Underlying array
    #[must_use]
    pub fn as_array(&self) -> &Array2<f32> {
        &self.data
    }
}

impl BiasVector {
    /// Wrap bias values
    #[must_use]
    pub fn new(values: Vec<f32>) -> Self {
        Self { data: Array1::from_vec(values) }
    }

    /// All-zero bias of length `len`
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self { data: Array1::zeros(len) }
    }

    /// Number of output units
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for a zero-width layer
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Underlying array
    #[must_use]
    pub fn as_array(&self) -> &Array1<f32> {
        &self.data
    }
}
