//! Elementwise activations of the decoder.

/// Rectified linear unit
#[inline]
pub fn relu(x: f32) -> f32 {
    x.max(0.0)
}

/// Logistic sigmoid: σ(x) = 1 / (1 + exp(-x))
///
/// Split on the sign of `x` so neither branch overflows `exp`.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let exp_x = x.exp();
        exp_x / (1.0 + exp_x)
    }
}
