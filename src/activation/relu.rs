use crate::math::matrix::Matrix;

/// Element-wise max(0, x).
pub fn relu(z: &Matrix) -> Matrix {
    z.map(|x| if x > 0.0 { x } else { 0.0 })
}

/// Element-wise ReLU derivative evaluated at the pre-activation `z`.
/// The subgradient at exactly zero is taken as 0.
pub fn relu_derivative(z: &Matrix) -> Matrix {
    z.map(|x| if x > 0.0 { 1.0 } else { 0.0 })
}
