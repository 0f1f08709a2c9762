use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

/// Weight initialization scheme for a `Dense` layer. Biases start at zero
/// unless set with `Dense::with_bias`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Init {
    /// N(0, sqrt(2 / fan_in)); pair with ReLU.
    He,
    /// All zeros. Draws nothing from the RNG.
    Zeros,
}

/// Affine transform `z = x·W + b` over a batch.
///
/// `weights` is `input_size x size`, `biases` is `1 x size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    pub weights: Matrix,
    pub biases: Matrix,
}

/// Gradients of the loss with respect to one layer's parameters.
#[derive(Debug, Clone)]
pub struct DenseGradients {
    pub weights: Matrix,
    pub biases: Matrix,
}

impl Dense {
    pub fn new<R: Rng + ?Sized>(input_size: usize, size: usize, init: Init, rng: &mut R) -> Dense {
        let weights = match init {
            Init::He => Matrix::he(input_size, size, rng),
            Init::Zeros => Matrix::zeros(input_size, size),
        };
        Dense {
            weights,
            biases: Matrix::zeros(1, size),
        }
    }

    /// Sets every bias to `value`.
    pub fn with_bias(mut self, value: f64) -> Dense {
        self.biases = self.biases.map(|_| value);
        self
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    pub fn size(&self) -> usize {
        self.weights.cols
    }

    /// `inputs` is `B x input_size`; returns the `B x size` pre-activation.
    pub fn forward(&self, inputs: &Matrix) -> Matrix {
        (inputs * &self.weights).add_row(&self.biases)
    }

    /// Backward pass for this layer.
    ///
    /// `delta` is ∂L/∂z (`B x size`) and already carries any 1/B batch
    /// scaling. Returns the parameter gradients and ∂L/∂inputs.
    pub fn backward(&self, inputs: &Matrix, delta: &Matrix) -> (DenseGradients, Matrix) {
        let grads = DenseGradients {
            weights: &inputs.transpose() * delta,
            biases: delta.column_sums(),
        };
        let input_delta = delta * &self.weights.transpose();
        (grads, input_delta)
    }
}
