use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::relu::{relu, relu_derivative};
use crate::error::{Error, Result};
use crate::layers::dense::{Dense, DenseGradients, Init};
use crate::layers::dropout::Dropout;
use crate::math::matrix::Matrix;
use crate::network::mode::Mode;

/// Width of the output layer: negative, neutral, positive.
pub const NUM_CLASSES: usize = 3;

/// Initial hidden bias. Positive so ReLU units start active.
const HIDDEN_BIAS_INIT: f64 = 0.1;

/// Two-layer feed-forward classifier over a fixed-width embedding:
///
/// ```text
/// hidden = dropout(ReLU(x·W1 + b1))     // dropout only in Mode::Training
/// logits = hidden·W2 + b2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierHead {
    pub hidden: Dense,
    pub output: Dense,
    pub dropout: Dropout,
}

/// Everything the backward pass needs from one forward pass.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    /// Pre-activation of the hidden layer (`B x H`).
    pub hidden_pre: Matrix,
    /// Hidden activations after ReLU and dropout (`B x H`).
    pub hidden: Matrix,
    /// Dropout mask applied to the hidden layer, if any.
    pub mask: Option<Matrix>,
    /// Unnormalized class scores (`B x 3`).
    pub logits: Matrix,
}

/// Loss gradients for every parameter of a `ClassifierHead`.
#[derive(Debug, Clone)]
pub struct Gradients {
    pub hidden: DenseGradients,
    pub output: DenseGradients,
}

impl Gradients {
    /// Same order as `ClassifierHead::parameters`.
    pub fn parameters(&self) -> [&Matrix; 4] {
        [
            &self.hidden.weights,
            &self.hidden.biases,
            &self.output.weights,
            &self.output.biases,
        ]
    }

    pub fn first_non_finite(&self) -> Option<f64> {
        self.parameters().iter().find_map(|m| m.first_non_finite())
    }
}

impl ClassifierHead {
    /// He-initialized hidden weights with a small positive bias; the output
    /// layer starts at zero, so every class scores the same until the first
    /// update.
    pub fn new<R: Rng + ?Sized>(input_dim: usize, hidden_dim: usize, dropout_prob: f64, rng: &mut R) -> ClassifierHead {
        ClassifierHead {
            hidden: Dense::new(input_dim, hidden_dim, Init::He, rng).with_bias(HIDDEN_BIAS_INIT),
            output: Dense::new(hidden_dim, NUM_CLASSES, Init::Zeros, rng),
            dropout: Dropout::new(dropout_prob),
        }
    }

    /// Builds a head from explicit parameters, checking that the shapes chain.
    pub fn from_layers(hidden: Dense, output: Dense, dropout_prob: f64) -> Result<ClassifierHead> {
        let head = ClassifierHead { hidden, output, dropout: Dropout::new(dropout_prob) };
        head.check_shapes()?;
        Ok(head)
    }

    pub(crate) fn check_shapes(&self) -> Result<()> {
        for param in self.parameters() {
            param.check_consistent()?;
        }
        let (h, o) = (&self.hidden, &self.output);
        if h.biases.rows != 1 || h.biases.cols != h.size() {
            return Err(Error::Input(format!(
                "hidden bias is {}x{}, expected 1x{}", h.biases.rows, h.biases.cols, h.size()
            )));
        }
        if o.input_size() != h.size() {
            return Err(Error::Input(format!(
                "output layer expects {} inputs but hidden layer has {} units",
                o.input_size(), h.size()
            )));
        }
        if o.size() != NUM_CLASSES || o.biases.rows != 1 || o.biases.cols != NUM_CLASSES {
            return Err(Error::Input(format!(
                "output layer must produce {} scores, got {}", NUM_CLASSES, o.size()
            )));
        }
        if !(0.0..1.0).contains(&self.dropout.p) {
            return Err(Error::Input(format!("dropout probability {} outside [0, 1)", self.dropout.p)));
        }
        Ok(())
    }

    pub fn input_dim(&self) -> usize {
        self.hidden.input_size()
    }

    pub fn hidden_dim(&self) -> usize {
        self.hidden.size()
    }

    /// Fails with `Error::Input` unless inputs of `width` fit this head.
    pub fn check_input_width(&self, width: usize) -> Result<()> {
        if width != self.input_dim() {
            return Err(Error::Input(format!(
                "embeddings have width {}, head expects {}", width, self.input_dim()
            )));
        }
        Ok(())
    }

    /// Batched forward pass. `inputs` is `B x input_dim`.
    ///
    /// The RNG is consumed only when `mode` is `Training` and dropout is
    /// non-zero.
    pub fn forward<R: Rng + ?Sized>(&self, inputs: &Matrix, mode: Mode, rng: &mut R) -> ForwardPass {
        let hidden_pre = self.hidden.forward(inputs);
        let mask = self.dropout.mask(hidden_pre.rows, hidden_pre.cols, mode, rng);
        let activated = relu(&hidden_pre);
        let hidden = match &mask {
            Some(m) => activated.hadamard(m),
            None => activated,
        };
        let logits = self.output.forward(&hidden);
        ForwardPass { hidden_pre, hidden, mask, logits }
    }

    /// Evaluation-mode logits for a batch. Deterministic.
    pub fn logits(&self, inputs: &Matrix) -> Matrix {
        let hidden = relu(&self.hidden.forward(inputs));
        self.output.forward(&hidden)
    }

    /// Evaluation-mode logits for a single embedding.
    pub fn score(&self, embedding: &[f64]) -> Result<[f64; NUM_CLASSES]> {
        self.check_input_width(embedding.len())?;
        let logits = self.logits(&Matrix::row_vector(embedding.to_vec()));
        let mut out = [0.0; NUM_CLASSES];
        out.copy_from_slice(logits.row(0));
        Ok(out)
    }

    /// Backpropagates `grad_logits` (∂L/∂logits, `B x 3`) through the pass
    /// that produced it.
    pub fn backward(&self, inputs: &Matrix, pass: &ForwardPass, grad_logits: &Matrix) -> Gradients {
        let (output, grad_hidden) = self.output.backward(&pass.hidden, grad_logits);
        let grad_hidden = match &pass.mask {
            Some(m) => grad_hidden.hadamard(m),
            None => grad_hidden,
        };
        let delta = grad_hidden.hadamard(&relu_derivative(&pass.hidden_pre));
        let (hidden, _) = self.hidden.backward(inputs, &delta);
        Gradients { hidden, output }
    }

    /// W1, b1, W2, b2.
    pub fn parameters(&self) -> [&Matrix; 4] {
        [
            &self.hidden.weights,
            &self.hidden.biases,
            &self.output.weights,
            &self.output.biases,
        ]
    }

    /// W1, b1, W2, b2. Only the optimizer should write through these.
    pub fn parameters_mut(&mut self) -> [&mut Matrix; 4] {
        [
            &mut self.hidden.weights,
            &mut self.hidden.biases,
            &mut self.output.weights,
            &mut self.output.biases,
        ]
    }
}

/// Index of the largest score. Ties go to the lowest index; NaN never wins.
pub fn argmax(v: &[f64]) -> usize {
    let mut best = 0;
    for (i, &x) in v.iter().enumerate().skip(1) {
        if x > v[best] || v[best].is_nan() {
            best = i;
        }
    }
    best
}
