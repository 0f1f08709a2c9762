use crate::math::matrix::Matrix;
use crate::network::head::{ClassifierHead, Gradients};

/// Adam hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamConfig {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl AdamConfig {
    pub fn new(learning_rate: f64) -> AdamConfig {
        AdamConfig { learning_rate, ..AdamConfig::default() }
    }
}

impl Default for AdamConfig {
    fn default() -> Self {
        AdamConfig { learning_rate: 1e-3, beta1: 0.9, beta2: 0.999, epsilon: 1e-8 }
    }
}

/// First and second moment estimates for one parameter matrix.
#[derive(Debug, Clone)]
struct Moments {
    m: Matrix,
    v: Matrix,
}

/// Adam optimizer with bias-corrected moment estimates.
///
/// ```text
/// m = β1·m + (1-β1)·g
/// v = β2·v + (1-β2)·g²
/// θ = θ - lr · m̂ / (√v̂ + ε)
/// ```
///
/// Moments are allocated lazily on the first step, matched to the head's
/// parameter shapes. Gradients are consumed per step and never accumulated.
#[derive(Debug, Clone)]
pub struct Adam {
    pub config: AdamConfig,
    step: u64,
    moments: Vec<Moments>,
}

impl Adam {
    pub fn new(config: AdamConfig) -> Adam {
        Adam { config, step: 0, moments: Vec::new() }
    }

    /// Number of updates applied so far.
    pub fn steps(&self) -> u64 {
        self.step
    }

    /// Applies one update to every parameter of `head`.
    pub fn step(&mut self, head: &mut ClassifierHead, grads: &Gradients) {
        let params = head.parameters_mut();
        if self.moments.is_empty() {
            self.moments = params.iter()
                .map(|p| Moments {
                    m: Matrix::zeros(p.rows, p.cols),
                    v: Matrix::zeros(p.rows, p.cols),
                })
                .collect();
        }

        self.step += 1;
        let AdamConfig { learning_rate, beta1, beta2, epsilon } = self.config;
        let bias1 = 1.0 - beta1.powf(self.step as f64);
        let bias2 = 1.0 - beta2.powf(self.step as f64);

        for ((param, grad), moments) in params.into_iter().zip(grads.parameters()).zip(&mut self.moments) {
            for i in 0..param.rows {
                for j in 0..param.cols {
                    let g = grad.data[i][j];
                    let m = &mut moments.m.data[i][j];
                    let v = &mut moments.v.data[i][j];
                    *m = beta1 * *m + (1.0 - beta1) * g;
                    *v = beta2 * *v + (1.0 - beta2) * g * g;
                    let m_hat = *m / bias1;
                    let v_hat = *v / bias2;
                    param.data[i][j] -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::dense::Dense;

    fn head() -> ClassifierHead {
        let hidden = Dense {
            weights: Matrix::from_data(vec![vec![1.0], vec![0.0]]),
            biases: Matrix::zeros(1, 1),
        };
        let output = Dense { weights: Matrix::zeros(1, 3), biases: Matrix::zeros(1, 3) };
        ClassifierHead::from_layers(hidden, output, 0.0).expect("valid head")
    }

    fn grads(value: f64) -> Gradients {
        let h = head();
        let fill = |m: &Matrix| m.map(|_| value);
        Gradients {
            hidden: crate::layers::dense::DenseGradients {
                weights: fill(&h.hidden.weights),
                biases: fill(&h.hidden.biases),
            },
            output: crate::layers::dense::DenseGradients {
                weights: fill(&h.output.weights),
                biases: fill(&h.output.biases),
            },
        }
    }

    #[test]
    fn first_step_moves_by_learning_rate_against_gradient() {
        let mut head = head();
        let mut adam = Adam::new(AdamConfig::new(0.01));
        adam.step(&mut head, &grads(0.5));
        assert_eq!(adam.steps(), 1);
        assert!((head.output.biases.data[0][0] + 0.01).abs() < 1e-6);
        assert!((head.hidden.weights.data[0][0] - (1.0 - 0.01)).abs() < 1e-6);
    }

    #[test]
    fn zero_gradient_leaves_parameters_untouched() {
        let mut head = head();
        let before = head.clone();
        Adam::new(AdamConfig::default()).step(&mut head, &grads(0.0));
        assert_eq!(head, before);
    }
}
