use crate::math::matrix::Matrix;

/// Softmax cross-entropy over raw logits and integer class labels.
///
/// Built once per training session and shared by the training and
/// evaluation passes, so both report the same objective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrossEntropyLoss;

/// Mean loss over a batch together with its gradient w.r.t. the logits.
#[derive(Debug, Clone)]
pub struct BatchLoss {
    pub loss: f64,
    /// ∂(mean loss)/∂logits, `B x C`; already divided by `B`.
    pub grad: Matrix,
}

impl CrossEntropyLoss {
    pub fn new() -> CrossEntropyLoss {
        CrossEntropyLoss
    }

    /// Numerically stable log-softmax of one row of logits.
    fn log_softmax(logits: &[f64]) -> Vec<f64> {
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let log_sum = logits.iter().map(|z| (z - max).exp()).sum::<f64>().ln() + max;
        logits.iter().map(|z| z - log_sum).collect()
    }

    /// Per-sample loss: `-log softmax(logits)[label]`.
    pub fn loss(&self, logits: &[f64], label: usize) -> f64 {
        -Self::log_softmax(logits)[label]
    }

    /// Mean loss over the batch. Non-finite logits yield a non-finite result;
    /// callers decide whether that is fatal.
    pub fn mean_loss(&self, logits: &Matrix, labels: &[usize]) -> f64 {
        debug_assert_eq!(logits.rows, labels.len());
        let total: f64 = logits.data.iter().zip(labels)
            .map(|(row, &label)| self.loss(row, label))
            .sum();
        total / labels.len() as f64
    }

    /// Mean loss plus its gradient. For softmax cross-entropy the gradient
    /// w.r.t. logit `i` is `softmax(z)_i - [i == label]`, scaled by `1/B`.
    pub fn forward_backward(&self, logits: &Matrix, labels: &[usize]) -> BatchLoss {
        debug_assert_eq!(logits.rows, labels.len());
        let inv_batch = 1.0 / labels.len() as f64;
        let mut total = 0.0;
        let mut grad = Vec::with_capacity(labels.len());
        for (row, &label) in logits.data.iter().zip(labels) {
            let log_probs = Self::log_softmax(row);
            total -= log_probs[label];
            grad.push(
                log_probs.iter().enumerate()
                    .map(|(i, lp)| {
                        let target = if i == label { 1.0 } else { 0.0 };
                        (lp.exp() - target) * inv_batch
                    })
                    .collect(),
            );
        }
        BatchLoss {
            loss: total * inv_batch,
            grad: Matrix::from_data(grad),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_logits_give_log_num_classes() {
        let ce = CrossEntropyLoss::new();
        assert!((ce.loss(&[0.0, 0.0, 0.0], 1) - 3f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn loss_is_non_negative_and_stable_for_large_logits() {
        let ce = CrossEntropyLoss::new();
        let l = ce.loss(&[1000.0, -1000.0, 0.0], 0);
        assert!(l >= 0.0 && l < 1e-9);
        assert!(ce.loss(&[1000.0, -1000.0, 0.0], 1).is_finite());
    }

    #[test]
    fn gradient_rows_sum_to_zero_and_match_mean_loss() {
        let ce = CrossEntropyLoss::new();
        let logits = Matrix::from_data(vec![vec![2.0, -1.0, 0.5], vec![0.0, 0.3, 0.1]]);
        let labels = [2, 0];
        let out = ce.forward_backward(&logits, &labels);
        assert!((out.loss - ce.mean_loss(&logits, &labels)).abs() < 1e-12);
        for row in &out.grad.data {
            assert!(row.iter().sum::<f64>().abs() < 1e-12);
        }
        assert!(out.grad.data[0][2] < 0.0);
        assert!(out.grad.data[1][0] < 0.0);
    }

    #[test]
    fn non_finite_logits_surface_as_non_finite_loss() {
        let ce = CrossEntropyLoss::new();
        let logits = Matrix::from_data(vec![vec![f64::INFINITY, 0.0, 0.0]]);
        assert!(!ce.mean_loss(&logits, &[1]).is_finite());
    }
}
