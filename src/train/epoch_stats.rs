use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;
use crate::network::head::argmax;

/// Mean loss and accuracy over one pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Mean of the per-batch mean cross-entropy.
    pub loss: f64,
    /// Mean of the per-batch accuracy, in [0, 1].
    pub accuracy: f64,
}

/// The per-epoch record emitted by `train_loop`, in epoch order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochReport {
    /// 1-based epoch number.
    pub epoch: usize,
    pub train_loss: f64,
    pub train_acc: f64,
    pub eval_loss: f64,
    pub eval_acc: f64,
}

impl EpochReport {
    pub fn new(epoch: usize, train: EpochMetrics, eval: EpochMetrics) -> EpochReport {
        EpochReport {
            epoch,
            train_loss: train.loss,
            train_acc: train.accuracy,
            eval_loss: eval.loss,
            eval_acc: eval.accuracy,
        }
    }
}

/// Running sums of per-batch loss and accuracy.
#[derive(Debug, Default)]
pub(crate) struct MetricsAccumulator {
    loss: f64,
    accuracy: f64,
    batches: usize,
}

impl MetricsAccumulator {
    pub(crate) fn push(&mut self, loss: f64, accuracy: f64) {
        self.loss += loss;
        self.accuracy += accuracy;
        self.batches += 1;
    }

    /// `None` if no batch was recorded.
    pub(crate) fn finish(self) -> Option<EpochMetrics> {
        (self.batches > 0).then(|| EpochMetrics {
            loss: self.loss / self.batches as f64,
            accuracy: self.accuracy / self.batches as f64,
        })
    }
}

/// Fraction of rows whose argmax equals the label.
pub fn batch_accuracy(logits: &Matrix, labels: &[usize]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = logits.data.iter().zip(labels)
        .filter(|&(row, &label)| argmax(row) == label)
        .count();
    correct as f64 / labels.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_counts_argmax_hits() {
        let logits = Matrix::from_data(vec![
            vec![0.1, 0.2, 0.9],
            vec![0.0, 0.0, 0.0],
            vec![0.5, 0.4, 0.1],
            vec![0.0, 1.0, 0.0],
        ]);
        assert_eq!(batch_accuracy(&logits, &[2, 0, 1, 1]), 0.75);
    }

    #[test]
    fn accumulator_averages_per_batch() {
        let mut acc = MetricsAccumulator::default();
        acc.push(1.0, 0.5);
        acc.push(3.0, 1.0);
        let m = acc.finish().expect("metrics");
        assert_eq!(m, EpochMetrics { loss: 2.0, accuracy: 0.75 });
        assert!(MetricsAccumulator::default().finish().is_none());
    }

    #[test]
    fn report_serializes_with_stream_field_names() {
        let r = EpochReport::new(3, EpochMetrics { loss: 0.5, accuracy: 1.0 }, EpochMetrics { loss: 0.25, accuracy: 0.5 });
        let json = serde_json::to_string(&r).expect("serialize");
        assert_eq!(json, r#"{"epoch":3,"train_loss":0.5,"train_acc":1.0,"eval_loss":0.25,"eval_acc":0.5}"#);
    }
}
