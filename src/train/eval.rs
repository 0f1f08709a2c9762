use tracing::debug;

use crate::data::loader::Batches;
use crate::error::{Error, Result};
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::network::head::ClassifierHead;
use crate::train::epoch_stats::{batch_accuracy, EpochMetrics, MetricsAccumulator};

/// Mean per-batch loss and accuracy in evaluation mode.
///
/// Takes the head by shared reference: no gradients, no parameter or
/// optimizer state is touched, and no randomness is consumed. Identical
/// inputs give identical outputs. Batches whose width differs from the
/// head's input are rejected with `Error::Input` before any work is done.
pub fn evaluate(head: &ClassifierHead, loss_fn: &CrossEntropyLoss, batches: Batches<'_>) -> Result<EpochMetrics> {
    head.check_input_width(batches.dim())?;
    let mut metrics = MetricsAccumulator::default();

    for (batch_idx, batch) in batches.enumerate() {
        let labels = batch.labels();
        let logits = head.logits(&batch.inputs());
        let loss = loss_fn.mean_loss(&logits, &labels);
        if !loss.is_finite() {
            return Err(Error::NumericInstability { batch: batch_idx, value: loss });
        }
        let accuracy = batch_accuracy(&logits, &labels);
        debug!(batch = batch_idx, size = batch.len(), loss, accuracy, "eval batch");
        metrics.push(loss, accuracy);
    }

    metrics.finish().ok_or_else(|| Error::Input("evaluation pass produced no batches".into()))
}
