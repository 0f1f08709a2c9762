use rand::Rng;
use tracing::debug;

use crate::data::loader::Batches;
use crate::error::{Error, Result};
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::network::head::ClassifierHead;
use crate::network::mode::Mode;
use crate::optim::adam::Adam;
use crate::train::epoch_stats::{batch_accuracy, EpochMetrics, MetricsAccumulator};

/// Runs one optimization pass over `batches` and returns the mean per-batch
/// loss and accuracy.
///
/// Every batch: forward in `Mode::Training`, mean cross-entropy, backward,
/// one Adam step. Gradients are computed fresh per batch and never carried
/// over. Loss and accuracy are measured on the same forward pass that
/// produced the gradients.
///
/// A non-finite loss or gradient aborts the pass with
/// `Error::NumericInstability` before the offending update is applied.
/// Batches narrower or wider than the head's input fail with `Error::Input`
/// and leave the head untouched.
pub fn train_epoch<R: Rng + ?Sized>(
    head: &mut ClassifierHead,
    optimizer: &mut Adam,
    loss_fn: &CrossEntropyLoss,
    batches: Batches<'_>,
    rng: &mut R,
) -> Result<EpochMetrics> {
    head.check_input_width(batches.dim())?;
    let mut metrics = MetricsAccumulator::default();

    for (batch_idx, batch) in batches.enumerate() {
        let inputs = batch.inputs();
        let labels = batch.labels();

        let pass = head.forward(&inputs, Mode::Training, rng);
        let out = loss_fn.forward_backward(&pass.logits, &labels);
        if !out.loss.is_finite() {
            return Err(Error::NumericInstability { batch: batch_idx, value: out.loss });
        }
        let accuracy = batch_accuracy(&pass.logits, &labels);

        let grads = head.backward(&inputs, &pass, &out.grad);
        if let Some(value) = grads.first_non_finite() {
            return Err(Error::NumericInstability { batch: batch_idx, value });
        }
        optimizer.step(head, &grads);

        debug!(batch = batch_idx, size = batch.len(), loss = out.loss, accuracy, "train batch");
        metrics.push(out.loss, accuracy);
    }

    metrics.finish().ok_or_else(|| Error::Input("training pass produced no batches".into()))
}
