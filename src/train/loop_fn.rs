use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Instant;

use tracing::{error, info, warn};

use crate::data::dataset::EmbeddingDataset;
use crate::error::{Error, Result};
use crate::train::epoch_stats::EpochReport;
use crate::train::session::TrainingSession;

/// Optional hooks for a `train_loop` run.
///
/// - `progress_tx` — one `EpochReport` is sent per completed epoch. If the
///                   receiver is dropped the loop stops after that epoch.
/// - `stop_flag`   — checked between epochs; setting it from another thread
///                   ends the run without interrupting an epoch.
#[derive(Debug, Default, Clone)]
pub struct LoopOptions {
    pub progress_tx: Option<mpsc::Sender<EpochReport>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl LoopOptions {
    fn stop_requested(&self) -> bool {
        self.stop_flag.as_ref().is_some_and(|f| f.load(Ordering::Relaxed))
    }
}

/// Trains for `config.num_epochs` epochs. Each epoch runs one training pass
/// over `train` (reshuffled) then one evaluation pass over `eval`, and
/// reports both.
///
/// Returns every report in epoch order. If an epoch fails, the run stops
/// with `Error::EpochAborted`, which carries the reports completed before it.
pub fn train_loop(
    session: &mut TrainingSession,
    train: &EmbeddingDataset,
    eval: &EmbeddingDataset,
    options: &LoopOptions,
) -> Result<Vec<EpochReport>> {
    let mut train_loader = session.train_loader(train)?;
    let mut eval_loader = session.eval_loader(eval)?;
    let total_epochs = session.config().num_epochs;
    let mut reports: Vec<EpochReport> = Vec::with_capacity(total_epochs);

    info!(
        train_samples = train.len(),
        eval_samples = eval.len(),
        batches_per_epoch = train_loader.num_batches(),
        epochs = total_epochs,
        seed = session.config().random_seed,
        "starting training"
    );

    for epoch in 1..=total_epochs {
        if options.stop_requested() {
            warn!(epoch, "stop requested; ending run before epoch");
            break;
        }

        let t_start = Instant::now();
        let outcome = session
            .train_epoch(&mut train_loader)
            .and_then(|train_metrics| {
                session.evaluate(&mut eval_loader).map(|eval_metrics| (train_metrics, eval_metrics))
            });
        let (train_metrics, eval_metrics) = match outcome {
            Ok(metrics) => metrics,
            Err(source) => {
                error!(epoch, error = %source, "epoch aborted");
                return Err(Error::EpochAborted { epoch, completed: reports, source: Box::new(source) });
            }
        };

        let report = EpochReport::new(epoch, train_metrics, eval_metrics);
        info!(
            epoch,
            total_epochs,
            train_loss = report.train_loss,
            train_acc = report.train_acc,
            eval_loss = report.eval_loss,
            eval_acc = report.eval_acc,
            elapsed_ms = t_start.elapsed().as_millis() as u64,
            "epoch complete"
        );
        reports.push(report.clone());

        if let Some(tx) = &options.progress_tx {
            if tx.send(report).is_err() {
                warn!(epoch, "progress receiver dropped; ending run");
                break;
            }
        }
    }

    Ok(reports)
}
