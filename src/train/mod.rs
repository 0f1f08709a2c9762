pub mod config;
pub mod engine;
pub mod epoch_stats;
pub mod eval;
pub mod loop_fn;
pub mod run;
pub mod session;

pub use config::TrainConfig;
pub use engine::train_epoch;
pub use epoch_stats::{batch_accuracy, EpochMetrics, EpochReport};
pub use eval::evaluate;
pub use loop_fn::{train_loop, LoopOptions};
pub use run::{embed_records, prepare_datasets, run_training, TrainingOutcome};
pub use session::TrainingSession;
