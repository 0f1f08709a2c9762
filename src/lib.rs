pub mod activation;
pub mod data;
pub mod error;
pub mod inference;
pub mod layers;
pub mod loss;
pub mod math;
pub mod model;
pub mod network;
pub mod optim;
pub mod serve;
pub mod text;
pub mod train;

// Convenience re-exports
pub use data::{BatchLoader, EmbeddingDataset, LabelTable, LabelledText, Sample};
pub use error::{Error, Result};
pub use inference::{InferenceService, Prediction};
pub use loss::CrossEntropyLoss;
pub use math::matrix::Matrix;
pub use model::SavedModel;
pub use network::{ClassifierHead, Mode};
pub use optim::{Adam, AdamConfig};
pub use text::{BasicNormalizer, EmbeddingProvider, HashingEmbedder, TextNormalizer};
pub use train::{evaluate, train_epoch, train_loop, EpochMetrics, EpochReport, LoopOptions, TrainConfig, TrainingSession};
