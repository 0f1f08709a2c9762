use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::data::dataset::EmbeddingDataset;
use crate::data::loader::BatchLoader;
use crate::error::{Error, Result};
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::network::head::ClassifierHead;
use crate::optim::adam::{Adam, AdamConfig};
use crate::train::config::TrainConfig;
use crate::train::engine::train_epoch;
use crate::train::epoch_stats::EpochMetrics;
use crate::train::eval::evaluate;

// Offsets deriving independent RNG streams from the one recorded seed.
const INIT_STREAM: u64 = 0;
const DROPOUT_STREAM: u64 = 1;
const SHUFFLE_STREAM: u64 = 2;
pub(crate) const SPLIT_STREAM: u64 = 3;

pub(crate) fn stream_rng(seed: u64, stream: u64) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add(stream.wrapping_mul(0x9e37_79b9_7f4a_7c15)))
}

/// Sole owner of the mutable training state for one run: the head, the
/// optimizer moments, the loss function and the dropout generator.
///
/// Training borrows the session mutably; evaluation only needs `&self`.
#[derive(Debug)]
pub struct TrainingSession {
    config: TrainConfig,
    head: ClassifierHead,
    optimizer: Adam,
    loss: CrossEntropyLoss,
    dropout_rng: StdRng,
}

impl TrainingSession {
    /// Validates `config` and initializes a fresh head from its seed.
    pub fn new(config: TrainConfig) -> Result<TrainingSession> {
        config.validate()?;
        let head = ClassifierHead::new(
            config.embedding_dim,
            config.hidden_dim,
            config.dropout_prob,
            &mut stream_rng(config.random_seed, INIT_STREAM),
        );
        Ok(TrainingSession::assemble(config, head))
    }

    /// Continues from existing parameters. The head's shape must agree with
    /// `config`; its dropout is reset to `config.dropout_prob`.
    pub fn with_head(config: TrainConfig, mut head: ClassifierHead) -> Result<TrainingSession> {
        config.validate()?;
        if head.input_dim() != config.embedding_dim || head.hidden_dim() != config.hidden_dim {
            return Err(Error::Configuration(format!(
                "head is {}→{} but config asks for {}→{}",
                head.input_dim(), head.hidden_dim(), config.embedding_dim, config.hidden_dim
            )));
        }
        head.dropout.p = config.dropout_prob;
        head.check_shapes()?;
        Ok(TrainingSession::assemble(config, head))
    }

    fn assemble(config: TrainConfig, head: ClassifierHead) -> TrainingSession {
        TrainingSession {
            optimizer: Adam::new(AdamConfig::new(config.learning_rate)),
            loss: CrossEntropyLoss::new(),
            dropout_rng: stream_rng(config.random_seed, DROPOUT_STREAM),
            config,
            head,
        }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn head(&self) -> &ClassifierHead {
        &self.head
    }

    pub fn into_head(self) -> ClassifierHead {
        self.head
    }

    pub fn loss(&self) -> &CrossEntropyLoss {
        &self.loss
    }

    /// Shuffling loader for the training set, seeded from the session seed.
    pub fn train_loader<'a>(&self, dataset: &'a EmbeddingDataset) -> Result<BatchLoader<'a>> {
        self.check_width(dataset)?;
        BatchLoader::shuffled(dataset, self.config.batch_size, stream_rng(self.config.random_seed, SHUFFLE_STREAM))
    }

    /// In-order loader for evaluation.
    pub fn eval_loader<'a>(&self, dataset: &'a EmbeddingDataset) -> Result<BatchLoader<'a>> {
        self.check_width(dataset)?;
        BatchLoader::sequential(dataset, self.config.batch_size)
    }

    fn check_width(&self, dataset: &EmbeddingDataset) -> Result<()> {
        self.head.check_input_width(dataset.dim())
    }

    /// One optimization pass; see `train_epoch`.
    pub fn train_epoch(&mut self, loader: &mut BatchLoader<'_>) -> Result<EpochMetrics> {
        train_epoch(&mut self.head, &mut self.optimizer, &self.loss, loader.batches(), &mut self.dropout_rng)
    }

    /// One read-only evaluation pass; see `evaluate`.
    pub fn evaluate(&self, loader: &mut BatchLoader<'_>) -> Result<EpochMetrics> {
        evaluate(&self.head, &self.loss, loader.batches())
    }
}
