use tracing::info;

use crate::data::csv::LabelledText;
use crate::data::dataset::EmbeddingDataset;
use crate::data::split::split_train_test;
use crate::error::{Error, Result};
use crate::text::embedding::EmbeddingProvider;
use crate::text::normalizer::TextNormalizer;
use crate::train::config::TrainConfig;
use crate::train::epoch_stats::EpochReport;
use crate::train::loop_fn::{train_loop, LoopOptions};
use crate::train::session::{stream_rng, TrainingSession, SPLIT_STREAM};
use crate::model::saved::SavedModel;

/// Normalizes and embeds every record into a dataset of width `embedder.dim()`.
pub fn embed_records<N, E>(records: &[LabelledText], normalizer: &N, embedder: &E) -> Result<EmbeddingDataset>
where
    N: TextNormalizer,
    E: EmbeddingProvider,
{
    let (embeddings, labels): (Vec<Vec<f64>>, Vec<usize>) = records.iter()
        .map(|r| (embedder.embed(&normalizer.normalize(&r.text)), r.label))
        .unzip();
    EmbeddingDataset::with_dim(embeddings, labels, embedder.dim())
}

/// Seeded train/test split of raw records, embedded up front so no
/// embedding work happens inside the epoch loop.
pub fn prepare_datasets<N, E>(
    records: Vec<LabelledText>,
    config: &TrainConfig,
    normalizer: &N,
    embedder: &E,
) -> Result<(EmbeddingDataset, EmbeddingDataset)>
where
    N: TextNormalizer,
    E: EmbeddingProvider,
{
    config.validate()?;
    if embedder.dim() != config.embedding_dim {
        return Err(Error::Configuration(format!(
            "embedder width {} differs from embedding_dim {}", embedder.dim(), config.embedding_dim
        )));
    }
    let mut rng = stream_rng(config.random_seed, SPLIT_STREAM);
    let (train, test) = split_train_test(records, config.test_fraction, &mut rng)?;
    info!(train = train.len(), test = test.len(), seed = config.random_seed, "split dataset");
    Ok((
        embed_records(&train, normalizer, embedder)?,
        embed_records(&test, normalizer, embedder)?,
    ))
}

/// Everything a finished run produces.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: SavedModel,
    pub reports: Vec<EpochReport>,
}

/// Builds a session from `config`, runs the epoch loop and packages the
/// trained head with its config and label table.
pub fn run_training(
    config: TrainConfig,
    train: &EmbeddingDataset,
    eval: &EmbeddingDataset,
    options: &LoopOptions,
) -> Result<TrainingOutcome> {
    let mut session = TrainingSession::new(config)?;
    let reports = train_loop(&mut session, train, eval, options)?;
    let config = session.config().clone();
    Ok(TrainingOutcome {
        model: SavedModel::new(config, session.into_head()),
        reports,
    })
}
