use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use sentiment_head::data::csv::load_csv;
use sentiment_head::train::{embed_records, prepare_datasets, run_training};
use sentiment_head::{
    BasicNormalizer, BatchLoader, EpochReport, HashingEmbedder, LabelTable, LoopOptions, SavedModel, TrainConfig,
};

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Labelled CSV with `text` and `label` columns.
    #[arg(long)]
    pub data: PathBuf,
    /// JSON file with training options; flags below override it.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Where to write the trained model.
    #[arg(long, default_value = "model.json")]
    pub out: PathBuf,
    /// Append one JSON line per epoch to this file.
    #[arg(long)]
    pub metrics: Option<PathBuf>,
    #[arg(long)]
    pub embedding_dim: Option<usize>,
    #[arg(long)]
    pub hidden_dim: Option<usize>,
    #[arg(long)]
    pub dropout_prob: Option<f64>,
    #[arg(long)]
    pub batch_size: Option<usize>,
    #[arg(long)]
    pub learning_rate: Option<f64>,
    #[arg(long)]
    pub num_epochs: Option<usize>,
    #[arg(long)]
    pub test_fraction: Option<f64>,
    #[arg(long)]
    pub seed: Option<u64>,
}

impl TrainArgs {
    fn config(&self) -> Result<TrainConfig> {
        let mut config = match &self.config {
            Some(path) => TrainConfig::load_json(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => TrainConfig::default(),
        };
        if let Some(v) = self.embedding_dim { config.embedding_dim = v; }
        if let Some(v) = self.hidden_dim { config.hidden_dim = v; }
        if let Some(v) = self.dropout_prob { config.dropout_prob = v; }
        if let Some(v) = self.batch_size { config.batch_size = v; }
        if let Some(v) = self.learning_rate { config.learning_rate = v; }
        if let Some(v) = self.num_epochs { config.num_epochs = v; }
        if let Some(v) = self.test_fraction { config.test_fraction = v; }
        if let Some(v) = self.seed { config.random_seed = v; }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[arg(long)]
    pub model: PathBuf,
    #[arg(long)]
    pub data: PathBuf,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    #[arg(long)]
    pub model: PathBuf,
    /// Texts to classify.
    #[arg(required = true)]
    pub texts: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long)]
    pub model: PathBuf,
    #[arg(long, default_value = "127.0.0.1:7878")]
    pub addr: String,
}

fn load_model(path: &Path) -> Result<SavedModel> {
    SavedModel::load_json(path).with_context(|| format!("loading model {}", path.display()))
}

/// Drains epoch reports into a JSON-lines file on a background thread.
fn spawn_metrics_writer(path: &Path, rx: mpsc::Receiver<EpochReport>) -> Result<thread::JoinHandle<Result<()>>> {
    let file = File::create(path).with_context(|| format!("creating metrics file {}", path.display()))?;
    Ok(thread::spawn(move || {
        let mut writer = BufWriter::new(file);
        for report in rx {
            serde_json::to_writer(&mut writer, &report)?;
            writeln!(writer)?;
            writer.flush()?;
        }
        Ok(())
    }))
}

pub fn train(args: TrainArgs) -> Result<()> {
    let config = args.config()?;
    let labels = LabelTable::sentiment();
    let records = load_csv(&args.data, &labels)
        .with_context(|| format!("reading {}", args.data.display()))?;
    info!(rows = records.len(), path = %args.data.display(), "loaded dataset");

    let embedder = HashingEmbedder::new(config.embedding_dim)?;
    let (train, test) = prepare_datasets(records, &config, &BasicNormalizer, &embedder)?;

    let mut options = LoopOptions::default();
    let writer = match &args.metrics {
        Some(path) => {
            let (tx, rx) = mpsc::channel();
            options.progress_tx = Some(tx);
            Some(spawn_metrics_writer(path, rx)?)
        }
        None => None,
    };

    let outcome = run_training(config, &train, &test, &options);
    drop(options);
    if let Some(handle) = writer {
        match handle.join() {
            Ok(result) => result.context("writing metrics")?,
            Err(_) => anyhow::bail!("metrics writer thread panicked"),
        }
    }
    let outcome = outcome?;

    outcome.model.save_json(&args.out)
        .with_context(|| format!("saving model to {}", args.out.display()))?;
    if let Some(last) = outcome.reports.last() {
        println!(
            "epoch {}: train loss {:.4} acc {:.2}% | eval loss {:.4} acc {:.2}%",
            last.epoch, last.train_loss, last.train_acc * 100.0, last.eval_loss, last.eval_acc * 100.0
        );
    }
    println!("Model saved to {}", args.out.display());
    Ok(())
}

pub fn evaluate(args: EvaluateArgs) -> Result<()> {
    let model = load_model(&args.model)?;
    let records = load_csv(&args.data, &model.labels)
        .with_context(|| format!("reading {}", args.data.display()))?;
    let embedder = HashingEmbedder::new(model.config.embedding_dim)?;
    let dataset = embed_records(&records, &BasicNormalizer, &embedder)?;
    let mut loader = BatchLoader::sequential(&dataset, model.config.batch_size)?;
    let metrics = sentiment_head::evaluate(&model.head, &sentiment_head::CrossEntropyLoss::new(), loader.batches())?;
    println!(
        "{} samples: loss {:.4}, accuracy {:.2}%",
        dataset.len(), metrics.loss, metrics.accuracy * 100.0
    );
    Ok(())
}

pub fn predict(args: PredictArgs) -> Result<()> {
    let service = load_model(&args.model)?.into_service()?;
    for text in &args.texts {
        let p = service.predict(text)?;
        println!("{}\t{}", p.label, text);
    }
    Ok(())
}

pub fn serve(args: ServeArgs) -> Result<()> {
    let service = load_model(&args.model)?.into_service()?;
    println!("Serving predictions on http://{}", args.addr);
    sentiment_head::serve::serve(&service, &args.addr)?;
    Ok(())
}
