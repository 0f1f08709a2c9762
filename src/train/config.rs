use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// Hyperparameters for one training run.
///
/// Every field has a default, so a JSON file may name any subset. The seed
/// drives initialization, dropout, shuffling and the train/test split, and
/// is saved with the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainConfig {
    /// Width `D` of the embeddings fed to the head.
    pub embedding_dim: usize,
    pub hidden_dim: usize,
    pub dropout_prob: f64,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub num_epochs: usize,
    /// Fraction of the labelled data held out for evaluation.
    pub test_fraction: f64,
    pub random_seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            embedding_dim: 384,
            hidden_dim: 256,
            dropout_prob: 0.5,
            batch_size: 64,
            learning_rate: 0.001,
            num_epochs: 100,
            test_fraction: 0.2,
            random_seed: 42,
        }
    }
}

impl TrainConfig {
    /// Checks every option. Called before any data is touched.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::Configuration(msg));
        if self.embedding_dim == 0 {
            return fail("embedding_dim must be at least 1".into());
        }
        if self.hidden_dim == 0 {
            return fail("hidden_dim must be at least 1".into());
        }
        if !(0.0..1.0).contains(&self.dropout_prob) {
            return fail(format!("dropout_prob must be in [0, 1), got {}", self.dropout_prob));
        }
        if self.batch_size == 0 {
            return fail("batch_size must be at least 1".into());
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return fail(format!("learning_rate must be finite and > 0, got {}", self.learning_rate));
        }
        if self.num_epochs == 0 {
            return fail("num_epochs must be at least 1".into());
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return fail(format!("test_fraction must be in (0, 1), got {}", self.test_fraction));
        }
        Ok(())
    }

    /// Reads and validates a config from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<TrainConfig> {
        let file = std::fs::File::open(path)?;
        let config: TrainConfig = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }
}
