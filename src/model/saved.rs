use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::data::labels::LabelTable;
use crate::error::{Error, Result};
use crate::inference::service::InferenceService;
use crate::network::head::ClassifierHead;
use crate::text::embedding::HashingEmbedder;
use crate::text::normalizer::BasicNormalizer;
use crate::train::config::TrainConfig;

pub const FORMAT_VERSION: u32 = 1;

/// A trained head plus everything needed to use it again: the label table,
/// and the config (including the seed) it was trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModel {
    pub format_version: u32,
    pub config: TrainConfig,
    pub labels: LabelTable,
    pub head: ClassifierHead,
}

impl SavedModel {
    pub fn new(config: TrainConfig, head: ClassifierHead) -> SavedModel {
        SavedModel {
            format_version: FORMAT_VERSION,
            config,
            labels: LabelTable::sentiment(),
            head,
        }
    }

    /// Checks that the parts agree with each other.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(Error::Input(format!(
                "unsupported model format version {}, expected {FORMAT_VERSION}", self.format_version
            )));
        }
        self.config.validate()?;
        if self.labels != LabelTable::sentiment() {
            return Err(Error::Input(format!(
                "model label table {:?} is not the sentiment table", self.labels.names()
            )));
        }
        self.head.check_shapes()?;
        if self.head.input_dim() != self.config.embedding_dim || self.head.hidden_dim() != self.config.hidden_dim {
            return Err(Error::Input(format!(
                "head is {}→{} but config records {}→{}",
                self.head.input_dim(), self.head.hidden_dim(),
                self.config.embedding_dim, self.config.hidden_dim
            )));
        }
        Ok(())
    }

    /// Serializes the model to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes and validates a model written by `save_json`.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<SavedModel> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let model: SavedModel = serde_json::from_reader(reader)?;
        model.validate()?;
        Ok(model)
    }

    /// Inference pipeline using the built-in normalizer and hashing embedder
    /// at the recorded width.
    pub fn into_service(self) -> Result<InferenceService<BasicNormalizer, HashingEmbedder>> {
        let embedder = HashingEmbedder::new(self.config.embedding_dim)?;
        InferenceService::new(BasicNormalizer, embedder, self.head, self.labels)
    }
}
