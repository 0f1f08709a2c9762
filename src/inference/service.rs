use serde::Serialize;

use crate::data::labels::LabelTable;
use crate::error::{Error, Result};
use crate::network::head::{argmax, ClassifierHead, NUM_CLASSES};
use crate::text::embedding::EmbeddingProvider;
use crate::text::normalizer::TextNormalizer;

/// Classifier output for one text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub index: usize,
    pub logits: [f64; NUM_CLASSES],
}

/// normalize → embed → classify (evaluation mode) → decode label.
///
/// Holds the head immutably; prediction never changes parameters.
#[derive(Debug, Clone)]
pub struct InferenceService<N, E> {
    normalizer: N,
    embedder: E,
    head: ClassifierHead,
    labels: LabelTable,
}

impl<N: TextNormalizer, E: EmbeddingProvider> InferenceService<N, E> {
    pub fn new(normalizer: N, embedder: E, head: ClassifierHead, labels: LabelTable) -> Result<Self> {
        if embedder.dim() != head.input_dim() {
            return Err(Error::Input(format!(
                "embedder produces width {}, head expects {}", embedder.dim(), head.input_dim()
            )));
        }
        if labels.len() != NUM_CLASSES {
            return Err(Error::Input(format!(
                "label table has {} entries, head produces {NUM_CLASSES} scores", labels.len()
            )));
        }
        Ok(InferenceService { normalizer, embedder, head, labels })
    }

    pub fn head(&self) -> &ClassifierHead {
        &self.head
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn predict(&self, text: &str) -> Result<Prediction> {
        let normalized = self.normalizer.normalize(text);
        let embedding = self.embedder.embed(&normalized);
        let logits = self.head.score(&embedding)?;
        if let Some(x) = logits.iter().find(|x| !x.is_finite()) {
            return Err(Error::NumericInstability { batch: 0, value: *x });
        }
        let index = argmax(&logits);
        let label = self.labels.name(index)
            .ok_or_else(|| Error::Input(format!("no label for class {index}")))?
            .to_owned();
        Ok(Prediction { label, index, logits })
    }
}
