use crate::error::{Error, Result};
use crate::network::head::NUM_CLASSES;

/// One (embedding, label) pair. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    embedding: Vec<f64>,
    label: usize,
}

impl Sample {
    pub fn embedding(&self) -> &[f64] {
        &self.embedding
    }

    pub fn label(&self) -> usize {
        self.label
    }
}

/// Validated, read-only collection of samples sharing one embedding width.
#[derive(Debug, Clone)]
pub struct EmbeddingDataset {
    samples: Vec<Sample>,
    dim: usize,
}

impl EmbeddingDataset {
    /// Builds a dataset whose width is taken from the first embedding.
    pub fn new(embeddings: Vec<Vec<f64>>, labels: Vec<usize>) -> Result<EmbeddingDataset> {
        let dim = embeddings.first()
            .map(Vec::len)
            .ok_or_else(|| Error::Input("dataset must contain at least one sample".into()))?;
        EmbeddingDataset::with_dim(embeddings, labels, dim)
    }

    /// Builds a dataset and requires every embedding to have length `dim`.
    pub fn with_dim(embeddings: Vec<Vec<f64>>, labels: Vec<usize>, dim: usize) -> Result<EmbeddingDataset> {
        if embeddings.len() != labels.len() {
            return Err(Error::Input(format!(
                "{} embeddings but {} labels", embeddings.len(), labels.len()
            )));
        }
        if embeddings.is_empty() {
            return Err(Error::Input("dataset must contain at least one sample".into()));
        }
        if dim == 0 {
            return Err(Error::Input("embedding width must be positive".into()));
        }

        let samples = embeddings.into_iter().zip(labels).enumerate()
            .map(|(i, (embedding, label))| {
                if embedding.len() != dim {
                    return Err(Error::Input(format!(
                        "sample {i}: embedding has length {}, expected {dim}", embedding.len()
                    )));
                }
                if label >= NUM_CLASSES {
                    return Err(Error::Input(format!(
                        "sample {i}: label {label} outside 0..{NUM_CLASSES}"
                    )));
                }
                if let Some(x) = embedding.iter().find(|x| !x.is_finite()) {
                    return Err(Error::Input(format!("sample {i}: embedding contains {x}")));
                }
                Ok(Sample { embedding, label })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(EmbeddingDataset { samples, dim })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Embedding width shared by every sample.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get(&self, index: usize) -> Result<&Sample> {
        self.samples.get(index).ok_or(Error::OutOfRange { index, len: self.samples.len() })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_access_and_out_of_range() {
        let ds = EmbeddingDataset::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]], vec![0, 2]).expect("dataset");
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dim(), 2);
        assert_eq!(ds.get(1).expect("sample").embedding(), &[3.0, 4.0]);
        assert_eq!(ds.get(1).expect("sample").label(), 2);
        assert!(matches!(ds.get(2), Err(Error::OutOfRange { index: 2, len: 2 })));
    }

    #[test]
    fn rejects_malformed_samples() {
        assert!(matches!(
            EmbeddingDataset::new(vec![vec![1.0, 2.0], vec![3.0]], vec![0, 1]),
            Err(Error::Input(_))
        ));
        assert!(matches!(
            EmbeddingDataset::new(vec![vec![1.0]], vec![3]),
            Err(Error::Input(_))
        ));
        assert!(matches!(
            EmbeddingDataset::new(vec![vec![1.0]], vec![0, 1]),
            Err(Error::Input(_))
        ));
        assert!(matches!(
            EmbeddingDataset::with_dim(vec![vec![1.0, 2.0]], vec![0], 384),
            Err(Error::Input(_))
        ));
        assert!(matches!(EmbeddingDataset::new(vec![], vec![]), Err(Error::Input(_))));
    }
}
