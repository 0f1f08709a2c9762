use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::dataset::{EmbeddingDataset, Sample};
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Groups a dataset into batches of `batch_size`, optionally reshuffling on
/// every pass. Never mutates the dataset.
#[derive(Debug)]
pub struct BatchLoader<'a> {
    dataset: &'a EmbeddingDataset,
    batch_size: usize,
    shuffle: Option<StdRng>,
}

impl<'a> BatchLoader<'a> {
    /// Batches in original dataset order.
    pub fn sequential(dataset: &'a EmbeddingDataset, batch_size: usize) -> Result<BatchLoader<'a>> {
        BatchLoader::build(dataset, batch_size, None)
    }

    /// Batches in a fresh random order every pass, driven by `rng`.
    pub fn shuffled(dataset: &'a EmbeddingDataset, batch_size: usize, rng: StdRng) -> Result<BatchLoader<'a>> {
        BatchLoader::build(dataset, batch_size, Some(rng))
    }

    /// Shorthand for `shuffled` with a generator seeded from `seed`.
    pub fn shuffled_with_seed(dataset: &'a EmbeddingDataset, batch_size: usize, seed: u64) -> Result<BatchLoader<'a>> {
        BatchLoader::shuffled(dataset, batch_size, StdRng::seed_from_u64(seed))
    }

    fn build(dataset: &'a EmbeddingDataset, batch_size: usize, shuffle: Option<StdRng>) -> Result<BatchLoader<'a>> {
        if batch_size == 0 {
            return Err(Error::Configuration("batch_size must be at least 1".into()));
        }
        Ok(BatchLoader { dataset, batch_size, shuffle })
    }

    pub fn dataset(&self) -> &'a EmbeddingDataset {
        self.dataset
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle.is_some()
    }

    /// Number of batches in one pass.
    pub fn num_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    /// Starts a new pass. Each shuffled pass is a fresh permutation covering
    /// every sample exactly once.
    pub fn batches(&mut self) -> Batches<'a> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if let Some(rng) = self.shuffle.as_mut() {
            order.shuffle(rng);
        }
        Batches {
            dataset: self.dataset,
            order,
            batch_size: self.batch_size,
            cursor: 0,
        }
    }
}

/// One lazy pass over a dataset. The last batch may be short.
#[derive(Debug, Clone)]
pub struct Batches<'a> {
    dataset: &'a EmbeddingDataset,
    order: Vec<usize>,
    batch_size: usize,
    cursor: usize,
}

impl Batches<'_> {
    /// Embedding width of every batch in this pass.
    pub fn dim(&self) -> usize {
        self.dataset.dim()
    }
}

impl<'a> Iterator for Batches<'a> {
    type Item = Batch<'a>;

    fn next(&mut self) -> Option<Batch<'a>> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let indices = self.order[self.cursor..end].to_vec();
        self.cursor = end;
        let dataset: &'a EmbeddingDataset = self.dataset;
        let all = dataset.samples();
        let samples = indices.iter().map(|&i| &all[i]).collect();
        Some(Batch { indices, samples })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.order.len() - self.cursor).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Batches<'_> {}

/// Samples grouped for one optimization or evaluation step.
#[derive(Debug, Clone)]
pub struct Batch<'a> {
    /// Dataset indices of the samples, in batch order.
    pub indices: Vec<usize>,
    pub samples: Vec<&'a Sample>,
}

impl Batch<'_> {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Embeddings stacked as a `B x D` matrix.
    pub fn inputs(&self) -> Matrix {
        Matrix::from_data(self.samples.iter().map(|s| s.embedding().to_vec()).collect())
    }

    pub fn labels(&self) -> Vec<usize> {
        self.samples.iter().map(|s| s.label()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(n: usize) -> EmbeddingDataset {
        let embeddings = (0..n).map(|i| vec![i as f64, 0.0]).collect();
        let labels = (0..n).map(|i| i % 3).collect();
        EmbeddingDataset::new(embeddings, labels).expect("dataset")
    }

    #[test]
    fn sequential_batches_reproduce_dataset_in_order() {
        let ds = dataset(10);
        let mut loader = BatchLoader::sequential(&ds, 4).expect("loader");
        let batches: Vec<_> = loader.batches().collect();
        assert_eq!(batches.iter().map(Batch::len).collect::<Vec<_>>(), vec![4, 4, 2]);
        let flat: Vec<&Sample> = batches.iter().flat_map(|b| b.samples.iter().copied()).collect();
        assert_eq!(flat.len(), ds.len());
        for (i, s) in flat.iter().enumerate() {
            assert_eq!(*s, ds.get(i).expect("sample"));
        }
    }

    #[test]
    fn exact_multiple_ends_with_full_batch() {
        let ds = dataset(8);
        let mut loader = BatchLoader::sequential(&ds, 4).expect("loader");
        assert_eq!(loader.num_batches(), 2);
        assert!(loader.batches().all(|b| b.len() == 4));
    }

    #[test]
    fn shuffled_passes_cover_every_index_once_in_new_orders() {
        let ds = dataset(50);
        let mut loader = BatchLoader::shuffled_with_seed(&ds, 7, 99).expect("loader");
        let first: Vec<usize> = loader.batches().flat_map(|b| b.indices).collect();
        let second: Vec<usize> = loader.batches().flat_map(|b| b.indices).collect();
        for pass in [&first, &second] {
            let mut sorted = pass.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..50).collect::<Vec<_>>());
        }
        assert_ne!(first, second);
    }

    #[test]
    fn single_sample_yields_one_short_batch() {
        let ds = dataset(1);
        let mut loader = BatchLoader::sequential(&ds, 64).expect("loader");
        let batches: Vec<_> = loader.batches().collect();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
        assert_eq!(batches[0].inputs().rows, 1);
        assert_eq!(batches[0].labels(), vec![0]);
    }

    #[test]
    fn zero_batch_size_is_a_configuration_error() {
        let ds = dataset(3);
        assert!(matches!(BatchLoader::sequential(&ds, 0), Err(Error::Configuration(_))));
    }

    #[test]
    fn size_hint_counts_remaining_batches() {
        let ds = dataset(5);
        let mut loader = BatchLoader::sequential(&ds, 2).expect("loader");
        let mut pass = loader.batches();
        assert_eq!(pass.len(), 3);
        pass.next();
        assert_eq!(pass.len(), 2);
    }
}
