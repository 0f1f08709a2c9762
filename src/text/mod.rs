pub mod embedding;
pub mod normalizer;

pub use embedding::{EmbeddingProvider, HashingEmbedder};
pub use normalizer::{BasicNormalizer, TextNormalizer};
