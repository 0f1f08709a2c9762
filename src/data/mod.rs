pub mod csv;
pub mod dataset;
pub mod labels;
pub mod loader;
pub mod split;

pub use csv::{load_csv, parse_csv, LabelledText};
pub use dataset::{EmbeddingDataset, Sample};
pub use labels::LabelTable;
pub use loader::{Batch, BatchLoader, Batches};
pub use split::split_train_test;
