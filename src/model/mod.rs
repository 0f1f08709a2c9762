pub mod saved;

pub use saved::{SavedModel, FORMAT_VERSION};
