pub mod dense;
pub mod dropout;

pub use dense::{Dense, DenseGradients, Init};
pub use dropout::Dropout;
