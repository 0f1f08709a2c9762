pub mod head;
pub mod mode;

pub use head::{argmax, ClassifierHead, ForwardPass, Gradients, NUM_CLASSES};
pub use mode::Mode;
