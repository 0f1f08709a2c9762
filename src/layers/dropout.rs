use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;
use crate::network::mode::Mode;

/// Inverted dropout: during training each unit is zeroed with probability
/// `p` and survivors are scaled by `1 / (1 - p)`, so evaluation needs no
/// rescaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dropout {
    pub p: f64,
}

impl Dropout {
    pub fn new(p: f64) -> Dropout {
        Dropout { p }
    }

    /// Draws a `rows x cols` mask, or `None` when no masking applies
    /// (evaluation mode, or `p == 0`). The RNG is untouched when `None`.
    pub fn mask<R: Rng + ?Sized>(&self, rows: usize, cols: usize, mode: Mode, rng: &mut R) -> Option<Matrix> {
        if mode == Mode::Evaluation || self.p <= 0.0 {
            return None;
        }
        let keep = 1.0 / (1.0 - self.p);
        let data = (0..rows)
            .map(|_| {
                (0..cols)
                    .map(|_| if rng.gen::<f64>() < self.p { 0.0 } else { keep })
                    .collect()
            })
            .collect();
        Some(Matrix::from_data(data))
    }
}
