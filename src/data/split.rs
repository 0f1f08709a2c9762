use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Error, Result};

/// Shuffles `items` with `rng` and splits them into `(train, test)`.
///
/// The test side receives `round(n * test_fraction)` items, clamped so that
/// both sides keep at least one item.
pub fn split_train_test<T, R: Rng + ?Sized>(
    mut items: Vec<T>,
    test_fraction: f64,
    rng: &mut R,
) -> Result<(Vec<T>, Vec<T>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::Configuration(format!(
            "test_fraction must be in (0, 1), got {test_fraction}"
        )));
    }
    let total = items.len();
    if total < 2 {
        return Err(Error::Input(format!(
            "need at least 2 samples to split into train and test, got {total}"
        )));
    }

    items.shuffle(rng);
    let n_test = ((total as f64) * test_fraction).round() as usize;
    let n_test = n_test.clamp(1, total - 1);
    let test = items.split_off(total - n_test);
    Ok((items, test))
}
