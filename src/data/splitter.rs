// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Decides which rows are held out for validation.
//
// Two strategies:
//
//   Trailing — the last `fraction` of rows, in file order.
//              This is what the original training script got
//              from its runtime's default, so it is the default
//              here too. If the CSV is sorted by label, the
//              validation set will be skewed.
//
//   Shuffled — Fisher-Yates shuffle with a fixed seed, then cut.
//              Reproducible for a given seed.
//
// The cut point is floor(N * (1 - fraction)) rows of training;
// everything after it is validation.
//
// Reference: rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    #[default]
    Trailing,
    Shuffled,
}

/// Number of training rows for `total` rows and a validation fraction.
pub fn train_len(total: usize, validation_fraction: f64) -> usize {
    let fraction = validation_fraction.clamp(0.0, 1.0);
    ((total as f64) * (1.0 - fraction)).floor() as usize
}

/// Split row indices `0..total` into (train, validation).
///
/// # Example
/// ```ignore
/// let (train, val) = split_indices(10, 0.2, SplitStrategy::Trailing, 42);
/// assert_eq!(train, (0..8).collect::<Vec<_>>());
/// assert_eq!(val, vec![8, 9]);
/// ```
pub fn split_indices(
    total:               usize,
    validation_fraction: f64,
    strategy:            SplitStrategy,
    seed:                u64,
) -> (Vec<usize>, Vec<usize>) {
    let mut rows: Vec<usize> = (0..total).collect();

    if strategy == SplitStrategy::Shuffled {
        let mut rng = StdRng::seed_from_u64(seed);
        rows.shuffle(&mut rng);
    }

    let split_at = train_len(total, validation_fraction).min(total);

    // split_off(n) removes elements [n..] from the Vec and returns them
    let val = rows.split_off(split_at);

    tracing::debug!(
        "Dataset split ({:?}): {} training, {} validation",
        strategy,
        rows.len(),
        val.len(),
    );

    (rows, val)
}
