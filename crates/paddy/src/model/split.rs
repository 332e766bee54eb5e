//! Held-out split policy.
//!
//! A segment of `n` rows holds out `clamp(1/n, 0.1, 0.2)` of its rows for
//! evaluation. The test size is `ceil(fraction * n)` and the rest trains, so
//! any segment with at least two rows gets a non-empty train split and at
//! least one held-out row.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Smallest held-out fraction.
pub const MIN_HOLDOUT_FRACTION: f64 = 0.1;
/// Largest held-out fraction.
pub const MAX_HOLDOUT_FRACTION: f64 = 0.2;

/// Held-out fraction for a segment with `n_rows` rows.
///
/// `n_rows == 0` is treated as one row.
#[inline]
pub fn holdout_fraction(n_rows: usize) -> f64 {
    let inverse = 1.0 / n_rows.max(1) as f64;
    inverse.clamp(MIN_HOLDOUT_FRACTION, MAX_HOLDOUT_FRACTION)
}

/// Number of held-out rows for `n_rows` rows at `fraction`.
///
/// Never exceeds `n_rows - 1` when `n_rows >= 2`, so training always keeps a row.
#[inline]
pub fn holdout_size(n_rows: usize, fraction: f64) -> usize {
    if n_rows < 2 {
        return 0;
    }
    let n_test = (fraction * n_rows as f64).ceil() as usize;
    n_test.min(n_rows - 1)
}

/// Row indices of a train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    /// Deterministic shuffled split of `0..n_rows`.
    ///
    /// The same `(n_rows, fraction, seed)` always yields the same split. The
    /// first `holdout_size` rows of the shuffled order are held out.
    pub fn new(n_rows: usize, fraction: f64, seed: u64) -> Self {
        let mut order: Vec<usize> = (0..n_rows).collect();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        order.shuffle(&mut rng);

        let n_test = holdout_size(n_rows, fraction);
        let train = order.split_off(n_test);
        Self { train, test: order }
    }

    /// Split using the segment policy [`holdout_fraction`].
    pub fn for_segment(n_rows: usize, seed: u64) -> Self {
        Self::new(n_rows, holdout_fraction(n_rows), seed)
    }
}
