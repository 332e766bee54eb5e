//! Bagged random-forest regressor.
//!
//! Each tree is grown on a bootstrap resample of the training rows with its
//! own RNG, seeded from a master [`Xoshiro256PlusPlus`] stream. Tree seeds are
//! drawn up front, so the fitted forest is identical for any thread count.

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::config::ForestConfig;
use super::tree::{grow_tree, RegressionTree, TreeParams};
use crate::error::TrainError;
use crate::utils::run_with_threads;

/// Random forest regressor: the mean of its trees' predictions.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
    config: ForestConfig,
}

impl RandomForest {
    /// Fit a forest on a sample-major feature matrix `x` and targets `y`.
    ///
    /// # Errors
    ///
    /// - [`TrainError::Config`] if `config` is invalid
    /// - [`TrainError::EmptyTrainingSet`] if `x` has no rows
    /// - [`TrainError::ShapeMismatch`] if `x` and `y` disagree on the row count
    /// - [`TrainError::NoFeatureColumns`] if `x` has no columns
    /// - [`TrainError::NonFiniteTarget`] if any target is NaN or infinite
    pub fn fit(
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        config: &ForestConfig,
    ) -> Result<Self, TrainError> {
        config.validate()?;
        let (n_rows, n_features) = x.dim();
        if n_rows == 0 {
            return Err(TrainError::EmptyTrainingSet);
        }
        if y.len() != n_rows {
            return Err(TrainError::ShapeMismatch {
                rows: n_rows,
                targets: y.len(),
            });
        }
        if n_features == 0 {
            return Err(TrainError::NoFeatureColumns);
        }
        if let Some(row) = y.iter().position(|v| !v.is_finite()) {
            return Err(TrainError::NonFiniteTarget { row });
        }

        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            max_features: config.max_features.resolve(n_features),
        };

        let mut master = Xoshiro256PlusPlus::seed_from_u64(config.seed);
        let seeds: Vec<u64> = (0..config.n_trees).map(|_| master.gen()).collect();
        let bootstrap = config.bootstrap;

        let trees = run_with_threads(config.n_threads, |parallelism| {
            parallelism.maybe_par_map(seeds, |seed| {
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
                let samples: Vec<usize> = if bootstrap {
                    (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
                } else {
                    (0..n_rows).collect()
                };
                grow_tree(x, y, &samples, &params, &mut rng)
            })
        });

        tracing::debug!(
            n_trees = trees.len(),
            n_rows,
            n_features,
            "fitted random forest"
        );

        Ok(Self {
            trees,
            n_features,
            config: config.clone(),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Predict one sample. `sample` must have `n_features` entries.
    pub fn predict_row(&self, sample: ArrayView1<f64>) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(sample)).sum();
        sum / self.trees.len() as f64
    }

    /// Predict every row of `x`.
    ///
    /// # Errors
    ///
    /// [`TrainError::FeatureCountMismatch`] if `x` has the wrong column count.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, TrainError> {
        if x.ncols() != self.n_features {
            return Err(TrainError::FeatureCountMismatch {
                expected: self.n_features,
                got: x.ncols(),
            });
        }
        Ok(x.rows().into_iter().map(|row| self.predict_row(row)).collect())
    }

    // =========================================================================
    // Importance
    // =========================================================================

    /// Mean-decrease-in-impurity importance per feature.
    ///
    /// The average of the per-tree normalised importances over trees that made
    /// at least one split, renormalised to sum to 1. A forest where no tree
    /// split (constant targets) spreads the weight uniformly.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.n_features];
        let mut n_split_trees = 0usize;
        for tree in self.trees.iter().filter(|t| t.n_nodes() > 1) {
            for (acc, v) in total.iter_mut().zip(tree.feature_importances()) {
                *acc += v;
            }
            n_split_trees += 1;
        }

        let sum: f64 = total.iter().sum();
        if n_split_trees == 0 || sum <= 0.0 {
            return vec![1.0 / self.n_features as f64; self.n_features];
        }
        total.iter_mut().for_each(|v| *v /= sum);
        total
    }
}
