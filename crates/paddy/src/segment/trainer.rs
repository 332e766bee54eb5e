//! Training of one segment model from the full dataset.

use std::time::Instant;

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

use super::entry::{EvalSummary, FeatureWeight, SegmentModel};
use super::key::SegmentKey;
use crate::data::{Column, OneHotEncoder, Table};
use crate::error::{NotFoundReason, SegmentError, TrainError};
use crate::metrics::{MetricFn, SplitMetrics, R2};
use crate::model::{ForestConfig, RandomForest, TrainTestSplit};

/// Default column holding the region label.
pub const DEFAULT_REGION_COLUMN: &str = "State";
/// Default column holding the soil type label.
pub const DEFAULT_SOIL_COLUMN: &str = "Soil";
/// Default seed of the train/test shuffle.
pub const DEFAULT_SPLIT_SEED: u64 = 100;

/// Filters, encodes, splits and fits one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentTrainer {
    region_column: String,
    soil_column: String,
    forest: ForestConfig,
    split_seed: u64,
}

impl Default for SegmentTrainer {
    fn default() -> Self {
        Self::new(
            DEFAULT_REGION_COLUMN,
            DEFAULT_SOIL_COLUMN,
            ForestConfig::default(),
            DEFAULT_SPLIT_SEED,
        )
    }
}

impl SegmentTrainer {
    pub fn new(
        region_column: impl Into<String>,
        soil_column: impl Into<String>,
        forest: ForestConfig,
        split_seed: u64,
    ) -> Self {
        Self {
            region_column: region_column.into(),
            soil_column: soil_column.into(),
            forest,
            split_seed,
        }
    }

    pub fn region_column(&self) -> &str {
        &self.region_column
    }

    pub fn soil_column(&self) -> &str {
        &self.soil_column
    }

    pub fn forest_config(&self) -> &ForestConfig {
        &self.forest
    }

    pub fn split_seed(&self) -> u64 {
        self.split_seed
    }

    /// Indices of the rows whose region and soil equal the key exactly.
    pub fn matching_rows(&self, table: &Table, key: &SegmentKey) -> Result<Vec<usize>, TrainError> {
        let regions = key_column(table, &self.region_column)?;
        let soils = key_column(table, &self.soil_column)?;
        Ok(regions
            .iter()
            .zip(soils)
            .enumerate()
            .filter(|(_, (r, s))| {
                r.as_deref() == Some(key.region()) && s.as_deref() == Some(key.soil())
            })
            .map(|(i, _)| i)
            .collect())
    }

    /// Train the model for `key` on `table`.
    ///
    /// # Errors
    ///
    /// - [`SegmentError::NotFound`] when fewer than two rows match
    /// - [`SegmentError::TrainingFailure`] when the dataset is malformed or
    ///   fitting fails
    pub fn train(&self, table: &Table, key: &SegmentKey) -> Result<SegmentModel, SegmentError> {
        let failure = |source: TrainError| SegmentError::TrainingFailure {
            key: key.to_string(),
            source,
        };
        let not_found = |reason: NotFoundReason| SegmentError::NotFound {
            key: key.to_string(),
            reason,
        };

        let start = Instant::now();
        let rows = self.matching_rows(table, key).map_err(failure)?;
        if rows.is_empty() {
            return Err(not_found(NotFoundReason::NoMatchingRows));
        }

        let segment = table.take_rows(&rows).map_err(|e| failure(e.into()))?;
        let y = target_values(&segment).map_err(failure)?;
        let (encoder, x) = OneHotEncoder::fit_transform(&segment).map_err(|e| failure(e.into()))?;

        let n = x.nrows();
        if n < 2 {
            return Err(not_found(NotFoundReason::InsufficientRows { rows: n }));
        }

        let split = TrainTestSplit::for_segment(n, self.split_seed);
        let x_train = x.select(Axis(0), &split.train);
        let y_train = y.select(Axis(0), &split.train);
        let forest = RandomForest::fit(x_train.view(), y_train.view(), &self.forest).map_err(failure)?;
        let scores = score_split(&forest, x.view(), y.view(), &split).map_err(failure)?;

        let feature_importance = encoder
            .feature_names()
            .iter()
            .zip(forest.feature_importances())
            .map(|(name, importance)| FeatureWeight {
                feature: name.clone(),
                importance,
            })
            .collect();

        tracing::info!(
            %key,
            rows = n,
            train_rows = split.train.len(),
            test_rows = split.test.len(),
            features = encoder.n_features(),
            train_r2 = scores.train_score,
            test_r2 = scores.test_score,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "trained segment model"
        );

        Ok(SegmentModel {
            key: key.clone(),
            forest,
            encoder,
            predictions: scores.predictions,
            test_targets: scores.test_targets,
            train_score: scores.train_score,
            test_score: scores.test_score,
            feature_importance,
            sample_count: n,
            eval: scores.eval,
        })
    }
}

/// Scores of a fitted forest on both sides of a split.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SplitScores {
    pub train_score: f64,
    pub test_score: f64,
    pub eval: EvalSummary,
    /// Held-out predictions, in held-out order.
    pub predictions: Vec<f64>,
    pub test_targets: Vec<f64>,
}

/// Score `forest` on the train and test rows of `split`.
///
/// An empty test split reuses the train score and metrics.
pub(crate) fn score_split(
    forest: &RandomForest,
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    split: &TrainTestSplit,
) -> Result<SplitScores, TrainError> {
    let x_train = x.select(Axis(0), &split.train);
    let y_train = y.select(Axis(0), &split.train);
    let train_preds = forest.predict(x_train.view())?;
    let train_metrics = SplitMetrics::evaluate(train_preds.view(), y_train.view());
    let train_score = R2.compute(train_preds.view(), y_train.view());

    if split.test.is_empty() {
        return Ok(SplitScores {
            train_score,
            test_score: train_score,
            eval: EvalSummary {
                train: train_metrics,
                test: train_metrics,
            },
            predictions: Vec::new(),
            test_targets: Vec::new(),
        });
    }

    let x_test = x.select(Axis(0), &split.test);
    let y_test = y.select(Axis(0), &split.test);
    let test_preds = forest.predict(x_test.view())?;
    Ok(SplitScores {
        train_score,
        test_score: R2.compute(test_preds.view(), y_test.view()),
        eval: EvalSummary {
            train: train_metrics,
            test: SplitMetrics::evaluate(test_preds.view(), y_test.view()),
        },
        predictions: test_preds.to_vec(),
        test_targets: y_test.to_vec(),
    })
}

fn key_column<'a>(table: &'a Table, name: &str) -> Result<&'a [Option<String>], TrainError> {
    table
        .column(name)
        .ok_or_else(|| TrainError::MissingColumn(name.to_string()))?
        .as_categorical()
        .ok_or_else(|| TrainError::KeyColumnNotCategorical(name.to_string()))
}

/// Numeric, finite target values of the last column.
fn target_values(segment: &Table) -> Result<Array1<f64>, TrainError> {
    if segment.feature_columns().is_empty() {
        return Err(TrainError::NoFeatureColumns);
    }
    let target: &Column = segment.target().ok_or(TrainError::NoFeatureColumns)?;
    let values = target
        .as_numeric()
        .ok_or_else(|| TrainError::NonNumericTarget(target.name().to_string()))?;
    if let Some(row) = values.iter().position(|v| !v.is_finite()) {
        return Err(TrainError::NonFiniteTarget { row });
    }
    Ok(Array1::from(values.to_vec()))
}
