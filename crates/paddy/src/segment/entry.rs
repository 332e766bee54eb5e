use ndarray::Array1;
use serde::Serialize;

use super::insights::SegmentInsights;
use super::key::SegmentKey;
use crate::data::{OneHotEncoder, Table};
use crate::error::TrainError;
use crate::metrics::SplitMetrics;
use crate::model::RandomForest;

/// Importance weight of one encoded feature column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureWeight {
    pub feature: String,
    pub importance: f64,
}

/// Metrics on the train and held-out splits.
///
/// When the held-out split is empty, `test` repeats `train`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvalSummary {
    pub train: SplitMetrics,
    pub test: SplitMetrics,
}

/// Features listed in a [`PredictionReport`].
pub const REPORT_FEATURE_COUNT: usize = 5;

/// Prediction payload for one segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionReport {
    pub region: String,
    pub soil: String,
    /// Held-out predictions.
    pub predictions: Vec<f64>,
    pub train_score: f64,
    pub test_score: f64,
    pub eval: EvalSummary,
    /// Top features by importance, descending.
    pub feature_importance: Vec<FeatureWeight>,
    pub sample_count: usize,
    /// RFC 3339 time the report was produced.
    pub timestamp: String,
}

/// A trained segment model. Immutable once built and shared as `Arc`.
#[derive(Debug)]
pub struct SegmentModel {
    pub(super) key: SegmentKey,
    pub(super) forest: RandomForest,
    pub(super) encoder: OneHotEncoder,
    pub(super) predictions: Vec<f64>,
    pub(super) test_targets: Vec<f64>,
    pub(super) train_score: f64,
    pub(super) test_score: f64,
    pub(super) feature_importance: Vec<FeatureWeight>,
    pub(super) sample_count: usize,
    pub(super) eval: EvalSummary,
}

impl SegmentModel {
    pub fn key(&self) -> &SegmentKey {
        &self.key
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// The encoder fitted on this segment's rows.
    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    /// Predictions for the held-out rows, in held-out order.
    pub fn predictions(&self) -> &[f64] {
        &self.predictions
    }

    /// Actual targets of the held-out rows, aligned with [`predictions`](Self::predictions).
    pub fn test_targets(&self) -> &[f64] {
        &self.test_targets
    }

    /// Encoded feature column names.
    pub fn feature_columns(&self) -> &[String] {
        self.encoder.feature_names()
    }

    /// R² on the training rows.
    pub fn train_score(&self) -> f64 {
        self.train_score
    }

    /// R² on the held-out rows.
    pub fn test_score(&self) -> f64 {
        self.test_score
    }

    /// Importance per encoded column, in encoded-column order. Sums to 1.
    pub fn feature_importance(&self) -> &[FeatureWeight] {
        &self.feature_importance
    }

    /// Rows in the segment.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn eval(&self) -> &EvalSummary {
        &self.eval
    }

    /// The `k` most important features, descending; ties keep column order.
    pub fn top_features(&self, k: usize) -> Vec<FeatureWeight> {
        let mut ranked = self.feature_importance.clone();
        ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        ranked.truncate(k);
        ranked
    }

    /// Score new records in this segment's feature space.
    ///
    /// `table` needs the feature columns the segment was trained on; other
    /// columns are ignored. Categories unseen during training encode as zeros.
    pub fn predict_table(&self, table: &Table) -> Result<Array1<f64>, TrainError> {
        let x = self.encoder.transform(table)?;
        self.forest.predict(x.view())
    }

    pub fn report(&self) -> PredictionReport {
        PredictionReport {
            region: self.key.region().to_string(),
            soil: self.key.soil().to_string(),
            predictions: self.predictions.clone(),
            train_score: self.train_score,
            test_score: self.test_score,
            eval: self.eval,
            feature_importance: self.top_features(REPORT_FEATURE_COUNT),
            sample_count: self.sample_count,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Read-through projection for display.
    pub fn insights(&self) -> SegmentInsights {
        SegmentInsights::from_model(self)
    }
}
