//! Regression metrics.
//!
//! Metrics for evaluating a fitted segment model on its train and held-out
//! splits. All metrics are unweighted and take predictions and targets of
//! equal length.
//!
//! # Available Metrics
//!
//! - [`R2`]: Coefficient of determination
//! - [`Rmse`]: Root Mean Squared Error
//! - [`Mae`]: Mean Absolute Error

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// A scalar evaluation metric.
pub trait MetricFn: Send + Sync {
    /// Compute the metric. Empty input yields `0.0`.
    fn compute(&self, predictions: ArrayView1<f64>, targets: ArrayView1<f64>) -> f64;

    /// Whether higher values indicate a better fit.
    fn higher_is_better(&self) -> bool;

    fn name(&self) -> &'static str;
}

// =============================================================================
// R² (Coefficient of Determination)
// =============================================================================

/// Coefficient of determination: `1 - SS_res / SS_tot`.
///
/// Higher is better; 1.0 is a perfect fit. When the targets are constant
/// (`SS_tot == 0`, which includes a single sample) the score is `1.0` for a
/// perfect prediction and `0.0` otherwise, so the result is always finite.
#[derive(Debug, Clone, Copy, Default)]
pub struct R2;

impl MetricFn for R2 {
    fn compute(&self, predictions: ArrayView1<f64>, targets: ArrayView1<f64>) -> f64 {
        debug_assert_eq!(predictions.len(), targets.len());
        let n = targets.len();
        if n == 0 {
            return 0.0;
        }

        let mean = targets.sum() / n as f64;
        let (ss_res, ss_tot) = predictions
            .iter()
            .zip(targets.iter())
            .fold((0.0f64, 0.0f64), |(res, tot), (&p, &y)| {
                (res + (y - p) * (y - p), tot + (y - mean) * (y - mean))
            });

        if ss_tot == 0.0 {
            return if ss_res == 0.0 { 1.0 } else { 0.0 };
        }
        1.0 - ss_res / ss_tot
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "r2"
    }
}

// =============================================================================
// RMSE (Root Mean Squared Error)
// =============================================================================

/// Root Mean Squared Error: sqrt(mean((pred - label)²))
///
/// Lower is better.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rmse;

impl MetricFn for Rmse {
    fn compute(&self, predictions: ArrayView1<f64>, targets: ArrayView1<f64>) -> f64 {
        let n = targets.len();
        if n == 0 {
            return 0.0;
        }
        let sum_sq: f64 = predictions
            .iter()
            .zip(targets.iter())
            .map(|(&p, &y)| (p - y) * (p - y))
            .sum();
        (sum_sq / n as f64).sqrt()
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "rmse"
    }
}

// =============================================================================
// MAE (Mean Absolute Error)
// =============================================================================

/// Mean Absolute Error: mean(|pred - label|)
///
/// Lower is better. More robust to outliers than RMSE.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mae;

impl MetricFn for Mae {
    fn compute(&self, predictions: ArrayView1<f64>, targets: ArrayView1<f64>) -> f64 {
        let n = targets.len();
        if n == 0 {
            return 0.0;
        }
        let sum_abs: f64 = predictions
            .iter()
            .zip(targets.iter())
            .map(|(&p, &y)| (p - y).abs())
            .sum();
        sum_abs / n as f64
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "mae"
    }
}

// =============================================================================
// Split evaluation
// =============================================================================

/// R², RMSE and MAE for one data split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitMetrics {
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,
}

impl SplitMetrics {
    pub fn evaluate(predictions: ArrayView1<f64>, targets: ArrayView1<f64>) -> Self {
        Self {
            r2: R2.compute(predictions, targets),
            rmse: Rmse.compute(predictions, targets),
            mae: Mae.compute(predictions, targets),
        }
    }
}
