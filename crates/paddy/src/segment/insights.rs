//! Display summary of a trained segment model.
//!
//! Range and average come from the held-out predictions, confidence is the
//! held-out R², and key factors are the top encoded columns by importance.

use serde::Serialize;

use super::entry::{FeatureWeight, SegmentModel};
use crate::utils::{mean, min_max};

/// Number of factors reported in insights.
pub const KEY_FACTOR_COUNT: usize = 3;

/// Summary of a segment model for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentInsights {
    /// Min and max of the held-out predictions.
    pub yield_range: Option<(f64, f64)>,
    /// Mean of the held-out predictions.
    pub average_yield: Option<f64>,
    /// Held-out R².
    pub confidence: f64,
    pub sample_size: usize,
    /// Top features by importance, descending.
    pub key_factors: Vec<FeatureWeight>,
}

impl SegmentInsights {
    pub(super) fn from_model(model: &SegmentModel) -> Self {
        let predictions = model.predictions();
        Self {
            yield_range: min_max(predictions),
            average_yield: (!predictions.is_empty()).then(|| mean(predictions)),
            confidence: model.test_score(),
            sample_size: model.sample_count(),
            key_factors: model.top_features(KEY_FACTOR_COUNT),
        }
    }

    /// `"2.90 - 3.30 tons/hectare"`.
    pub fn range_label(&self) -> Option<String> {
        self.yield_range
            .map(|(lo, hi)| format!("{lo:.2} - {hi:.2} tons/hectare"))
    }

    /// `"3.10 tons/hectare"`.
    pub fn average_label(&self) -> Option<String> {
        self.average_yield.map(|v| format!("{v:.2} tons/hectare"))
    }

    /// Confidence as a percentage with one decimal, e.g. `"87.5%"`.
    pub fn confidence_label(&self) -> String {
        format!("{:.1}%", self.confidence * 100.0)
    }

    /// Factor names joined with `", "`.
    pub fn key_factor_names(&self) -> String {
        self.key_factors
            .iter()
            .map(|f| f.feature.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insights() -> SegmentInsights {
        SegmentInsights {
            yield_range: Some((2.9, 3.3)),
            average_yield: Some(3.1),
            confidence: 0.875,
            sample_size: 12,
            key_factors: vec![
                FeatureWeight {
                    feature: "Rainfall".into(),
                    importance: 0.6,
                },
                FeatureWeight {
                    feature: "Season_Kharif".into(),
                    importance: 0.4,
                },
            ],
        }
    }

    #[test]
    fn labels() {
        let i = insights();
        assert_eq!(i.range_label().as_deref(), Some("2.90 - 3.30 tons/hectare"));
        assert_eq!(i.average_label().as_deref(), Some("3.10 tons/hectare"));
        assert_eq!(i.confidence_label(), "87.5%");
        assert_eq!(i.key_factor_names(), "Rainfall, Season_Kharif");
    }

    #[test]
    fn empty_predictions_have_no_labels() {
        let i = SegmentInsights {
            yield_range: None,
            average_yield: None,
            ..insights()
        };
        assert!(i.range_label().is_none());
        assert!(i.average_label().is_none());
    }

    #[test]
    fn serializes_factors_as_objects() {
        let json = serde_json::to_value(insights()).unwrap();
        assert_eq!(json["key_factors"][0]["feature"], "Rainfall");
        assert_eq!(json["sample_size"], 12);
    }
}
