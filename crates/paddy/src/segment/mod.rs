//! Per-(region, soil) models.
//!
//! A segment is the subset of dataset rows sharing one [`SegmentKey`].
//! [`SegmentTrainer`] turns a segment into a [`SegmentModel`], and
//! [`ModelCache`] keeps at most one model per key for the process lifetime.

mod cache;
mod entry;
mod insights;
mod key;
mod trainer;

pub use cache::ModelCache;
pub use entry::{EvalSummary, FeatureWeight, PredictionReport, SegmentModel, REPORT_FEATURE_COUNT};
pub use insights::{SegmentInsights, KEY_FACTOR_COUNT};
pub use key::SegmentKey;
pub use trainer::{SegmentTrainer, DEFAULT_REGION_COLUMN, DEFAULT_SOIL_COLUMN, DEFAULT_SPLIT_SEED};
