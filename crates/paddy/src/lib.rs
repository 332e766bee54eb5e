//! paddy: per-segment rice-yield models with an agricultural chat advisor.
//!
//! A dataset of crop records is split into segments by (region, soil type).
//! Each segment gets its own random-forest regressor, trained on first request
//! and cached for the life of the process.
//!
//! # Key Types
//!
//! - [`YieldService`] - Dataset, model cache and advisor behind one handle
//! - [`SegmentKey`] / [`SegmentModel`] - A segment and its trained model
//! - [`ForestConfig`] / [`ServiceConfig`] - Configuration builders
//! - [`Table`] - In-memory dataset
//!
//! # Usage
//!
//! ```no_run
//! use paddy::{SegmentKey, ServiceConfig, YieldService};
//!
//! let config = ServiceConfig::builder()
//!     .dataset_path("crop_yield.csv")
//!     .build()?;
//! let service = YieldService::from_config(&config, None);
//! service.initialize();
//!
//! let insights = service.insights(&SegmentKey::new("Punjab", "Loam")?)?;
//! println!("{:?}", insights.range_label());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod advisor;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod model;
pub mod segment;
pub mod service;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use config::ServiceConfig;
pub use error::{NotFoundReason, SegmentError, TrainError};
pub use service::{DatasetStatus, ServiceStats, YieldService};

pub use data::{Column, ColumnData, Table, TableBuilder};
pub use model::{ForestConfig, MaxFeatures, RandomForest};
pub use segment::{ModelCache, SegmentInsights, SegmentKey, SegmentModel, SegmentTrainer};

pub use utils::{run_with_threads, Parallelism};
