//! Random-forest regression and its training policy.
//!
//! - [`ForestConfig`]: hyperparameters (bon builder, validated)
//! - [`RandomForest`]: bagged regressor over [`RegressionTree`]s
//! - [`TrainTestSplit`]: the seeded held-out split used per segment

mod config;
mod forest;
pub mod split;
pub mod tree;

pub use config::{ConfigError, ForestConfig, MaxFeatures};
pub use forest::RandomForest;
pub use split::{holdout_fraction, holdout_size, TrainTestSplit};
pub use tree::{NodeId, RegressionTree};
