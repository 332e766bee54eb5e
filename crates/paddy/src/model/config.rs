//! Random forest configuration with builder pattern.
//!
//! [`ForestConfig`] uses the `bon` crate for builder generation; the finishing
//! `build()` validates the parameters.
//!
//! # Example
//!
//! ```
//! use paddy::model::{ForestConfig, MaxFeatures};
//!
//! // The per-segment defaults: 100 trees, depth 5, seed 100
//! let config = ForestConfig::builder().build().unwrap();
//! assert_eq!(config.n_trees, 100);
//!
//! let config = ForestConfig::builder()
//!     .n_trees(300)
//!     .max_depth(20)
//!     .min_samples_split(5)
//!     .min_samples_leaf(2)
//!     .max_features(MaxFeatures::Sqrt)
//!     .build()
//!     .unwrap();
//! ```

use bon::Builder;
use serde::{Deserialize, Serialize};

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("n_trees must be at least 1")]
    InvalidNTrees,

    #[error("max_depth must be at least 1")]
    InvalidMaxDepth,

    #[error("min_samples_split must be at least 2, got {0}")]
    InvalidMinSamplesSplit(usize),

    #[error("min_samples_leaf must be at least 1, got {0}")]
    InvalidMinSamplesLeaf(usize),

    #[error("max_features fraction must be in (0, 1], got {0}")]
    InvalidMaxFeatures(f64),

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
}

// =============================================================================
// MaxFeatures
// =============================================================================

/// Number of candidate features examined at each split.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// Every feature (the regression default).
    #[default]
    All,
    /// `ceil(sqrt(n_features))`.
    Sqrt,
    /// `ceil(fraction * n_features)`, fraction in (0, 1].
    Fraction(f64),
}

impl MaxFeatures {
    /// Resolve to a concrete count for `n_features`, at least 1.
    pub fn resolve(self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Fraction(f) => (f * n_features as f64).ceil() as usize,
        };
        k.clamp(1, n_features.max(1))
    }
}

// =============================================================================
// ForestConfig
// =============================================================================

/// Hyperparameters of the random forest regressor.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees. Default: 100.
    #[builder(default = 100)]
    pub n_trees: u32,

    /// Maximum tree depth (root is depth 0). Default: 5.
    #[builder(default = 5)]
    pub max_depth: u32,

    /// Minimum samples required to split an internal node. Default: 2.
    #[builder(default = 2)]
    pub min_samples_split: usize,

    /// Minimum samples required in each leaf. Default: 1.
    #[builder(default = 1)]
    pub min_samples_leaf: usize,

    /// Candidate features per split. Default: all.
    #[builder(default)]
    pub max_features: MaxFeatures,

    /// Fit each tree on a bootstrap resample. Default: true.
    #[builder(default = true)]
    pub bootstrap: bool,

    /// Random seed. Default: 100.
    #[builder(default = 100)]
    pub seed: u64,

    /// Threads for fitting: 0 = auto, 1 = sequential. Default: 0.
    #[builder(default)]
    pub n_threads: usize,
}

impl<S: forest_config_builder::IsComplete> ForestConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any parameter is out of range.
    pub fn build(self) -> Result<ForestConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            bootstrap: true,
            seed: 100,
            n_threads: 0,
        }
    }
}

impl ForestConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_trees == 0 {
            return Err(ConfigError::InvalidNTrees);
        }
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidMaxDepth);
        }
        if self.min_samples_split < 2 {
            return Err(ConfigError::InvalidMinSamplesSplit(self.min_samples_split));
        }
        if self.min_samples_leaf < 1 {
            return Err(ConfigError::InvalidMinSamplesLeaf(self.min_samples_leaf));
        }
        if let MaxFeatures::Fraction(f) = self.max_features {
            if !(f > 0.0 && f <= 1.0) {
                return Err(ConfigError::InvalidMaxFeatures(f));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn builder_defaults_match_default() {
        let built = ForestConfig::builder().build().unwrap();
        assert_eq!(built, ForestConfig::default());
        assert_eq!(built.max_depth, 5);
        assert_eq!(built.seed, 100);
        assert!(built.bootstrap);
    }

    #[test]
    fn rejects_invalid_values() {
        assert_eq!(
            ForestConfig::builder().n_trees(0).build().unwrap_err(),
            ConfigError::InvalidNTrees
        );
        assert_eq!(
            ForestConfig::builder().max_depth(0).build().unwrap_err(),
            ConfigError::InvalidMaxDepth
        );
        assert_eq!(
            ForestConfig::builder().min_samples_split(1).build().unwrap_err(),
            ConfigError::InvalidMinSamplesSplit(1)
        );
        assert_eq!(
            ForestConfig::builder().min_samples_leaf(0).build().unwrap_err(),
            ConfigError::InvalidMinSamplesLeaf(0)
        );
        assert_eq!(
            ForestConfig::builder()
                .max_features(MaxFeatures::Fraction(1.5))
                .build()
                .unwrap_err(),
            ConfigError::InvalidMaxFeatures(1.5)
        );
    }

    #[rstest]
    #[case(MaxFeatures::All, 10, 10)]
    #[case(MaxFeatures::Sqrt, 10, 4)]
    #[case(MaxFeatures::Fraction(0.25), 10, 3)]
    #[case(MaxFeatures::Fraction(0.01), 10, 1)]
    #[case(MaxFeatures::All, 0, 1)]
    fn resolves_max_features(#[case] mf: MaxFeatures, #[case] n: usize, #[case] expected: usize) {
        assert_eq!(mf.resolve(n), expected);
    }

    #[test]
    fn deserializes_partial_json() {
        let config: ForestConfig =
            serde_json::from_str(r#"{"n_trees": 10, "max_features": "sqrt"}"#).unwrap();
        assert_eq!(config.n_trees, 10);
        assert_eq!(config.max_features, MaxFeatures::Sqrt);
        assert_eq!(config.max_depth, 5);
    }
}
