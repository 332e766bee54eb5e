//! Service configuration.
//!
//! [`ServiceConfig`] is built with `bon` and validated on `build()`, or read
//! from a JSON file where every field is optional:
//!
//! ```
//! use paddy::ServiceConfig;
//!
//! let config = ServiceConfig::builder()
//!     .dataset_path("data/crop_yield.csv")
//!     .max_message_chars(500)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.region_column, "State");
//! ```

use std::path::{Path, PathBuf};

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::model::{ConfigError, ForestConfig};
use crate::segment::{DEFAULT_REGION_COLUMN, DEFAULT_SOIL_COLUMN, DEFAULT_SPLIT_SEED};

/// Longest accepted chat message, in characters.
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 1000;

/// Error reading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
#[serde(default)]
pub struct ServiceConfig {
    /// Dataset file. Without one every segment is unavailable.
    #[builder(into)]
    pub dataset_path: Option<PathBuf>,

    /// Column holding the region label. Default: `"State"`.
    #[builder(into, default = DEFAULT_REGION_COLUMN.to_string())]
    pub region_column: String,

    /// Column holding the soil type. Default: `"Soil"`.
    #[builder(into, default = DEFAULT_SOIL_COLUMN.to_string())]
    pub soil_column: String,

    /// Forest hyperparameters for every segment.
    #[builder(default)]
    pub forest: ForestConfig,

    /// Seed of the train/test shuffle. Default: 100.
    #[builder(default = DEFAULT_SPLIT_SEED)]
    pub split_seed: u64,

    /// Chat message length limit. Default: 1000.
    #[builder(default = DEFAULT_MAX_MESSAGE_CHARS)]
    pub max_message_chars: usize,
}

impl<S: service_config_builder::IsComplete> ServiceConfigBuilder<S> {
    /// Build and validate the configuration.
    pub fn build(self) -> Result<ServiceConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            dataset_path: None,
            region_column: DEFAULT_REGION_COLUMN.to_string(),
            soil_column: DEFAULT_SOIL_COLUMN.to_string(),
            forest: ForestConfig::default(),
            split_seed: DEFAULT_SPLIT_SEED,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region_column.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                field: "region_column",
            });
        }
        if self.soil_column.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                field: "soil_column",
            });
        }
        self.forest.validate()
    }

    /// Read and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}
