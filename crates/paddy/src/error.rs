//! Error types for segment training and lookup.

use std::fmt;

use crate::data::{EncodeError, TableError};
use crate::model::ConfigError;

// =============================================================================
// TrainError
// =============================================================================

/// Why a segment could not be trained even though rows were found.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error("column '{0}' not found in dataset")]
    MissingColumn(String),

    #[error("key column '{0}' is not categorical")]
    KeyColumnNotCategorical(String),

    #[error("dataset has no feature columns")]
    NoFeatureColumns,

    #[error("target column '{0}' is not numeric")]
    NonNumericTarget(String),

    #[error("target is not finite at row {row}")]
    NonFiniteTarget { row: usize },

    #[error("feature matrix has {rows} rows but {targets} targets")]
    ShapeMismatch { rows: usize, targets: usize },

    #[error("expected {expected} features, got {got}")]
    FeatureCountMismatch { expected: usize, got: usize },

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

// =============================================================================
// SegmentError
// =============================================================================

/// Why no model exists for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundReason {
    /// No row matches the region/soil pair.
    NoMatchingRows,
    /// Fewer than two rows matched.
    InsufficientRows { rows: usize },
    /// The dataset failed to load.
    DatasetUnavailable,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::NoMatchingRows => write!(f, "no matching rows"),
            NotFoundReason::InsufficientRows { rows } => {
                write!(f, "only {rows} matching row(s), need at least 2")
            }
            NotFoundReason::DatasetUnavailable => write!(f, "dataset unavailable"),
        }
    }
}

/// Errors surfaced by `get_or_train` and `insights`.
#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    #[error("invalid segment key: {0}")]
    InvalidKey(String),

    #[error("no model for {key}: {reason}")]
    NotFound { key: String, reason: NotFoundReason },

    #[error("training failed for {key}: {source}")]
    TrainingFailure {
        key: String,
        #[source]
        source: TrainError,
    },
}

impl SegmentError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SegmentError::NotFound { .. })
    }

    /// The not-found reason, if this is a `NotFound`.
    pub fn not_found_reason(&self) -> Option<&NotFoundReason> {
        match self {
            SegmentError::NotFound { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
