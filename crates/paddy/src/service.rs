//! The yield service: dataset, model cache and advisor behind one handle.
//!
//! The dataset is loaded at most once per service, on [`YieldService::initialize`]
//! or on first use. A failed load is logged once and every segment then reports
//! [`NotFoundReason::DatasetUnavailable`]. The table is never re-read, so cached
//! models always describe the dataset the service started with.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use serde::Serialize;

use crate::advisor::{
    Advisor, AdvisorError, ChatBackend, ChatReply, ChatRequest, FarmDetails, InstructionsReply,
    NewSession,
};
use crate::config::ServiceConfig;
use crate::data::{DatasetLoader, FileLoader, NoDataset, Table, TableSummary};
use crate::error::{NotFoundReason, SegmentError};
use crate::segment::{
    ModelCache, PredictionReport, SegmentInsights, SegmentKey, SegmentModel, SegmentTrainer,
};

/// Outcome of the one-time dataset load.
#[derive(Debug)]
enum DatasetState {
    Loaded(Arc<Table>),
    Failed(String),
}

/// Load state of the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DatasetStatus {
    NotLoaded,
    Loaded { records: usize },
    Failed { reason: String },
}

impl DatasetStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, DatasetStatus::Loaded { .. })
    }
}

/// Health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStats {
    pub dataset: DatasetStatus,
    pub cached_models: usize,
    pub active_chat_sessions: usize,
    pub backend_configured: bool,
}

/// Owns the dataset, the per-segment model cache and the chat advisor.
pub struct YieldService {
    loader: Box<dyn DatasetLoader>,
    dataset: OnceLock<DatasetState>,
    cache: ModelCache,
    trainer: SegmentTrainer,
    advisor: Advisor,
}

impl std::fmt::Debug for YieldService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YieldService")
            .field("loader", &self.loader.describe())
            .field("dataset", &self.dataset_status())
            .field("cached_models", &self.cache.len())
            .field("advisor", &self.advisor)
            .finish()
    }
}

impl YieldService {
    /// Service reading from `loader`.
    pub fn new(
        config: &ServiceConfig,
        loader: impl DatasetLoader + 'static,
        backend: Option<Box<dyn ChatBackend>>,
    ) -> Self {
        Self {
            loader: Box::new(loader),
            dataset: OnceLock::new(),
            cache: ModelCache::new(),
            trainer: SegmentTrainer::new(
                config.region_column.clone(),
                config.soil_column.clone(),
                config.forest.clone(),
                config.split_seed,
            ),
            advisor: Advisor::new(backend, config.max_message_chars),
        }
    }

    /// Service reading `config.dataset_path`, or no dataset if unset.
    pub fn from_config(config: &ServiceConfig, backend: Option<Box<dyn ChatBackend>>) -> Self {
        match &config.dataset_path {
            Some(path) => Self::new(config, FileLoader::new(path), backend),
            None => Self::new(config, NoDataset, backend),
        }
    }

    // =========================================================================
    // Dataset
    // =========================================================================

    /// Load the dataset if not yet attempted and report the result.
    ///
    /// Concurrent callers block on a single load.
    pub fn initialize(&self) -> DatasetStatus {
        self.state();
        self.dataset_status()
    }

    /// Current load state; never triggers a load.
    pub fn dataset_status(&self) -> DatasetStatus {
        match self.dataset.get() {
            None => DatasetStatus::NotLoaded,
            Some(DatasetState::Loaded(table)) => DatasetStatus::Loaded {
                records: table.n_rows(),
            },
            Some(DatasetState::Failed(reason)) => DatasetStatus::Failed {
                reason: reason.clone(),
            },
        }
    }

    /// The loaded table, loading it on first call.
    pub fn dataset(&self) -> Option<&Arc<Table>> {
        match self.state() {
            DatasetState::Loaded(table) => Some(table),
            DatasetState::Failed(_) => None,
        }
    }

    /// Summary of the loaded dataset, or `None` if it is unavailable.
    pub fn dataset_summary(&self) -> Option<TableSummary> {
        self.dataset()
            .map(|t| t.summary(self.trainer.region_column(), self.trainer.soil_column()))
    }

    fn state(&self) -> &DatasetState {
        self.dataset.get_or_init(|| {
            let source = self.loader.describe();
            let start = Instant::now();
            match self.loader.load() {
                Ok(table) => {
                    tracing::info!(
                        %source,
                        records = table.n_rows(),
                        columns = table.n_columns(),
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "dataset loaded"
                    );
                    DatasetState::Loaded(Arc::new(table))
                }
                Err(e) => {
                    tracing::error!(%source, error = %e, "dataset load failed");
                    DatasetState::Failed(e.to_string())
                }
            }
        })
    }

    // =========================================================================
    // Segments
    // =========================================================================

    /// The cached model for `key`, training it on first request.
    ///
    /// Concurrent first requests for one key train once and share the result.
    pub fn get_or_train(&self, key: &SegmentKey) -> Result<Arc<SegmentModel>, SegmentError> {
        let result = self.cache.get_or_try_insert_with(key, || {
            let table = self.dataset().ok_or_else(|| SegmentError::NotFound {
                key: key.to_string(),
                reason: NotFoundReason::DatasetUnavailable,
            })?;
            self.trainer.train(table, key)
        });

        if let Err(e) = &result {
            match e {
                SegmentError::NotFound { .. } => tracing::warn!(%key, error = %e, "no model for segment"),
                _ => tracing::error!(%key, error = %e, "segment training failed"),
            }
        }
        result
    }

    /// Insights of the model for `key`, training it if needed.
    pub fn insights(&self, key: &SegmentKey) -> Result<SegmentInsights, SegmentError> {
        self.get_or_train(key).map(|m| m.insights())
    }

    /// Prediction payload of the model for `key`, training it if needed.
    pub fn predict(&self, key: &SegmentKey) -> Result<PredictionReport, SegmentError> {
        self.get_or_train(key).map(|m| m.report())
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            dataset: self.dataset_status(),
            cached_models: self.cache.len(),
            active_chat_sessions: self.advisor.session_count(),
            backend_configured: self.advisor.backend_configured(),
        }
    }

    // =========================================================================
    // Advisor
    // =========================================================================

    /// Answer a chat message, quoting segment insights when the request's
    /// context names a region and soil with a trainable segment.
    pub fn chat(&self, request: &ChatRequest) -> Result<ChatReply, AdvisorError> {
        self.advisor.respond(request, || {
            let (region, soil) = request.context.as_ref()?.segment()?;
            self.context_insights(region, soil)
        })
    }

    pub fn new_chat_session(&self) -> NewSession {
        self.advisor.new_session()
    }

    /// Farming instructions for predicted yields on the described farm.
    pub fn instructions(
        &self,
        predictions: &[f64],
        farm: &FarmDetails,
    ) -> Result<InstructionsReply, AdvisorError> {
        let insights = farm
            .segment()
            .and_then(|(region, soil)| self.context_insights(region, soil));
        self.advisor.instructions(predictions, farm, insights)
    }

    fn context_insights(&self, region: &str, soil: &str) -> Option<SegmentInsights> {
        let key = SegmentKey::new(region, soil).ok()?;
        self.insights(&key).ok()
    }
}
