//! Memoizing model cache.
//!
//! Reads go through an [`ArcSwap`] snapshot and never block. Writers copy the
//! map under `write_lock` and swap it in. Training for a missing key is
//! single-flight: callers racing on the same key queue on a per-key gate, and
//! all but the first find the entry on re-check.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use super::entry::SegmentModel;
use super::key::SegmentKey;

type ModelMap = HashMap<SegmentKey, Arc<SegmentModel>>;

/// Unbounded cache of trained segment models, at most one entry per key.
#[derive(Debug, Default)]
pub struct ModelCache {
    entries: ArcSwap<ModelMap>,
    write_lock: Mutex<()>,
    in_flight: Mutex<HashMap<SegmentKey, Arc<Mutex<()>>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock-free lookup.
    pub fn get(&self, key: &SegmentKey) -> Option<Arc<SegmentModel>> {
        self.entries.load().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }

    /// Cached keys, sorted.
    pub fn keys(&self) -> Vec<SegmentKey> {
        let mut keys: Vec<SegmentKey> = self.entries.load().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Store `model` unless `key` already has an entry; returns the stored entry.
    pub fn insert(&self, key: SegmentKey, model: SegmentModel) -> Arc<SegmentModel> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.entries.load();
        if let Some(existing) = current.get(&key) {
            return Arc::clone(existing);
        }

        let model = Arc::new(model);
        let mut next: ModelMap = (**current).clone();
        next.insert(key, Arc::clone(&model));
        self.entries.store(Arc::new(next));
        model
    }

    /// Return the entry for `key`, running `train` at most once across
    /// concurrent callers when it is missing.
    ///
    /// A failed `train` stores nothing; the next caller tries again.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &SegmentKey,
        train: impl FnOnce() -> Result<SegmentModel, E>,
    ) -> Result<Arc<SegmentModel>, E> {
        if let Some(hit) = self.get(key) {
            tracing::debug!(%key, "model cache hit");
            return Ok(hit);
        }

        let gate = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(in_flight.entry(key.clone()).or_default())
        };

        let result = {
            let _flight = gate.lock().unwrap_or_else(PoisonError::into_inner);
            match self.get(key) {
                Some(hit) => {
                    tracing::debug!(%key, "model trained by concurrent caller");
                    Ok(hit)
                }
                None => train().map(|model| self.insert(key.clone(), model)),
            }
        };

        // Queued callers keep the gate; removing it early lets a newcomer
        // train alongside them.
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if in_flight
            .get(key)
            .is_some_and(|g| Arc::ptr_eq(g, &gate) && Arc::strong_count(&gate) == 2)
        {
            in_flight.remove(key);
        }

        result
    }
}
