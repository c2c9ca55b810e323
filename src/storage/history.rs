use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::storage::{KeyValueStore, StorageError};
use crate::tracker::{
    compute_stats, InvalidInput, PriceSample, RouteHistory, DEFAULT_QUERY_DAYS, RETENTION_DAYS,
};
use crate::utils::time::window_start;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Per-route price history persisted in the keyed store.
///
/// Histories are append-only from the caller's perspective: `append` adds
/// one sample, prunes anything older than [`RETENTION_DAYS`] relative to
/// the append time, recomputes the stats snapshot and persists the result.
/// All mutations of one route are serialized behind a per-route lock; the
/// store gives no cross-route ordering guarantee.
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    route_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

fn history_key(route_id: &str) -> String {
    format!("price-history-{route_id}")
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            route_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, route_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.route_locks.lock().await;
        locks
            .entry(route_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Load a route's history; a route never checked yields an empty
    /// history, not an error, and reading persists nothing.
    pub async fn load(&self, route_id: &str) -> Result<RouteHistory, HistoryError> {
        match self.store.read(&history_key(route_id)).await? {
            Some(bytes) => {
                let history = serde_json::from_slice(&bytes).map_err(StorageError::from)?;
                Ok(history)
            }
            None => Ok(RouteHistory::empty(route_id)),
        }
    }

    /// Append one sample to a route's history.
    ///
    /// The first sample fixes the route's identity fields. `now` is the
    /// append time and anchors both retention pruning and the recomputed
    /// stats windows.
    pub async fn append(
        &self,
        route_id: &str,
        origin: &str,
        destination: &str,
        date_range: &str,
        sample: PriceSample,
        now: DateTime<Utc>,
    ) -> Result<RouteHistory, HistoryError> {
        if route_id.is_empty() {
            return Err(InvalidInput::EmptyRouteId.into());
        }
        sample.validate()?;

        let lock = self.lock_for(route_id).await;
        let _guard = lock.lock().await;

        let mut history = self.load(route_id).await?;
        if history.origin.is_empty() {
            history.origin = origin.to_string();
            history.destination = destination.to_string();
            history.date_range = date_range.to_string();
        }

        history.samples.push(sample);

        let cutoff = window_start(now, RETENTION_DAYS);
        history.samples.retain(|s| s.check_timestamp >= cutoff);

        history.stats = compute_stats(&history.samples, now);

        let bytes = serde_json::to_vec(&history).map_err(StorageError::from)?;
        self.store.write(&history_key(route_id), &bytes).await?;

        debug!(
            target: "tracker",
            route = %route_id,
            samples = history.samples.len(),
            best_price = ?history.samples.last().and_then(|s| s.best_price),
            "price check recorded"
        );

        Ok(history)
    }

    /// History with samples filtered to the trailing `window_days` days
    /// (default 30). `None` when the route has no recorded samples. The
    /// stats snapshot is returned as persisted, not re-windowed.
    pub async fn query(
        &self,
        route_id: &str,
        window_days: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Option<RouteHistory>, HistoryError> {
        let mut history = self.load(route_id).await?;
        if history.samples.is_empty() {
            return Ok(None);
        }

        let cutoff = window_start(now, window_days.unwrap_or(DEFAULT_QUERY_DAYS));
        history.samples.retain(|s| s.check_timestamp >= cutoff);
        Ok(Some(history))
    }

    /// Erase a route's history. Idempotent.
    pub async fn erase(&self, route_id: &str) -> Result<(), HistoryError> {
        let lock = self.lock_for(route_id).await;
        let _guard = lock.lock().await;

        self.store.delete(&history_key(route_id)).await?;
        debug!(target: "tracker", route = %route_id, "price history erased");
        Ok(())
    }
}
