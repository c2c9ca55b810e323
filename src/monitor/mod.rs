use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::storage::{KeyValueStore, StorageError};
use crate::types::MonitorDefaults;

/// Key under which the monitor registry record lives in the keyed store.
const MONITORS_KEY: &str = "monitors";

/// Per-route monitoring configuration. The scheduler collaborator reads
/// `schedule`/`timezone`; this crate only stores them.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMonitor {
    pub route_id: String,
    pub origin: String,
    pub destination: String,
    pub date_range: String,
    /// Cron expression, e.g. "0 7 * * *".
    pub schedule: String,
    pub timezone: String,
    pub threshold_percent: i64,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_checked_at: Option<DateTime<Utc>>,
}

/// Caller-supplied overrides for `setup`.
#[derive(Clone, Debug, Default)]
pub struct MonitorRequest {
    pub date_range: Option<String>,
    pub schedule: Option<String>,
    pub timezone: Option<String>,
    pub threshold_percent: Option<i64>,
}

/// Partial update for an existing monitor; `None` fields are left alone.
#[derive(Clone, Debug, Default)]
pub struct MonitorUpdate {
    pub date_range: Option<String>,
    pub schedule: Option<String>,
    pub timezone: Option<String>,
    pub threshold_percent: Option<i64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct MonitorsRecord {
    #[serde(default)]
    routes: BTreeMap<String, RouteMonitor>,
}

/// Daily cron expression for a given UTC wall-clock time.
pub fn daily_schedule(hour: u32, minute: u32) -> Option<String> {
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(format!("{minute} {hour} * * *"))
}

/// Registry of monitored routes, persisted as a single record in the keyed
/// store. Read-modify-write cycles are serialized behind one lock; the
/// registry is small and mutated rarely.
pub struct MonitorRegistry {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl MonitorRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    async fn load_record(&self) -> Result<MonitorsRecord, StorageError> {
        match self.store.read(MONITORS_KEY).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(MonitorsRecord::default()),
        }
    }

    async fn save_record(&self, record: &MonitorsRecord) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(record)?;
        self.store.write(MONITORS_KEY, &bytes).await
    }

    /// Create or replace the monitor for a route.
    pub async fn setup(
        &self,
        route_id: &str,
        origin: &str,
        destination: &str,
        request: MonitorRequest,
        defaults: &MonitorDefaults,
        now: DateTime<Utc>,
    ) -> Result<RouteMonitor, StorageError> {
        let _guard = self.write_lock.lock().await;

        let monitor = RouteMonitor {
            route_id: route_id.to_string(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            date_range: request.date_range.unwrap_or_else(|| "flexible".to_string()),
            schedule: request.schedule.unwrap_or_else(|| defaults.schedule.clone()),
            timezone: request.timezone.unwrap_or_else(|| defaults.timezone.clone()),
            threshold_percent: request
                .threshold_percent
                .unwrap_or(defaults.price_drop_threshold_pct),
            enabled: true,
            created_at: now,
            last_checked_at: None,
        };

        let mut record = self.load_record().await?;
        record.routes.insert(route_id.to_string(), monitor.clone());
        self.save_record(&record).await?;

        info!(
            target: "monitor",
            route = %route_id,
            schedule = %monitor.schedule,
            threshold = monitor.threshold_percent,
            "route monitoring configured"
        );
        Ok(monitor)
    }

    /// Look up one route's monitor.
    pub async fn find(&self, route_id: &str) -> Result<Option<RouteMonitor>, StorageError> {
        Ok(self.load_record().await?.routes.get(route_id).cloned())
    }

    /// All monitors, ordered by route id.
    pub async fn list(&self) -> Result<Vec<RouteMonitor>, StorageError> {
        Ok(self.load_record().await?.routes.into_values().collect())
    }

    /// Apply a partial update; `None` when the route is not monitored.
    pub async fn update(
        &self,
        route_id: &str,
        update: MonitorUpdate,
    ) -> Result<Option<RouteMonitor>, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut record = self.load_record().await?;
        let Some(monitor) = record.routes.get_mut(route_id) else {
            return Ok(None);
        };
        if let Some(date_range) = update.date_range {
            monitor.date_range = date_range;
        }
        if let Some(schedule) = update.schedule {
            monitor.schedule = schedule;
        }
        if let Some(timezone) = update.timezone {
            monitor.timezone = timezone;
        }
        if let Some(threshold) = update.threshold_percent {
            monitor.threshold_percent = threshold;
        }
        let updated = monitor.clone();
        self.save_record(&record).await?;
        Ok(Some(updated))
    }

    /// Record the time of a completed price check for a monitored route.
    /// A no-op for routes without a monitor.
    pub async fn mark_checked(
        &self,
        route_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut record = self.load_record().await?;
        if let Some(monitor) = record.routes.get_mut(route_id) {
            monitor.last_checked_at = Some(now);
            self.save_record(&record).await?;
        }
        Ok(())
    }

    /// Remove one route's monitor; returns whether it existed.
    pub async fn remove(&self, route_id: &str) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut record = self.load_record().await?;
        let existed = record.routes.remove(route_id).is_some();
        if existed {
            self.save_record(&record).await?;
            info!(target: "monitor", route = %route_id, "route monitoring removed");
        }
        Ok(existed)
    }

    /// Remove every monitor; returns the route ids that were registered.
    pub async fn clear(&self) -> Result<Vec<String>, StorageError> {
        let _guard = self.write_lock.lock().await;

        let record = self.load_record().await?;
        let route_ids: Vec<String> = record.routes.keys().cloned().collect();
        if !route_ids.is_empty() {
            self.save_record(&MonitorsRecord::default()).await?;
            info!(target: "monitor", routes = route_ids.len(), "all monitoring stopped");
        }
        Ok(route_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_schedule_formats_cron() {
        assert_eq!(daily_schedule(7, 0).as_deref(), Some("0 7 * * *"));
        assert_eq!(daily_schedule(14, 30).as_deref(), Some("30 14 * * *"));
        assert_eq!(daily_schedule(24, 0), None);
        assert_eq!(daily_schedule(7, 60), None);
    }
}
