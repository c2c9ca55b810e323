use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::info;

/// Global metrics registry used across the tool layer.
pub static METRICS: Lazy<Metrics> = Lazy::new(Metrics::default);

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs()
}

#[derive(Default)]
struct MetricsInner {
    checks_recorded: AtomicU64,
    deals_detected: AtomicU64,
    analyses_run: AtomicU64,
    last_event_ts: AtomicU64,
}

/// Lightweight metrics handle backed by atomics so it can be cloned cheaply.
#[derive(Clone, Default)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

impl Metrics {
    pub fn record_check(&self, route_id: &str) {
        self.inner.checks_recorded.fetch_add(1, Ordering::Relaxed);
        self.inner
            .last_event_ts
            .store(now_unix_secs(), Ordering::Relaxed);

        info!(
            target: "metrics",
            event = "price_check",
            route = %route_id,
            total_checks = self.inner.checks_recorded.load(Ordering::Relaxed),
            "price check recorded"
        );
    }

    pub fn record_deal(&self, route_id: &str, reason: &str) {
        self.inner.deals_detected.fetch_add(1, Ordering::Relaxed);
        self.inner
            .last_event_ts
            .store(now_unix_secs(), Ordering::Relaxed);

        info!(
            target: "metrics",
            event = "deal_detected",
            route = %route_id,
            reason = %reason,
            total_deals = self.inner.deals_detected.load(Ordering::Relaxed),
            "deal detected"
        );
    }

    pub fn record_analysis(&self, route_id: &str) {
        self.inner.analyses_run.fetch_add(1, Ordering::Relaxed);
        self.inner
            .last_event_ts
            .store(now_unix_secs(), Ordering::Relaxed);

        info!(
            target: "metrics",
            event = "best_window_analysis",
            route = %route_id,
            total_analyses = self.inner.analyses_run.load(Ordering::Relaxed),
            "best-window analysis run"
        );
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            checks_recorded: self.inner.checks_recorded.load(Ordering::Relaxed),
            deals_detected: self.inner.deals_detected.load(Ordering::Relaxed),
            analyses_run: self.inner.analyses_run.load(Ordering::Relaxed),
            last_event_ts: self.inner.last_event_ts.load(Ordering::Relaxed),
        }
    }
}

/// Serializable view of current metrics, logged when a run finishes.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub checks_recorded: u64,
    pub deals_detected: u64,
    pub analyses_run: u64,
    pub last_event_ts: u64,
}

pub fn log_metrics_snapshot(snapshot: &MetricsSnapshot) {
    info!(
        target: "metrics",
        event = "metrics_snapshot",
        checks_recorded = snapshot.checks_recorded,
        deals_detected = snapshot.deals_detected,
        analyses_run = snapshot.analyses_run,
        last_event_ts = snapshot.last_event_ts,
        "metrics snapshot"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_events() {
        let metrics = Metrics::default();
        metrics.record_check("WAW-CDG");
        metrics.record_check("JFK-LHR");
        metrics.record_deal("WAW-CDG", "thirty_day_low");
        metrics.record_analysis("WAW-CDG");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.checks_recorded, 2);
        assert_eq!(snapshot.deals_detected, 1);
        assert_eq!(snapshot.analyses_run, 1);
        assert!(snapshot.last_event_ts > 0);
    }
}
