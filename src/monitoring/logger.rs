use serde::Serialize;
use tracing::info;

use crate::types::{AppConfig, StorageBackend};

#[derive(Serialize)]
struct StartupLog<'a> {
    event: &'a str,
    storage_backend: &'a str,
    default_schedule: &'a str,
    default_threshold_pct: i64,
}

pub fn log_startup(cfg: &AppConfig) {
    let backend = match cfg.storage.backend {
        StorageBackend::File => "file",
        StorageBackend::Redis => "redis",
    };
    let payload = StartupLog {
        event: "startup",
        storage_backend: backend,
        default_schedule: &cfg.defaults.schedule,
        default_threshold_pct: cfg.defaults.price_drop_threshold_pct,
    };
    info!(target: "farewatch", startup = serde_json::to_string(&payload).unwrap_or_default().as_str());
}
