use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Redis,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Data directory for the file backend.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Connection URL for the redis backend.
    #[serde(default)]
    pub redis_url: Option<String>,
}

/// Defaults applied to a route monitor when setup does not override them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonitorDefaults {
    #[serde(default = "default_schedule")]
    pub schedule: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Percent drop from the 7-day average that triggers a deal alert.
    #[serde(default = "default_threshold")]
    pub price_drop_threshold_pct: i64,
}

fn default_schedule() -> String {
    "0 7 * * *".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_threshold() -> i64 {
    15
}

impl Default for MonitorDefaults {
    fn default() -> Self {
        Self {
            schedule: default_schedule(),
            timezone: default_timezone(),
            price_drop_threshold_pct: default_threshold(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    #[serde(default)]
    pub defaults: MonitorDefaults,
}

impl AppConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {path}"))?;
        let cfg: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to deserialize TOML config at {path}"))?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [storage]
            backend = "file"
            data_dir = "/tmp/farewatch"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.defaults.price_drop_threshold_pct, 15);
        assert_eq!(cfg.defaults.schedule, "0 7 * * *");
        assert_eq!(cfg.storage.backend, StorageBackend::File);
    }
}
