use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use thiserror::Error;

use crate::types::{StorageBackend, StorageConfig};

pub mod file;
pub mod history;
pub mod redis;

pub use self::file::FileStore;
pub use self::history::{HistoryError, HistoryStore};
pub use self::redis::RedisStore;

/// Failure of the persistence collaborator. Absence of a key is not a
/// failure and is modeled as `Ok(None)` on [`KeyValueStore::read`].
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt record: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

/// Durable keyed storage the tracker persists route records into.
///
/// Writes must replace the previous value atomically so a failed write
/// never leaves a corrupted partial record behind.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` for a key that has never been written.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    async fn write(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Idempotent: deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Construct the configured storage backend.
///
/// Backend setup runs eagerly so misconfiguration (unwritable data dir,
/// unreachable Redis) is surfaced at startup rather than on first use.
pub async fn create_store(cfg: &StorageConfig) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    match cfg.backend {
        StorageBackend::File => {
            let dir = cfg
                .data_dir
                .clone()
                .context("storage.data_dir is required for the file backend")?;
            let store = FileStore::new(&dir)
                .await
                .with_context(|| format!("failed to open data dir {}", dir.display()))?;
            Ok(Arc::new(store))
        }
        StorageBackend::Redis => {
            let url = cfg
                .redis_url
                .as_deref()
                .context("storage.redis_url is required for the redis backend")?;
            let store = RedisStore::new(url)
                .await
                .context("failed to connect to redis")?;
            Ok(Arc::new(store))
        }
    }
}
