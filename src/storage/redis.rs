use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::storage::{KeyValueStore, StorageError};

/// Keyed store backed by Redis through a shared connection manager.
///
/// The manager reconnects transparently; cloning it per operation is the
/// intended cheap way to get a usable handle without holding a lock.
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn new(url: &str) -> Result<Self, StorageError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    fn key(key: &str) -> String {
        format!("farewatch:{key}")
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(Self::key(key)).await?;
        Ok(value)
    }

    async fn write(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(Self::key(key), value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(Self::key(key)).await?;
        Ok(())
    }
}
