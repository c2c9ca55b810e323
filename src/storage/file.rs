use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::storage::{KeyValueStore, StorageError};

/// One-JSON-file-per-key store rooted at a data directory.
///
/// Records are written to a sibling temp file and renamed into place, so a
/// reader never observes a partially written record.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub async fn new(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir).await?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_of_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();
        assert!(store.read("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn write_read_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();

        store.write("price-history-WAW-CDG", b"{}").await.unwrap();
        assert_eq!(
            store.read("price-history-WAW-CDG").await.unwrap(),
            Some(b"{}".to_vec())
        );

        store.delete("price-history-WAW-CDG").await.unwrap();
        assert!(store.read("price-history-WAW-CDG").await.unwrap().is_none());
        // Deleting again is fine.
        store.delete("price-history-WAW-CDG").await.unwrap();
    }
}
