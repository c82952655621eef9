// src/storage/json_store.rs
use crate::storage::{AccountRecord, AccountStore, StorageError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// All accounts in one pretty-printed JSON array on disk.
///
/// Lookups scan the array linearly. Writes go to a sibling `.tmp` file that is
/// then renamed over the store, so a crash never leaves a half-written file.
pub struct JsonAccountStore {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonAccountStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<AccountRecord>, StorageError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data).map_err(|source| StorageError::Serde {
            path: self.path.clone(),
            source,
        })
    }

    async fn write_all(&self, records: &[AccountRecord]) -> Result<(), StorageError> {
        let io_err = |source: std::io::Error| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let data = serde_json::to_string_pretty(records).map_err(|source| StorageError::Serde {
            path: self.path.clone(),
            source,
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, data).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for JsonAccountStore {
    async fn find(&self, user_id: &str) -> Result<Option<AccountRecord>, StorageError> {
        let records = self.read_all().await?;
        Ok(records.into_iter().find(|r| r.user_id == user_id))
    }

    async fn save(&self, record: &AccountRecord) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all().await?;

        match records.iter_mut().find(|r| r.user_id == record.user_id) {
            Some(existing) if existing == record => {
                debug!("Account {} unchanged, skipping write", record.user_id);
                return Ok(());
            }
            Some(existing) => *existing = record.clone(),
            None => {
                info!("Adding account {} to {}", record.user_id, self.path.display());
                records.push(record.clone());
            }
        }

        self.write_all(&records).await
    }
}
