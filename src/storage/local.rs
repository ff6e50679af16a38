//! Local filesystem snapshot store.
//!
//! Snapshots live in one pretty-printed JSON document so the state can be
//! inspected (and cached between scheduled runs) as a plain file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Snapshot, SnapshotMap};
use crate::storage::SnapshotStore;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalSnapshotStore {
    path: PathBuf,
}

impl LocalSnapshotStore {
    /// Create a store backed by the given JSON file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        let written = Self::write_and_rename(&tmp, &self.path, bytes).await;
        if written.is_err() {
            let _ = tokio::fs::remove_file(&tmp).await;
        }
        written
    }

    async fn write_and_rename(tmp: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
        let mut file = tokio::fs::File::create(tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(tmp, target).await?;
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Parse the document entry by entry so one bad record does not discard
    /// the rest of the history.
    fn parse(bytes: &[u8]) -> Result<SnapshotMap> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_slice(bytes)?;
        let mut snapshots = SnapshotMap::new();

        for (key, value) in raw {
            match serde_json::from_value::<Snapshot>(value) {
                Ok(snapshot) => {
                    snapshots.insert(key, snapshot);
                }
                Err(e) => log::warn!("Dropping malformed snapshot for {}: {}", key, e),
            }
        }
        Ok(snapshots)
    }
}

#[async_trait]
impl SnapshotStore for LocalSnapshotStore {
    async fn load(&self) -> SnapshotMap {
        let bytes = match self.read_bytes().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::info!("No snapshots found at {}, starting fresh", self.location());
                return SnapshotMap::new();
            }
            Err(e) => {
                log::warn!("Error reading snapshots from {}: {}", self.location(), e);
                return SnapshotMap::new();
            }
        };

        match Self::parse(&bytes) {
            Ok(snapshots) => {
                log::info!(
                    "Loaded {} snapshots from {}",
                    snapshots.len(),
                    self.location()
                );
                snapshots
            }
            Err(e) => {
                log::warn!(
                    "Error loading snapshots from {}: {}. History reset.",
                    self.location(),
                    e
                );
                SnapshotMap::new()
            }
        }
    }

    async fn save(&self, snapshots: &SnapshotMap) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshots)?;
        self.write_bytes(&bytes)
            .await
            .map_err(|e| AppError::store_write(self.location(), e))?;
        log::info!("Saved {} snapshots to {}", snapshots.len(), self.location());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
