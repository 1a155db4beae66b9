use crate::models::{seed_catalog, Catalog, MediaRecord};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Whole-document persistence for the catalog. There is no per-record
/// granularity: callers load everything, change one collection and save
/// everything back.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn load(&self) -> Result<Catalog, StoreError>;
    async fn save(&self, catalog: &Catalog) -> Result<(), StoreError>;
}

/// Next free id for a collection: one past the largest id, or 1 when empty.
/// `None` once the largest id is `u64::MAX`.
pub fn next_id<R: MediaRecord>(records: &[R]) -> Option<u64> {
    match records.iter().map(R::id).max() {
        Some(max) => max.checked_add(1),
        None => Some(1),
    }
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the seed catalog if no file exists yet. Returns whether it did.
    pub async fn ensure_seeded(&self) -> Result<bool, StoreError> {
        if tokio::fs::try_exists(&self.path).await? {
            debug!("Catalog file {:?} already present", self.path);
            return Ok(false);
        }
        self.save(&seed_catalog()).await?;
        info!("Catalog file {:?} created with default data", self.path);
        Ok(true)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "catalog.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CatalogStore for JsonFileStore {
    async fn load(&self) -> Result<Catalog, StoreError> {
        let raw = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    async fn save(&self, catalog: &Catalog) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(catalog)?;
        // Rename over the target so a concurrent load never sees a half-written file.
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
