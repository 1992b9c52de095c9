pub mod export;
pub mod file;
pub mod memory;
pub mod traits;

use crate::{
    config::{HistoryBackend, HistoryConfig},
    error::Result,
    models::history::{DeleteResult, HistoryItem, InsertResult},
};
use std::sync::Arc;

pub use export::{export_batch, export_item, ExportResult};
pub use file::FileHistoryStore;
pub use memory::MemoryHistoryStore;
pub use traits::HistoryStore;

/// Front door to whichever history backend the configuration selects.
#[derive(Clone)]
pub struct HistoryManager {
    backend: Arc<dyn HistoryStore>,
}

impl HistoryManager {
    pub async fn new(config: HistoryConfig) -> Result<Self> {
        let backend: Arc<dyn HistoryStore> = match config.backend {
            HistoryBackend::Memory => Arc::new(MemoryHistoryStore::new()),
            HistoryBackend::File => Arc::new(FileHistoryStore::new(config).await?),
        };

        Ok(Self { backend })
    }

    pub fn with_store(backend: Arc<dyn HistoryStore>) -> Self {
        Self { backend }
    }

    pub fn store(&self) -> &Arc<dyn HistoryStore> {
        &self.backend
    }

    pub async fn all(&self) -> Result<Vec<HistoryItem>> {
        self.backend.all().await
    }

    pub async fn get(&self, id: &str) -> Result<Option<HistoryItem>> {
        self.backend.get(id).await
    }

    pub async fn insert(&self, item: HistoryItem) -> Result<InsertResult> {
        self.backend.insert(item).await
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteResult> {
        self.backend.delete(id).await
    }

    pub async fn delete_batch(&self, ids: &[String]) -> Result<Vec<DeleteResult>> {
        self.backend.delete_batch(ids).await
    }

    pub async fn clear(&self) -> Result<usize> {
        self.backend.clear().await
    }

    /// Looks up several ids, skipping unknown ones.
    pub async fn select(&self, ids: &[String]) -> Result<Vec<HistoryItem>> {
        let all = self.backend.all().await?;
        Ok(all
            .into_iter()
            .filter(|item| ids.contains(&item.id))
            .collect())
    }
}
