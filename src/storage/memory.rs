use crate::{
    error::Result,
    models::history::{DeleteResult, HistoryItem, InsertResult},
    storage::traits::HistoryStore,
};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Keeps history for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryHistoryStore {
    items: RwLock<Vec<HistoryItem>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) fn sort_newest_first(items: &mut [HistoryItem]) {
    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

pub(crate) fn upsert(items: &mut Vec<HistoryItem>, item: HistoryItem) {
    items.retain(|existing| existing.id != item.id);
    items.push(item);
    sort_newest_first(items);
}

pub(crate) fn missing(id: &str) -> DeleteResult {
    DeleteResult {
        id: id.to_string(),
        success: false,
        message: Some("No history item with this id".to_string()),
    }
}

pub(crate) fn deleted(id: &str) -> DeleteResult {
    DeleteResult {
        id: id.to_string(),
        success: true,
        message: None,
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn all(&self) -> Result<Vec<HistoryItem>> {
        Ok(self.items.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<HistoryItem>> {
        Ok(self.items.read().await.iter().find(|i| i.id == id).cloned())
    }

    async fn insert(&self, item: HistoryItem) -> Result<InsertResult> {
        let id = item.id.clone();
        upsert(&mut *self.items.write().await, item);
        Ok(InsertResult {
            id,
            success: true,
            message: None,
        })
    }

    async fn delete(&self, id: &str) -> Result<DeleteResult> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| item.id != id);

        if items.len() == before {
            Ok(missing(id))
        } else {
            Ok(deleted(id))
        }
    }

    async fn clear(&self) -> Result<usize> {
        let mut items = self.items.write().await;
        let count = items.len();
        items.clear();
        Ok(count)
    }
}
