use crate::{
    error::Result,
    models::history::{DeleteResult, HistoryItem, InsertResult},
};
use async_trait::async_trait;

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// All records, newest first.
    async fn all(&self) -> Result<Vec<HistoryItem>>;
    async fn get(&self, id: &str) -> Result<Option<HistoryItem>>;
    async fn insert(&self, item: HistoryItem) -> Result<InsertResult>;

    async fn delete(&self, id: &str) -> Result<DeleteResult>;

    async fn delete_batch(&self, ids: &[String]) -> Result<Vec<DeleteResult>> {
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            results.push(self.delete(id).await?);
        }
        Ok(results)
    }

    /// Removes every record, returning how many were removed.
    async fn clear(&self) -> Result<usize>;
}
