use crate::{
    config::HistoryConfig,
    error::{GenError, Result},
    models::history::{DeleteResult, HistoryItem, InsertResult},
    storage::{
        memory::{deleted, missing, sort_newest_first, upsert},
        traits::HistoryStore,
    },
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// History persisted as a single JSON array. Every write rewrites the file
/// through a temporary sibling and a rename.
pub struct FileHistoryStore {
    path: PathBuf,
    items: Mutex<Vec<HistoryItem>>,
}

impl FileHistoryStore {
    pub async fn new(config: HistoryConfig) -> Result<Self> {
        Self::open(config.path).await
    }

    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut items = load(&path).await?;
        sort_newest_first(&mut items);

        log::debug!("Loaded {} history items from {}", items.len(), path.display());

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, items: &[HistoryItem]) -> Result<()> {
        let json = serde_json::to_vec_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

async fn load(path: &Path) -> Result<Vec<HistoryItem>> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            GenError::Storage(format!("{} is not a valid history file: {}", path.display(), e))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn all(&self) -> Result<Vec<HistoryItem>> {
        Ok(self.items.lock().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<HistoryItem>> {
        Ok(self.items.lock().await.iter().find(|i| i.id == id).cloned())
    }

    async fn insert(&self, item: HistoryItem) -> Result<InsertResult> {
        let id = item.id.clone();
        let mut items = self.items.lock().await;
        let mut next = items.clone();
        upsert(&mut next, item);
        self.persist(&next).await?;
        *items = next;

        Ok(InsertResult {
            id,
            success: true,
            message: None,
        })
    }

    async fn delete(&self, id: &str) -> Result<DeleteResult> {
        let mut items = self.items.lock().await;
        if !items.iter().any(|item| item.id == id) {
            return Ok(missing(id));
        }

        let next: Vec<HistoryItem> = items.iter().filter(|item| item.id != id).cloned().collect();
        self.persist(&next).await?;
        *items = next;
        Ok(deleted(id))
    }

    async fn delete_batch(&self, ids: &[String]) -> Result<Vec<DeleteResult>> {
        let mut items = self.items.lock().await;
        let mut next = items.clone();
        let results: Vec<DeleteResult> = ids
            .iter()
            .map(|id| {
                let before = next.len();
                next.retain(|item| &item.id != id);
                if next.len() == before {
                    missing(id)
                } else {
                    deleted(id)
                }
            })
            .collect();

        if results.iter().any(|r| r.success) {
            self.persist(&next).await?;
            *items = next;
        }
        Ok(results)
    }

    async fn clear(&self) -> Result<usize> {
        let mut items = self.items.lock().await;
        let count = items.len();
        self.persist(&[]).await?;
        items.clear();
        Ok(count)
    }
}
