use crate::{
    config::Config,
    error::Result,
    generation::ImageClient,
    models::{GenerationRequest, HistoryItem},
    storage::{export_batch, ExportResult, HistoryManager},
};
use std::path::Path;

/// Generation client paired with a history store.
#[derive(Clone)]
pub struct Studio {
    config: Config,
    images: ImageClient,
    history: HistoryManager,
}

impl Studio {
    pub async fn new(config: Config) -> Result<Self> {
        let history = HistoryManager::new(config.history.clone()).await?;
        Ok(Self::with_parts(config, ImageClient::new(), history))
    }

    pub fn with_parts(config: Config, images: ImageClient, history: HistoryManager) -> Self {
        Self {
            config,
            images,
            history,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn images(&self) -> &ImageClient {
        &self.images
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Generates an image and records it. Nothing is stored when generation fails.
    pub async fn generate_and_store(&self, request: GenerationRequest) -> Result<HistoryItem> {
        let result = self
            .images
            .generate(&self.config.generation, &request)
            .await?;

        let item = HistoryItem::new(request, &result);
        self.history.insert(item.clone()).await?;
        log::info!("📝 Stored history item {}", item.id);

        Ok(item)
    }

    pub async fn export(&self, ids: &[String], dir: &Path) -> Result<Vec<ExportResult>> {
        let items = self.history.select(ids).await?;
        Ok(export_batch(self.images.http(), &items, dir).await)
    }
}
