use crate::{
    error::{GenError, Result},
    models::{GenerationResult, HistoryItem},
};
use reqwest::Client;
use std::path::{Path, PathBuf};

/// Outcome of exporting one history item.
#[derive(Debug)]
pub struct ExportResult {
    pub id: String,
    pub path: Option<PathBuf>,
    pub error: Option<String>,
}

fn extension_from_url(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "jpg"
    } else if path.ends_with(".webp") {
        "webp"
    } else if path.ends_with(".gif") {
        "gif"
    } else {
        "png"
    }
}

/// Writes the item's image to `dir/banana-{id}.{ext}`. Inline images are decoded
/// locally; remote ones are downloaded.
pub async fn export_item(http: &Client, item: &HistoryItem, dir: &Path) -> Result<PathBuf> {
    let (bytes, extension) = match item.image() {
        GenerationResult::Inline(uri) => (uri.decode()?, uri.extension()),
        GenerationResult::Url(url) => {
            log::debug!("Downloading {}", url);
            let response = http.get(&url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(GenError::from_status(status.as_u16(), &url));
            }
            (response.bytes().await?.to_vec(), extension_from_url(&url))
        }
    };

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("banana-{}.{}", item.id, extension));
    tokio::fs::write(&path, bytes).await?;

    log::info!("💾 Saved {}", path.display());
    Ok(path)
}

/// Exports items one after another; a failure on one item does not stop the rest.
pub async fn export_batch(http: &Client, items: &[HistoryItem], dir: &Path) -> Vec<ExportResult> {
    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let result = match export_item(http, item, dir).await {
            Ok(path) => ExportResult {
                id: item.id.clone(),
                path: Some(path),
                error: None,
            },
            Err(e) => {
                log::warn!("Failed to export {}: {}", item.id, e);
                ExportResult {
                    id: item.id.clone(),
                    path: None,
                    error: Some(e.to_string()),
                }
            }
        };
        results.push(result);
    }
    results
}
