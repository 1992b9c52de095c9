use crate::models::image::GenerationResult;
use crate::models::request::GenerationRequest;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub params: GenerationRequest,
    /// Data URI or absolute HTTP(S) URL.
    pub image_url: String,
}

impl HistoryItem {
    pub fn new(params: GenerationRequest, result: &GenerationResult) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            params,
            image_url: result.to_string(),
        }
    }

    pub fn image(&self) -> GenerationResult {
        GenerationResult::from_stored(&self.image_url)
    }

    /// The original request, ready to be edited and submitted again.
    pub fn reuse(&self) -> GenerationRequest {
        self.params.clone()
    }
}

// Store operation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertResult {
    pub id: String,
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResult {
    pub id: String,
    pub success: bool,
    pub message: Option<String>,
}
