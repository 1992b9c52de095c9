use crate::error::{GenError, Result};
use crate::models::request::MAX_REFERENCE_BYTES;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

static DATA_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:(.+);base64,(.+)$").expect("valid data uri pattern"));

/// Mime type assumed for a bare base64 payload with no data-URI header.

/// A `data:<mime>;base64,<payload>` string split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataUri {
    pub mime_type: String,
    pub data: String,
}

impl DataUri {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn parse(uri: &str) -> Option<Self> {
        let captures = DATA_URI.captures(uri)?;
        Some(Self::new(&captures[1], &captures[2]))
    }

    /// Reads an image file and encodes it, guessing the mime type from the extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;

        if bytes.len() > MAX_REFERENCE_BYTES {
            return Err(GenError::InvalidRequest(format!(
                "{} is {} bytes, the limit is {}",
                path.display(),
                bytes.len(),
                MAX_REFERENCE_BYTES
            )));
        }

        let mime_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(mime_for_extension)
            .ok_or_else(|| {
                GenError::InvalidRequest(format!("{} is not a supported image type", path.display()))
            })?;

        Ok(Self::new(mime_type, STANDARD.encode(bytes)))
    }

    /// Decoded payload size, computed from the base64 length without decoding.
    pub fn decoded_len(&self) -> usize {
        let trimmed = self.data.trim_end_matches('=');
        trimmed.len() * 3 / 4
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.data.trim())
            .map_err(|e| GenError::Serialization(format!("Invalid base64 payload: {}", e)))
    }

    /// File extension matching the mime type, `png` when unknown.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.data)
    }
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// The single image a successful generation produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Inline(DataUri),
    Url(String),
}

impl GenerationResult {
    pub fn is_inline(&self) -> bool {
        matches!(self, GenerationResult::Inline(_))
    }

    /// Interprets a stored image string: data URIs become inline results, anything else a URL.
    pub fn from_stored(value: &str) -> Self {
        match DataUri::parse(value) {
            Some(uri) => GenerationResult::Inline(uri),
            None => GenerationResult::Url(value.to_string()),
        }
    }
}

impl fmt::Display for GenerationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationResult::Inline(uri) => uri.fmt(f),
            GenerationResult::Url(url) => f.write_str(url),
        }
    }
}
