use crate::error::{GenError, Result};
use crate::models::image::DataUri;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest prompt accepted, in characters.
pub const MAX_PROMPT_CHARS: usize = 2000;

/// Largest reference image accepted, in decoded bytes.
pub const MAX_REFERENCE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "")]
    Default,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Default => "",
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
        }
    }

    /// `None` for the provider default, so callers can omit the field.
    pub fn explicit(&self) -> Option<&'static str> {
        match self {
            AspectRatio::Default => None,
            other => Some(other.as_str()),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "default" => Ok(AspectRatio::Default),
            "1:1" => Ok(AspectRatio::Square),
            "3:4" => Ok(AspectRatio::Portrait3x4),
            "4:3" => Ok(AspectRatio::Landscape4x3),
            "9:16" => Ok(AspectRatio::Portrait9x16),
            "16:9" => Ok(AspectRatio::Landscape16x9),
            other => Err(GenError::InvalidRequest(format!(
                "Unsupported aspect ratio: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    #[serde(rename = "1K")]
    Res1K,
    #[serde(rename = "2K")]
    Res2K,
    #[serde(rename = "4K")]
    Res4K,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Res1K => "1K",
            Resolution::Res2K => "2K",
            Resolution::Res4K => "4K",
        }
    }

    /// Pixel dimensions spelled out for prompt-only protocols.
    pub fn dimensions(&self) -> &'static str {
        match self {
            Resolution::Res1K => "1024x1024",
            Resolution::Res2K => "2048x2048",
            Resolution::Res4K => "3840x2160",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1K" => Ok(Resolution::Res1K),
            "2K" => Ok(Resolution::Res2K),
            "4K" => Ok(Resolution::Res4K),
            other => Err(GenError::InvalidRequest(format!(
                "Unsupported resolution: {}",
                other
            ))),
        }
    }
}

/// The two model slots a user configures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Nano,
    Pro,
}

impl FromStr for ModelTier {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nano" => Ok(ModelTier::Nano),
            "pro" => Ok(ModelTier::Pro),
            other => Err(GenError::InvalidRequest(format!("Unknown model tier: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub resolution: Resolution,
    /// Reference image as a `data:<mime>;base64,<payload>` URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            aspect_ratio: AspectRatio::Default,
            resolution: Resolution::Res1K,
            reference_image: None,
        }
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_reference_image(mut self, data_uri: impl Into<String>) -> Self {
        self.reference_image = Some(data_uri.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(GenError::InvalidRequest("Prompt must not be empty".into()));
        }

        let chars = self.prompt.chars().count();
        if chars > MAX_PROMPT_CHARS {
            return Err(GenError::InvalidRequest(format!(
                "Prompt is {} characters, the limit is {}",
                chars, MAX_PROMPT_CHARS
            )));
        }

        if self.model.trim().is_empty() {
            return Err(GenError::InvalidRequest("Model id must not be empty".into()));
        }

        if let Some(reference) = &self.reference_image {
            let size = DataUri::parse(reference)
                .ok_or_else(|| {
                    GenError::InvalidRequest(
                        "Reference image must be a data:<mime>;base64,<payload> URI".into(),
                    )
                })?
                .decoded_len();
            if size > MAX_REFERENCE_BYTES {
                return Err(GenError::InvalidRequest(format!(
                    "Reference image is {} bytes, the limit is {}",
                    size, MAX_REFERENCE_BYTES
                )));
            }
        }

        Ok(())
    }
}
