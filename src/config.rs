use crate::error::{GenError, Result};
use crate::models::ModelTier;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_NANO_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_PRO_MODEL: &str = "gemini-3-pro-image-preview";
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_HISTORY_PATH: &str = "bananagen-history.json";

/// Everything one generation call needs to reach the provider. Passed explicitly
/// to every call; nothing is read from global state during generation.
#[derive(Clone)]
pub struct GenerationSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model_nano_id: String,
    pub model_pro_id: String,
    /// Deadline applied to each protocol attempt separately.
    pub attempt_timeout: Duration,
}

// Hand-written so the key never ends up in logs.
impl fmt::Debug for GenerationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("model_nano_id", &self.model_nano_id)
            .field("model_pro_id", &self.model_pro_id)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        GenerationSettings {
            api_key: None,
            base_url: None,
            model_nano_id: DEFAULT_NANO_MODEL.to_string(),
            model_pro_id: DEFAULT_PRO_MODEL.to_string(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

impl GenerationSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = non_empty_var("BANANA_API_KEY");
        let base_url = non_empty_var("BANANA_BASE_URL");
        let model_nano_id = non_empty_var("BANANA_MODEL_NANO").unwrap_or(defaults.model_nano_id);
        let model_pro_id = non_empty_var("BANANA_MODEL_PRO").unwrap_or(defaults.model_pro_id);
        let attempt_timeout = match non_empty_var("BANANA_TIMEOUT_SECS").map(|s| parse_timeout(&s)) {
            Some(Ok(timeout)) => timeout,
            Some(Err(e)) => {
                log::warn!("⚠️  {}, using {}s", e, defaults.attempt_timeout.as_secs());
                defaults.attempt_timeout
            }
            None => defaults.attempt_timeout,
        };

        GenerationSettings {
            api_key,
            base_url,
            model_nano_id,
            model_pro_id,
            attempt_timeout,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_models(mut self, nano: impl Into<String>, pro: impl Into<String>) -> Self {
        self.model_nano_id = nano.into();
        self.model_pro_id = pro.into();
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// The configured key, or `None` when it is missing or blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Raw base URL as typed by the user; empty means provider defaults.
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().map(str::trim).unwrap_or("")
    }

    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Nano => &self.model_nano_id,
            ModelTier::Pro => &self.model_pro_id,
        }
    }

    /// Maps a stored model id back to the tier it was chosen from.
    pub fn tier_of(&self, model: &str) -> ModelTier {
        if model == self.model_pro_id {
            ModelTier::Pro
        } else {
            ModelTier::Nano
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryBackend {
    Memory,
    File,
}

#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub backend: HistoryBackend,
    pub path: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            backend: HistoryBackend::File,
            path: PathBuf::from(DEFAULT_HISTORY_PATH),
        }
    }
}

impl HistoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_memory() -> Self {
        HistoryConfig {
            backend: HistoryBackend::Memory,
            ..Default::default()
        }
    }

    pub fn from_env() -> Self {
        let backend = match non_empty_var("BANANA_HISTORY_BACKEND").as_deref() {
            Some("memory") => HistoryBackend::Memory,
            _ => HistoryBackend::File,
        };
        let path = non_empty_var("BANANA_HISTORY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_PATH));

        HistoryConfig { backend, path }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.backend = HistoryBackend::File;
        self.path = path.into();
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub generation: GenerationSettings,
    pub history: HistoryConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            generation: GenerationSettings::from_env(),
            history: HistoryConfig::from_env(),
        }
    }

    pub fn with_generation(mut self, settings: GenerationSettings) -> Self {
        self.generation = settings;
        self
    }

    pub fn with_history(mut self, history: HistoryConfig) -> Self {
        self.history = history;
        self
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parses a per-attempt timeout in whole seconds. Zero is rejected.
pub fn parse_timeout(raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(GenError::Config(
            "BANANA_TIMEOUT_SECS must be at least 1".into(),
        )),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(GenError::Config(format!(
            "BANANA_TIMEOUT_SECS is not a number of seconds: {:?}",
            raw
        ))),
    }
}
