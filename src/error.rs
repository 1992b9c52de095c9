use thiserror::Error;

/// Maximum number of characters of an upstream error body kept in an error message.
pub const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("API key is not configured")]
    MissingCredential,

    #[error("API key rejected ({status}): {message}")]
    AuthRejected { status: u16, message: String },

    #[error("Endpoint not found: {0}")]
    EndpointNotFound(String),

    #[error("Parameters rejected: {0}")]
    ParameterRejected(String),

    #[error("{}", transport_message(.status, .message))]
    Transport { status: Option<u16>, message: String },

    #[error("No image in response: {0}")]
    NoImage(String),

    #[error("Compat fallback attempt failed: {0}")]
    FallbackExhausted(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Transport error {}: {}", code, message),
        None => format!("Transport error: {}", message),
    }
}

/// Why a single protocol attempt failed. Drives the fallback decision only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureClass {
    AuthRejected,
    EndpointNotFound,
    ParameterRejected,
    Transport,
    NoImage,
}

impl FailureClass {
    /// An invalid key fails identically on the second protocol, so only
    /// auth rejections stop the orchestrator before the fallback.
    pub(crate) fn allows_fallback(self) -> bool {
        !matches!(self, FailureClass::AuthRejected)
    }
}

impl GenError {
    pub(crate) fn classify(&self) -> FailureClass {
        match self {
            GenError::MissingCredential
            | GenError::AuthRejected { .. }
            | GenError::Transport {
                status: Some(401 | 403),
                ..
            } => FailureClass::AuthRejected,
            GenError::EndpointNotFound(_) => FailureClass::EndpointNotFound,
            GenError::ParameterRejected(_) | GenError::InvalidRequest(_) => {
                FailureClass::ParameterRejected
            }
            GenError::NoImage(_) => FailureClass::NoImage,
            _ => FailureClass::Transport,
        }
    }

    /// Builds a transport error from a non-2xx status, keeping a bounded slice of the body.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        GenError::Transport {
            status: Some(status),
            message: truncate_body(body),
        }
    }
}

impl From<reqwest::Error> for GenError {
    fn from(e: reqwest::Error) -> Self {
        GenError::Transport {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for GenError {
    fn from(e: serde_json::Error) -> Self {
        GenError::Serialization(e.to_string())
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

pub type Result<T> = std::result::Result<T, GenError>;
