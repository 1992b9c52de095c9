//! Image generation client for endpoints that speak either the native
//! `generateContent` protocol or a chat-completions protocol, plus a local
//! history of generated images.

pub mod config;
pub mod error;
pub mod generation;
pub mod logger;
pub mod models;
pub mod storage;
pub mod studio;

pub use config::{Config, GenerationSettings, HistoryBackend, HistoryConfig};
pub use error::{GenError, Result};
pub use generation::ImageClient;
pub use models::*;
pub use storage::{HistoryManager, HistoryStore};
pub use studio::Studio;
