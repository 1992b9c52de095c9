pub mod compat;
pub mod endpoint;
pub mod extract;
pub mod native;

use crate::{
    config::GenerationSettings,
    error::{FailureClass, GenError, Result},
    logger,
    models::{GenerationRequest, GenerationResult},
};
use reqwest::Client;
use serde::{Deserialize, Deserializer};

/// Treats an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which protocol the orchestrator is currently trying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AttemptingNative,
    AttemptingCompat,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Phase::AttemptingNative => "native attempt",
            Phase::AttemptingCompat => "compat attempt",
        }
    }

    /// Next phase after a failed attempt, or `None` when the call is over.
    fn after_failure(self, class: FailureClass) -> Option<Phase> {
        match self {
            Phase::AttemptingNative if class.allows_fallback() => Some(Phase::AttemptingCompat),
            _ => None,
        }
    }

    /// Error surfaced to the caller when this phase's failure is terminal.
    fn terminal_error(self, error: GenError) -> GenError {
        match self {
            Phase::AttemptingNative => error,
            Phase::AttemptingCompat => GenError::FallbackExhausted(error.to_string()),
        }
    }
}

/// Entry point for image generation. Holds only a connection pool, so one
/// client can serve any number of concurrent, independent calls.
#[derive(Clone, Default)]
pub struct ImageClient {
    http: Client,
}

impl ImageClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http_client(http: Client) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Generates one image, trying the native protocol first and the
    /// chat-completions protocol once if the native attempt fails recoverably.
    pub async fn generate(
        &self,
        settings: &GenerationSettings,
        request: &GenerationRequest,
    ) -> Result<GenerationResult> {
        let api_key = settings.api_key().ok_or(GenError::MissingCredential)?;
        request.validate()?;

        log::info!(
            "Generating image with model {} ({}, aspect {})",
            request.model,
            request.resolution,
            request.aspect_ratio.explicit().unwrap_or("default")
        );

        let mut phase = Phase::AttemptingNative;
        loop {
            let outcome = {
                let _timer = logger::timer(phase.label());
                match phase {
                    Phase::AttemptingNative => {
                        native::generate(&self.http, settings, api_key, request).await
                    }
                    Phase::AttemptingCompat => {
                        compat::generate(&self.http, settings, api_key, request).await
                    }
                }
            };

            let error = match outcome {
                Ok(image) => {
                    log::info!("✅ Image generated via {}", phase.label());
                    return Ok(image);
                }
                Err(error) => error,
            };

            let class = error.classify();
            match phase.after_failure(class) {
                Some(next) => {
                    log::warn!(
                        "{} failed ({:?}): {}; falling back to chat completions",
                        phase.label(),
                        class,
                        error
                    );
                    phase = next;
                }
                None => {
                    log::error!("{} failed ({:?}): {}", phase.label(), class, error);
                    return Err(phase.terminal_error(error));
                }
            }
        }
    }
}
