//! # Objective text generation
//!
//! Providers that write the short "company objective" paragraph of a report. Every provider
//! implements [`ObjectiveGenerator`]; the concrete one is chosen with a [`ProviderKind`].
//!
//! Remote providers can fail for many reasons (missing credentials, HTTP errors, unexpected
//! payloads). Callers are expected to fall back to [`MockProvider`], which never fails.

mod huggingface;
mod mock;
mod openai;

pub use huggingface::HuggingFaceProvider;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;

use docfill_types::FieldMapping;
use std::time::Duration;

/// Errors returned by text-generation providers.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("missing credentials: set {0}")]
    MissingCredentials(&'static str),

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("provider request failed: {0}")]
    Transport(String),

    #[error("provider answered with HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

/// Capability to write the objective text from source facts and the report fields.
pub trait ObjectiveGenerator {
    fn generate(&self, source_text: &str, context: &FieldMapping)
        -> Result<String, GenerationError>;
}

/// Which provider to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Mock,
    #[serde(alias = "hf")]
    HuggingFace,
    #[serde(alias = "gpt")]
    OpenAi,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(ProviderKind::Mock),
            "hf" | "huggingface" => Ok(ProviderKind::HuggingFace),
            "openai" | "gpt" => Ok(ProviderKind::OpenAi),
            other => Err(format!("unknown AI provider: {}", other)),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ProviderKind::Mock => "mock",
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::OpenAi => "openai",
        })
    }
}

/// Everything needed to construct a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub timeout: Duration,
    pub huggingface_model: String,
    pub huggingface_token: Option<String>,
    pub openai_model: String,
    pub openai_key: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            huggingface_model: huggingface::DEFAULT_MODEL.to_string(),
            huggingface_token: None,
            openai_model: openai::DEFAULT_MODEL.to_string(),
            openai_key: None,
        }
    }
}

/// Builds the provider selected by `kind`.
pub fn build_generator(
    kind: ProviderKind,
    settings: &ProviderSettings,
) -> Result<Box<dyn ObjectiveGenerator>, GenerationError> {
    Ok(match kind {
        ProviderKind::Mock => Box::new(MockProvider),
        ProviderKind::HuggingFace => Box::new(HuggingFaceProvider::new(
            settings.huggingface_token.clone(),
            settings.huggingface_model.clone(),
            settings.timeout,
        )?),
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(
            settings.openai_key.clone(),
            settings.openai_model.clone(),
            settings.timeout,
        )?),
    })
}

fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client, GenerationError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GenerationError::Client(e.to_string()))
}
