//! Report runtime configuration.
//!
//! Configuration is resolved once at process startup (defaults, then an optional YAML file, then
//! environment variables) and passed into [`crate::ReportGenerator`]. Report generation never
//! reads process-wide environment variables itself, which keeps runs reproducible in tests.

use crate::constants::{
    DEFAULT_ADMIN_PANEL_SUFFIX, DEFAULT_ASSIGNEE, ENV_ADMIN_PANEL_SUFFIX, ENV_AI_PROVIDER,
    ENV_ASSIGNEE, ENV_GENERATION_TIMEOUT_SECS, ENV_HUGGINGFACE_TOKEN, ENV_OPENAI_KEY,
    ENV_REGISTRY_TIMEOUT_SECS, ENV_REGISTRY_URL, GENERATION_TIMEOUT_SECS, REGISTRY_BACKOFF_SECS,
    REGISTRY_MAX_ATTEMPTS, REGISTRY_TIMEOUT_SECS,
};
use crate::{ReportError, ReportResult};
use docfill_generation::{ProviderKind, ProviderSettings};
use docfill_registry::{RetryPolicy, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Written into `[RESPONSAVEL]` unless a request names someone else.
    pub assignee: String,
    pub admin_panel_suffix: String,
    pub registry: RegistryConfig,
    pub generation: GenerationConfig,
    #[serde(skip)]
    pub credentials: Credentials,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub provider: ProviderKind,
    pub timeout_secs: u64,
    pub huggingface_model: String,
    pub openai_model: String,
}

/// Provider credentials. Only ever taken from the environment.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub huggingface_token: Option<String>,
    pub openai_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("huggingface_token", &redact(&self.huggingface_token))
            .field("openai_key", &redact(&self.openai_key))
            .finish()
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            assignee: DEFAULT_ASSIGNEE.to_string(),
            admin_panel_suffix: DEFAULT_ADMIN_PANEL_SUFFIX.to_string(),
            registry: RegistryConfig::default(),
            generation: GenerationConfig::default(),
            credentials: Credentials::default(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: REGISTRY_TIMEOUT_SECS,
            max_attempts: REGISTRY_MAX_ATTEMPTS,
            backoff_secs: REGISTRY_BACKOFF_SECS,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let settings = ProviderSettings::default();
        Self {
            provider: ProviderKind::default(),
            timeout_secs: GENERATION_TIMEOUT_SECS,
            huggingface_model: settings.huggingface_model,
            openai_model: settings.openai_model,
        }
    }
}

impl ReportConfig {
    /// Defaults, overlaid with the YAML file at `path` when one is given.
    pub fn load(path: Option<&Path>) -> ReportResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path).map_err(|e| ReportError::ConfigRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = Self::from_yaml_str(&contents)?;
        tracing::info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml_str(contents: &str) -> ReportResult<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(ReportError::ConfigDeserialization)
    }

    /// Applies environment overrides and credentials.
    ///
    /// `var` is the variable lookup, normally `|name| std::env::var(name).ok()`. Blank values are
    /// treated as unset.
    pub fn apply_env<F>(&mut self, var: F) -> ReportResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            var(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = get(ENV_ASSIGNEE) {
            self.assignee = value;
        }
        if let Some(value) = get(ENV_ADMIN_PANEL_SUFFIX) {
            self.admin_panel_suffix = value;
        }
        if let Some(value) = get(ENV_REGISTRY_URL) {
            self.registry.base_url = value;
        }
        if let Some(value) = get(ENV_REGISTRY_TIMEOUT_SECS) {
            self.registry.timeout_secs = parse_secs(ENV_REGISTRY_TIMEOUT_SECS, &value)?;
        }
        if let Some(value) = get(ENV_GENERATION_TIMEOUT_SECS) {
            self.generation.timeout_secs = parse_secs(ENV_GENERATION_TIMEOUT_SECS, &value)?;
        }
        if let Some(value) = get(ENV_AI_PROVIDER) {
            self.generation.provider = value
                .parse::<ProviderKind>()
                .map_err(ReportError::InvalidInput)?;
        }

        self.credentials = Credentials {
            huggingface_token: get(ENV_HUGGINGFACE_TOKEN),
            openai_key: get(ENV_OPENAI_KEY),
        };
        Ok(())
    }

    pub fn validate(&self) -> ReportResult<()> {
        if self.admin_panel_suffix.trim().is_empty() {
            return Err(ReportError::InvalidInput(
                "admin_panel_suffix cannot be empty".into(),
            ));
        }
        if self.registry.base_url.trim().is_empty() {
            return Err(ReportError::InvalidInput(
                "registry.base_url cannot be empty".into(),
            ));
        }
        if self.registry.max_attempts == 0 {
            return Err(ReportError::InvalidInput(
                "registry.max_attempts must be at least 1".into(),
            ));
        }
        if self.registry.timeout_secs == 0 || self.generation.timeout_secs == 0 {
            return Err(ReportError::InvalidInput(
                "timeouts must be at least one second".into(),
            ));
        }
        Ok(())
    }

    pub fn registry_timeout(&self) -> Duration {
        Duration::from_secs(self.registry.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.registry.max_attempts,
            backoff: Duration::from_secs(self.registry.backoff_secs),
        }
    }

    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            timeout: Duration::from_secs(self.generation.timeout_secs),
            huggingface_model: self.generation.huggingface_model.clone(),
            huggingface_token: self.credentials.huggingface_token.clone(),
            openai_model: self.generation.openai_model.clone(),
            openai_key: self.credentials.openai_key.clone(),
        }
    }
}

fn parse_secs(name: &str, value: &str) -> ReportResult<u64> {
    value
        .parse::<u64>()
        .map_err(|_| ReportError::InvalidInput(format!("{name} must be a whole number of seconds")))
}
