//! # Pathway Models
//!
//! Centralized model-backend configuration for the gateway.
//! One [`ModelConfig`] per backend in the stack; the stack order is the
//! fallback order.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::BackendError;
use crate::gateway::backends::{GeminiBackend, ModelBackend, OpenAiBackend};

/// Supported model providers
///
/// - Gemini (Google) - `GEMINI_API_KEY`
/// - OpenAI or any OpenAI-compatible endpoint - `OPENAI_API_KEY`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
}

impl LlmProvider {
    /// Get all available providers
    pub fn all() -> Vec<LlmProvider> {
        vec![LlmProvider::Gemini, LlmProvider::OpenAI]
    }

    /// Parse a provider name as found in configuration
    pub fn parse(name: &str) -> Option<LlmProvider> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Some(LlmProvider::Gemini),
            "openai" => Some(LlmProvider::OpenAI),
            _ => None,
        }
    }

    /// Display name for logs
    pub fn display_name(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "Gemini",
            LlmProvider::OpenAI => "OpenAI",
        }
    }

    /// Whether this provider supports custom base URL
    pub fn supports_base_url(&self) -> bool {
        matches!(self, LlmProvider::OpenAI)
    }

    /// Environment variable holding the credential
    pub fn api_key_env(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "GEMINI_API_KEY",
            LlmProvider::OpenAI => "OPENAI_API_KEY",
        }
    }

    /// Default primary and secondary model ids
    pub fn default_models(&self) -> (&'static str, &'static str) {
        match self {
            LlmProvider::Gemini => ("gemini-3-pro-preview", "gemini-3-flash-preview"),
            LlmProvider::OpenAI => ("gpt-4o", "gpt-4o-mini"),
        }
    }
}

/// Configuration of one backend in the stack
///
/// ## Example
/// ```rust,ignore
/// use pathway_core::models::{ModelConfig, LlmProvider};
///
/// let primary = ModelConfig::new("gemini-3-pro-preview");
/// let local = ModelConfig::with_provider(LlmProvider::OpenAI, "llama3")
///     .with_base_url("http://localhost:11434/v1");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Provider to use
    #[serde(default)]
    pub provider: LlmProvider,
    /// Model name (e.g., "gemini-3-pro-preview", "gpt-4o")
    pub model: String,
    /// Optional base URL override for OpenAI-compatible APIs
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(LlmProvider::Gemini.default_models().0)
    }
}

impl ModelConfig {
    /// Create a new model config with the default provider (Gemini)
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            provider: LlmProvider::Gemini,
            model: model.into(),
            base_url: None,
        }
    }

    /// Create config for a specific provider
    pub fn with_provider(provider: LlmProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            base_url: None,
        }
    }

    /// Set base URL (for OpenAI-compatible endpoints)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Label used in attempt logs
    pub fn label(&self) -> String {
        format!("{}:{}", self.provider.display_name().to_lowercase(), self.model)
    }

    /// Create a backend client for this config.
    ///
    /// Reads the provider's credential from the environment.
    pub fn create_backend(
        &self,
        generation: &GenerationConfig,
    ) -> Result<Arc<dyn ModelBackend>, BackendError> {
        let key_env = self.provider.api_key_env();
        let api_key = std::env::var(key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| BackendError::MissingCredential(key_env.to_string()))?;

        match self.provider {
            LlmProvider::Gemini => Ok(Arc::new(GeminiBackend::new(
                &self.model,
                api_key,
                generation.clone(),
            ))),
            LlmProvider::OpenAI => {
                let mut backend = OpenAiBackend::new(&self.model, api_key, generation.clone());
                if let Some(base_url) = &self.base_url {
                    backend = backend.with_base_url(base_url);
                }
                Ok(Arc::new(backend))
            }
        }
    }
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
        }
    }
}

/// Configuration of the model gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayConfig {
    /// Ordered backend stack, primary first
    pub backends: Vec<ModelConfig>,
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Upper bound of a single backend attempt
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
}

fn default_attempt_timeout_ms() -> u64 {
    60_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let (primary, secondary) = LlmProvider::Gemini.default_models();
        Self {
            backends: vec![ModelConfig::new(primary), ModelConfig::new(secondary)],
            generation: GenerationConfig::default(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
        }
    }
}

impl GatewayConfig {
    /// A config with no backends: every call resolves to its default value.
    pub fn offline() -> Self {
        Self {
            backends: Vec::new(),
            ..Self::default()
        }
    }

    /// Build the config from the process environment.
    ///
    /// - `PATHWAY_PROVIDER` - `gemini` (default) or `openai`
    /// - `PATHWAY_PRIMARY_MODEL` / `PATHWAY_SECONDARY_MODEL` - model ids
    /// - `OPENAI_BASE_URL` - endpoint override for the OpenAI provider
    /// - `PATHWAY_ATTEMPT_TIMEOUT_MS` - per-attempt timeout
    ///
    /// Without the provider credential the stack is empty.
    pub fn from_env() -> Self {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let provider = env("PATHWAY_PROVIDER")
            .and_then(|p| LlmProvider::parse(&p))
            .unwrap_or_default();

        if env(provider.api_key_env()).is_none() {
            tracing::warn!(
                provider = provider.display_name(),
                key = provider.api_key_env(),
                "No API key configured; agents will use static defaults"
            );
            return Self::offline();
        }

        let (default_primary, default_secondary) = provider.default_models();
        let base_url = if provider.supports_base_url() {
            env("OPENAI_BASE_URL")
        } else {
            None
        };

        let backends = [
            env("PATHWAY_PRIMARY_MODEL").unwrap_or_else(|| default_primary.to_string()),
            env("PATHWAY_SECONDARY_MODEL").unwrap_or_else(|| default_secondary.to_string()),
        ]
        .into_iter()
        .map(|model| ModelConfig {
            provider,
            model,
            base_url: base_url.clone(),
        })
        .collect();

        Self {
            backends,
            generation: GenerationConfig::default(),
            attempt_timeout_ms: env("PATHWAY_ATTEMPT_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_attempt_timeout_ms),
        }
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}
