//! `EmbeddingDispatcher` — stateless, safe to invoke concurrently. Picks a
//! provider from configuration, truncates input, delegates to the
//! provider-specific HTTP (or subprocess) call, then enforces the
//! configured dimension.

use async_trait::async_trait;
use shadowdb_core::config::EmbeddingConfig;
use shadowdb_core::constants::EMBEDDING_INPUT_TRUNCATE_CHARS;
use shadowdb_core::errors::EmbeddingError;
use shadowdb_core::traits::EmbeddingProvider;

use crate::providers;

/// The six supported providers, after name normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    OpenAi,
    OpenAiCompatible,
    Voyage,
    Gemini,
    Command,
}

impl Provider {
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Ollama => "nomic-embed-text",
            Provider::OpenAi | Provider::OpenAiCompatible => "text-embedding-3-small",
            Provider::Voyage => "voyage-3-lite",
            Provider::Gemini => "text-embedding-004",
            Provider::Command => "external-command",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::OpenAi => "openai",
            Provider::OpenAiCompatible => "openai-compatible",
            Provider::Voyage => "voyage",
            Provider::Gemini => "gemini",
            Provider::Command => "command",
        }
    }

    fn requires_api_key(self) -> bool {
        matches!(
            self,
            Provider::OpenAi | Provider::OpenAiCompatible | Provider::Voyage | Provider::Gemini
        )
    }
}

/// Normalize a configured provider name to one of the six canonical
/// providers. Case-insensitive. Unrecognized names fall back to `ollama`
/// (the safe default) rather than erroring.
pub fn normalize_provider_name(raw: &str) -> Provider {
    match raw.to_lowercase().as_str() {
        "openai" => Provider::OpenAi,
        "openai_compatible" | "openai-compatible" | "openai-compatible-api" => {
            Provider::OpenAiCompatible
        }
        "voyage" => Provider::Voyage,
        "gemini" | "google" => Provider::Gemini,
        "command" | "external" | "custom" => Provider::Command,
        "ollama" => Provider::Ollama,
        _ => Provider::Ollama,
    }
}

pub struct EmbeddingDispatcher {
    provider: Provider,
    model: String,
    config: EmbeddingConfig,
    http: reqwest::Client,
}

impl EmbeddingDispatcher {
    pub fn new(config: EmbeddingConfig) -> Self {
        let provider = normalize_provider_name(&config.provider);
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string());
        let http = reqwest::Client::builder()
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            provider,
            model,
            config,
            http,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    fn label(&self) -> String {
        format!("{}:{}", self.provider.name(), self.model)
    }

    fn truncate_input(text: &str) -> &str {
        match text.char_indices().nth(EMBEDDING_INPUT_TRUNCATE_CHARS) {
            Some((byte_idx, _)) => &text[..byte_idx],
            None => text,
        }
    }

    fn validate_dimensions(&self, vector: &[f32]) -> Result<(), EmbeddingError> {
        let expected = self.config.dimensions;
        if expected > 0 && vector.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                observed: vector.len(),
                label: self.label(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingDispatcher {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let truncated = Self::truncate_input(text);

        if self.provider.requires_api_key() && self.config.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(EmbeddingError::ProviderAuth {
                provider: self.provider.name().to_string(),
            });
        }

        let vector = match self.provider {
            Provider::Ollama => {
                providers::ollama::embed(&self.http, &self.config, &self.model, truncated).await?
            }
            Provider::OpenAi | Provider::OpenAiCompatible => {
                providers::openai::embed(
                    &self.http,
                    &self.config,
                    &self.model,
                    truncated,
                    self.provider == Provider::OpenAiCompatible,
                )
                .await?
            }
            Provider::Voyage => {
                providers::voyage::embed(&self.http, &self.config, &self.model, truncated).await?
            }
            Provider::Gemini => {
                providers::gemini::embed(&self.http, &self.config, &self.model, truncated).await?
            }
            Provider::Command => {
                providers::command::embed(&self.config, &self.model, truncated).await?
            }
        };

        self.validate_dimensions(&vector)?;
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn label(&self) -> String {
        self.label()
    }
}
