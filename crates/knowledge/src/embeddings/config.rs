//! Embedding provider settings.

use notes_core::AppConfig;
use std::time::Duration;

/// Vector width of the offline mock provider.
pub const MOCK_DIMENSIONS: usize = 384;

/// Resolved settings for constructing an embedding provider.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "gemini", "ollama", "mock"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Custom API base URL
    pub endpoint: Option<String>,

    /// API key for hosted providers
    pub api_key: Option<String>,

    /// Vector width for the mock provider; remote providers report their own
    pub dimensions: usize,

    /// Maximum number of texts per embedding call
    pub batch_size: usize,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            model: "trigram-v1".to_string(),
            endpoint: None,
            api_key: None,
            dimensions: MOCK_DIMENSIONS,
            batch_size: 32,
            timeout: Duration::from_secs(60),
        }
    }
}

impl EmbeddingConfig {
    /// Embedding settings from the application config.
    ///
    /// The embedding endpoint falls back to the generative endpoint when both
    /// providers are the same service.
    pub fn from_app_config(config: &AppConfig) -> Self {
        let endpoint = config.embedding_endpoint.clone().or_else(|| {
            (config.embedding_provider == config.provider)
                .then(|| config.endpoint.clone())
                .flatten()
        });

        Self {
            provider: config.embedding_provider.clone(),
            model: config.embedding_model.clone(),
            endpoint,
            api_key: config.api_key.clone(),
            dimensions: MOCK_DIMENSIONS,
            batch_size: config.embed_batch_size.max(1),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_app_config() {
        let config = AppConfig {
            embedding_provider: "ollama".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            provider: "ollama".to_string(),
            endpoint: Some("http://gpu-box:11434".to_string()),
            embed_batch_size: 8,
            request_timeout_secs: 10,
            ..AppConfig::default()
        };

        let embedding = EmbeddingConfig::from_app_config(&config);
        assert_eq!(embedding.provider, "ollama");
        assert_eq!(embedding.model, "nomic-embed-text");
        assert_eq!(embedding.endpoint.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(embedding.batch_size, 8);
        assert_eq!(embedding.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_endpoint_not_shared_across_providers() {
        let config = AppConfig {
            embedding_provider: "gemini".to_string(),
            provider: "ollama".to_string(),
            endpoint: Some("http://localhost:11434".to_string()),
            ..AppConfig::default()
        };

        assert_eq!(EmbeddingConfig::from_app_config(&config).endpoint, None);
    }
}
