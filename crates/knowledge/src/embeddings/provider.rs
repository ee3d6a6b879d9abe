//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::{GeminiEmbeddingProvider, MockProvider, OllamaProvider};
use notes_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
///
/// Implementations report failures as `AppError::EmbeddingFailed` and return
/// exactly one vector per input text, in input order.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "gemini", "ollama", "mock")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Vector width, if the provider knows it without calling the model.
    ///
    /// Remote providers return `None`; their width is learned by embedding
    /// a probe text.
    fn known_dimension(&self) -> Option<usize> {
        None
    }

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::EmbeddingFailed("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
pub fn create_provider(config: &EmbeddingConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    tracing::debug!(
        provider = %config.provider,
        model = %config.model,
        "Creating embedding provider"
    );

    match config.provider.as_str() {
        "mock" => Ok(Arc::new(MockProvider::new(config.dimensions))),
        "ollama" => Ok(Arc::new(OllamaProvider::from_config(config)?)),
        "gemini" => Ok(Arc::new(GeminiEmbeddingProvider::from_config(config)?)),
        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: gemini, ollama, mock",
            config.provider
        ))),
    }
}
