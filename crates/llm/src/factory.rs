//! LLM provider factory.
//!
//! This module creates generative clients from the resolved provider name
//! and client options.

use crate::client::LlmClient;
use crate::providers::{GeminiClient, MockLlmClient, OllamaClient};
use crate::types::{ClientOptions, ProviderType};
use notes_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("gemini", "ollama", "mock")
/// * `options` - Endpoint, API key and timeout
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown, a required API key
/// is missing, or the HTTP client cannot be built.
pub fn create_client(provider: &str, options: &ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    tracing::debug!(provider = provider_type.as_str(), "Creating LLM client");

    match provider_type {
        ProviderType::Gemini => Ok(Arc::new(GeminiClient::from_options(options)?)),
        ProviderType::Ollama => Ok(Arc::new(OllamaClient::from_options(options)?)),
        ProviderType::Mock => Ok(Arc::new(MockLlmClient::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", &ClientOptions::default()).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let options = ClientOptions::default().with_endpoint("http://localhost:8080");
        assert!(create_client("ollama", &options).is_ok());
    }

    #[test]
    fn test_gemini_requires_api_key() {
        match create_client("gemini", &ClientOptions::default()) {
            Err(err) => assert!(err.to_string().contains("requires API key")),
            Ok(_) => panic!("Expected error for Gemini without API key"),
        }
    }

    #[test]
    fn test_create_gemini_client() {
        let options = ClientOptions::default().with_api_key("key");
        let client = create_client("gemini", &options).unwrap();
        assert_eq!(client.provider_name(), "gemini");
    }

    #[test]
    fn test_create_mock_client() {
        let client = create_client("mock", &ClientOptions::default()).unwrap();
        assert_eq!(client.provider_name(), "mock");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", &ClientOptions::default()) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
