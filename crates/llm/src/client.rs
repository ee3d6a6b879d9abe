//! Generative provider abstraction.
//!
//! The query engine talks to every text-generation backend through
//! [`LlmClient`]: one prompt in, one complete answer out.

use notes_core::AppResult;
use serde::{Deserialize, Serialize};

/// A single completion call.
///
/// `prompt` already contains the retrieved passages and the question;
/// providers only add their own framing around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub prompt: String,

    /// Provider-specific model name, e.g. "gemini-1.5-flash" or "llama3.2"
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature, 0.0 - 2.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Instructions sent ahead of the prompt (system role where supported)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            system: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Answer text returned by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,

    /// Model that actually produced the answer, as reported by the provider
    pub model: String,

    pub usage: LlmUsage,
}

/// Token accounting reported by the provider, zero when unknown.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmUsage {
    #[serde(default)]
    pub prompt_tokens: u32,

    #[serde(default)]
    pub completion_tokens: u32,

    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Text-generation backend (Gemini, Ollama, the offline mock).
///
/// Implementations report transport and API failures as
/// [`notes_core::AppError::GenerationUnavailable`].
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Short provider identifier used in logs, e.g. "gemini".
    fn provider_name(&self) -> &str;

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = LlmRequest::new("What is entropy?", "gemini-1.5-flash")
            .with_temperature(0.2)
            .with_max_tokens(256)
            .with_system("Answer from the notes only.");

        assert_eq!(request.prompt, "What is entropy?");
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(256));
        assert_eq!(request.system.as_deref(), Some("Answer from the notes only."));
    }

    #[test]
    fn test_usage_totals() {
        let usage = LlmUsage::new(120, 30);
        assert_eq!(usage.total_tokens, 150);
    }
}
