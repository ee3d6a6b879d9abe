//! LLM integration crate for the course notes service.
//!
//! This crate provides a provider-agnostic abstraction for the generative
//! model that composes answers from retrieved passages. Providers sit behind
//! the [`LlmClient`] trait so the query engine never depends on a vendor API.
//!
//! # Providers
//! - **Gemini**: Google Generative Language API (default)
//! - **Ollama**: Local LLM runtime
//! - **Mock**: Offline extractive answers for development and tests
//!
//! # Example
//! ```no_run
//! use notes_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{GeminiClient, MockLlmClient, OllamaClient};
pub use types::{ClientOptions, ProviderType};
