//! Embedding providers.
//!
//! Every vector in an index and every query vector must come from the same
//! provider and model. The provider is resolved once from configuration and
//! shared by the index build and the query path.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
