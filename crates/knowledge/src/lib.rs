//! Course notes retrieval and question answering.
//!
//! Reads a directory of notes, splits it into chunks, embeds every chunk and
//! keeps the vectors in a flat L2 index persisted to a storage directory.
//! Questions are embedded with the same model, matched against the index and
//! answered by a generative model from the nearest passages.
//!
//! # Example
//! ```no_run
//! use notes_core::AppConfig;
//! use notes_knowledge::{open_engine, ProgressReporter};
//!
//! # async fn example() -> notes_core::AppResult<()> {
//! let config = AppConfig::load()?;
//! let engine = open_engine(&config, ProgressReporter::noop())?;
//! let answer = engine.answer("At what temperature does water boil?").await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod chunker;
pub mod embeddings;
pub mod flat_index;
pub mod loader;
pub mod manager;
pub mod progress;
pub mod rag;
pub mod storage;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use flat_index::{BuildOptions, FlatIndex};
pub use manager::IndexManager;
pub use progress::{ProgressEvent, ProgressReporter};
pub use rag::{QueryEngine, QueryOptions, RagResponse, RagSourceRef};
pub use types::{Document, IndexManifest, IndexOrigin, IndexStats, KnowledgeChunk, ScoredChunk};
pub use vector_index::VectorIndex;

use notes_core::{AppConfig, AppResult};
use notes_llm::{create_client, ClientOptions};
use std::sync::Arc;

/// Index manager for the configured corpus, storage and embedding provider.
///
/// Nothing is loaded until the first [`IndexManager::acquire`].
pub fn open_manager(config: &AppConfig, progress: ProgressReporter) -> AppResult<Arc<IndexManager>> {
    let embedder = create_provider(&EmbeddingConfig::from_app_config(config))?;

    tracing::debug!(
        corpus = %config.corpus_dir().display(),
        storage = %config.storage_dir().display(),
        embedding_provider = embedder.provider_name(),
        embedding_model = embedder.model_name(),
        "Opening index manager"
    );

    Ok(Arc::new(
        IndexManager::from_config(config, embedder).with_progress(progress),
    ))
}

/// Query engine wired to the configured providers.
pub fn open_engine(config: &AppConfig, progress: ProgressReporter) -> AppResult<QueryEngine> {
    let manager = open_manager(config, progress)?;
    let llm = create_client(&config.provider, &ClientOptions::from_config(config))?;

    Ok(QueryEngine::new(manager, llm, QueryOptions::from_config(config)))
}
