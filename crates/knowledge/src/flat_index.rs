//! Exact, in-memory nearest-neighbour index.
//!
//! Vectors are stored row-major in one contiguous buffer, one row per chunk,
//! in corpus order. Search is a linear scan over squared Euclidean distance.

use crate::chunker::{self, ChunkingConfig};
use crate::embeddings::EmbeddingProvider;
use crate::progress::ProgressReporter;
use crate::types::{
    Document, IndexIdentity, IndexManifest, KnowledgeChunk, ScoredChunk, INDEX_FORMAT_VERSION,
};
use crate::vector_index::{squared_l2, VectorIndex};
use chrono::Utc;
use notes_core::{AppConfig, AppError, AppResult};

/// Text embedded once per build to learn the provider's vector width.
pub(crate) const PROBE_TEXT: &str = "test";

/// Settings for building an index from documents.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub chunking: ChunkingConfig,
    pub batch_size: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            batch_size: 32,
        }
    }
}

impl BuildOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            chunking: ChunkingConfig::from_config(config),
            batch_size: config.embed_batch_size.max(1),
        }
    }
}

/// Flat L2 index over chunk embeddings.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    manifest: IndexManifest,
    vectors: Vec<f32>,
    chunks: Vec<KnowledgeChunk>,
}

impl FlatIndex {
    /// Chunk, embed and index `documents`.
    ///
    /// Nothing is written to disk. Any embedding failure aborts the build
    /// with `AppError::EmbeddingFailed`.
    ///
    /// # Errors
    /// - `AppError::CorpusUnavailable` if there are no documents or no chunks
    /// - `AppError::EmbeddingFailed` if the provider fails or returns vectors
    ///   of inconsistent width
    pub async fn build(
        documents: &[Document],
        embedder: &dyn EmbeddingProvider,
        options: &BuildOptions,
        progress: &ProgressReporter,
    ) -> AppResult<Self> {
        if documents.is_empty() {
            return Err(AppError::CorpusUnavailable(
                "Cannot build an index from zero documents".to_string(),
            ));
        }

        let dimension = embedder.embed(PROBE_TEXT).await?.len();
        if dimension == 0 {
            return Err(AppError::EmbeddingFailed(format!(
                "Embedding model '{}' returned an empty vector",
                embedder.model_name()
            )));
        }

        let chunks = chunker::chunk_documents(documents, &options.chunking)?;
        progress.chunk(
            documents.len() as u64,
            Some(documents.len() as u64),
            chunks.len(),
        );
        if chunks.is_empty() {
            return Err(AppError::CorpusUnavailable(
                "Corpus contains no indexable text".to_string(),
            ));
        }

        tracing::info!(
            documents = documents.len(),
            chunks = chunks.len(),
            dimension,
            provider = embedder.provider_name(),
            model = embedder.model_name(),
            "Embedding corpus"
        );

        let total = chunks.len() as u64;
        let mut vectors = Vec::with_capacity(chunks.len() * dimension);
        let mut embedded = 0u64;

        for batch in chunks.chunks(options.batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let batch_vectors = embedder.embed_batch(&texts).await?;

            if batch_vectors.len() != batch.len() {
                return Err(AppError::EmbeddingFailed(format!(
                    "Provider returned {} vectors for {} chunks",
                    batch_vectors.len(),
                    batch.len()
                )));
            }

            for (chunk, vector) in batch.iter().zip(&batch_vectors) {
                if vector.len() != dimension {
                    return Err(AppError::EmbeddingFailed(format!(
                        "Chunk {} of {} embedded to width {}, expected {}",
                        chunk.position,
                        chunk.source_path,
                        vector.len(),
                        dimension
                    )));
                }
                vectors.extend_from_slice(vector);
            }

            embedded += batch.len() as u64;
            progress.embed(embedded, Some(total), embedder.model_name());
        }

        let manifest = IndexManifest {
            format_version: INDEX_FORMAT_VERSION,
            embedding_provider: embedder.provider_name().to_string(),
            embedding_model: embedder.model_name().to_string(),
            dimension,
            chunk_count: chunks.len(),
            document_count: documents.len(),
            chunk_size: options.chunking.chunk_size,
            chunk_overlap: options.chunking.chunk_overlap,
            created_at: Utc::now(),
        };

        Ok(Self {
            manifest,
            vectors,
            chunks,
        })
    }

    /// Reassemble an index from its persisted parts.
    ///
    /// Every inconsistency is reported as `AppError::IndexLoadFailed`.
    pub fn from_parts(
        manifest: IndexManifest,
        vectors: Vec<f32>,
        chunks: Vec<KnowledgeChunk>,
    ) -> AppResult<Self> {
        if manifest.dimension == 0 {
            return Err(AppError::IndexLoadFailed(
                "Manifest records a zero dimension".to_string(),
            ));
        }
        if chunks.is_empty() {
            return Err(AppError::IndexLoadFailed(
                "Persisted index has no chunks".to_string(),
            ));
        }
        if manifest.chunk_count != chunks.len() {
            return Err(AppError::IndexLoadFailed(format!(
                "Manifest lists {} chunks, docstore has {}",
                manifest.chunk_count,
                chunks.len()
            )));
        }
        if vectors.len() != manifest.dimension * chunks.len() {
            return Err(AppError::IndexLoadFailed(format!(
                "Vector store holds {} values, expected {} x {}",
                vectors.len(),
                chunks.len(),
                manifest.dimension
            )));
        }

        Ok(Self {
            manifest,
            vectors,
            chunks,
        })
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn vectors(&self) -> &[f32] {
        &self.vectors
    }

    pub fn chunks(&self) -> &[KnowledgeChunk] {
        &self.chunks
    }

    /// Embedder and chunking settings this index was built with.
    pub fn identity(&self) -> IndexIdentity {
        IndexIdentity {
            provider: self.manifest.embedding_provider.clone(),
            model: self.manifest.embedding_model.clone(),
            dimension: Some(self.manifest.dimension),
            chunk_size: self.manifest.chunk_size,
            chunk_overlap: self.manifest.chunk_overlap,
        }
    }

    fn row(&self, i: usize) -> &[f32] {
        let dim = self.manifest.dimension;
        &self.vectors[i * dim..(i + 1) * dim]
    }
}

impl VectorIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.manifest.dimension
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }

    fn search(&self, query: &[f32], top_k: usize) -> AppResult<Vec<ScoredChunk>> {
        if query.len() != self.dimension() {
            return Err(AppError::EmbeddingFailed(format!(
                "Query vector has width {}, index expects {}",
                query.len(),
                self.dimension()
            )));
        }

        let k = top_k.clamp(1, self.len().max(1));

        let mut scored: Vec<(usize, f32)> = (0..self.len())
            .map(|i| (i, squared_l2(query, self.row(i))))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect())
    }
}
