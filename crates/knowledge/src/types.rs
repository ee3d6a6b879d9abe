//! Core types for the course notes index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::loader::ContentType;

/// On-disk layout version written into every manifest.
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// A source file read from the corpus directory.
#[derive(Debug, Clone)]
pub struct Document {
    /// Absolute path on disk
    pub path: PathBuf,

    /// Path relative to the corpus root, `/`-separated
    pub relative_path: String,

    /// Detected content type
    pub content_type: ContentType,

    /// Cleaned text content
    pub text: String,

    /// Size of the raw file in bytes
    pub size_bytes: u64,
}

/// A contiguous text segment of a document, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Deterministic identifier derived from source, position and text
    pub id: String,

    /// Source document path relative to the corpus root
    pub source_path: String,

    /// Zero-based position of this chunk inside its document
    pub position: u32,

    /// Chunk text
    pub text: String,

    /// Byte offsets of the chunk inside the cleaned document text
    pub byte_range: (usize, usize),

    /// One-based, inclusive line span inside the cleaned document text
    pub line_range: (usize, usize),

    /// SHA-256 of the chunk text
    pub hash: String,
}

impl KnowledgeChunk {
    /// File name of the source document.
    pub fn source_name(&self) -> &str {
        self.source_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.source_path)
    }
}

/// A chunk returned by a similarity search.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: KnowledgeChunk,

    /// Squared Euclidean distance to the query; lower is more similar
    pub score: f32,
}

/// Metadata persisted next to the vectors, describing how they were built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub embedding_provider: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub chunk_count: usize,
    pub document_count: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub created_at: DateTime<Utc>,
}

/// Settings a persisted index must have been built with to be reusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexIdentity {
    pub provider: String,
    pub model: String,
    /// Vector width of the configured embedder; `None` skips the check
    pub dimension: Option<usize>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

/// How the current in-memory index came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexOrigin {
    Loaded,
    Built,
}

/// Summary of the current index, for `notes index` and `/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub origin: IndexOrigin,
    pub chunk_count: usize,
    pub document_count: usize,
    pub dimension: usize,
    pub embedding_provider: String,
    pub embedding_model: String,
    pub created_at: DateTime<Utc>,
}
