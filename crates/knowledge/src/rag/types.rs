//! RAG response types.

use notes_core::AppConfig;
use serde::{Deserialize, Serialize};

/// A single source reference used to answer a question.
///
/// User-facing: chunk ids, scores and byte offsets stay internal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSourceRef {
    /// Source file name (e.g., "thermodynamics.md")
    pub source: String,

    /// Human-readable location within the source, e.g. "lines 12-34"
    pub location: String,

    /// Short snippet showing the evidence (truncated if needed)
    pub snippet: String,
}

/// Answer to a question plus where it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    /// Answer text from the generative model
    pub answer: String,

    /// Sources of the retrieved passages, most similar first
    pub sources: Vec<RagSourceRef>,

    /// Distance of the closest retrieved passage; lower is more similar
    #[serde(skip_serializing, default)]
    pub best_distance: f32,
}

impl RagResponse {
    pub fn new(answer: String, sources: Vec<RagSourceRef>, best_distance: f32) -> Self {
        Self {
            answer,
            sources,
            best_distance,
        }
    }
}

/// Retrieval and generation settings for the query engine.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Passages retrieved per question
    pub top_k: usize,

    /// Generative model identifier
    pub model: String,

    pub temperature: f32,

    pub max_tokens: Option<u32>,

    /// Character budget of one prompt's context section
    pub max_context_chars: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.2,
            max_tokens: None,
            max_context_chars: 12_000,
        }
    }
}

impl QueryOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.top_k,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_context_chars: config.max_context_chars,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}
