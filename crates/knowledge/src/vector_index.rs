//! Vector index abstraction for knowledge chunks.

use crate::types::ScoredChunk;
use notes_core::AppResult;

/// Trait for similarity search backends.
///
/// Results are ordered by ascending distance (most similar first); ties keep
/// insertion order.
pub trait VectorIndex: Send + Sync {
    /// Width of every stored vector.
    fn dimension(&self) -> usize;

    /// Number of stored chunks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the `top_k` chunks nearest to `query`.
    ///
    /// `top_k` is clamped to `[1, len]`. A query of the wrong width is an
    /// `AppError::EmbeddingFailed`.
    fn search(&self, query: &[f32], top_k: usize) -> AppResult<Vec<ScoredChunk>>;
}

/// Squared Euclidean distance between two equal-length vectors.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
