//! Question answering over the course notes index.
//!
//! Embeds the question with the index's embedder, retrieves the nearest
//! passages and asks the generative model to compose an answer from them.

use crate::manager::IndexManager;
use crate::rag::prompt;
use crate::rag::types::{QueryOptions, RagResponse, RagSourceRef};
use crate::types::ScoredChunk;
use crate::vector_index::VectorIndex;
use notes_core::{AppError, AppResult};
use notes_llm::{LlmClient, LlmRequest};
use std::collections::HashSet;
use std::sync::Arc;

/// Maximum snippet length for source references, in characters.
const MAX_SNIPPET_LENGTH: usize = 150;

/// Answers questions against the index owned by an [`IndexManager`].
pub struct QueryEngine {
    manager: Arc<IndexManager>,
    llm: Arc<dyn LlmClient>,
    options: QueryOptions,
}

impl QueryEngine {
    pub fn new(manager: Arc<IndexManager>, llm: Arc<dyn LlmClient>, options: QueryOptions) -> Self {
        Self {
            manager,
            llm,
            options,
        }
    }

    /// Replace the retrieval and generation settings.
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn manager(&self) -> &Arc<IndexManager> {
        &self.manager
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Answer `question` and return only the answer text.
    pub async fn answer(&self, question: &str) -> AppResult<String> {
        Ok(self.ask(question).await?.answer)
    }

    /// Answer `question` with the sources that were retrieved for it.
    ///
    /// # Errors
    /// - `AppError::InvalidInput` for an empty question
    /// - `AppError::EmbeddingFailed` if the question cannot be embedded
    /// - `AppError::GenerationUnavailable` if the generative model fails
    /// - index acquisition errors, see [`IndexManager::acquire`]
    #[tracing::instrument(skip(self), fields(top_k = self.options.top_k))]
    pub async fn ask(&self, question: &str) -> AppResult<RagResponse> {
        let question = question.trim();
        let results = self.retrieve(question).await?;

        let best_distance = results.first().map(|r| r.score).unwrap_or(f32::MAX);
        tracing::debug!(
            retrieved = results.len(),
            best_distance,
            "Retrieved passages"
        );

        let answer = self.synthesize(question, &results).await?;
        let sources = map_chunks_to_sources(&results);

        Ok(RagResponse::new(answer, sources, best_distance))
    }

    /// Retrieve the passages nearest to `question`, most similar first.
    pub async fn retrieve(&self, question: &str) -> AppResult<Vec<ScoredChunk>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::InvalidInput("Question must not be empty".to_string()));
        }

        let index = self.manager.acquire(false).await?;

        let query_vector = self
            .manager
            .embedder()
            .embed(question)
            .await
            .map_err(|e| match e {
                AppError::EmbeddingFailed(_) => e,
                other => AppError::EmbeddingFailed(other.to_string()),
            })?;

        index.search(&query_vector, self.options.top_k)
    }

    /// Compose an answer from passages: answer from the first context
    /// window, then refine with each remaining one.
    async fn synthesize(&self, question: &str, results: &[ScoredChunk]) -> AppResult<String> {
        let windows = prompt::pack_context(
            results.iter().map(|r| r.chunk.text.as_str()),
            self.options.max_context_chars,
        );

        let mut answer: Option<String> = None;
        for (i, window) in windows.iter().enumerate() {
            let text = match &answer {
                None => prompt::question_answer(window, question),
                Some(existing) => prompt::refine(window, question, existing),
            };
            tracing::debug!(window = i, prompt_chars = text.len(), "Generating answer");
            answer = Some(self.generate(text).await?);
        }

        answer.ok_or_else(|| {
            AppError::GenerationUnavailable("No context available to answer from".to_string())
        })
    }

    async fn generate(&self, text: String) -> AppResult<String> {
        let mut request = LlmRequest::new(text, self.options.model.clone())
            .with_system(prompt::system_prompt())
            .with_temperature(self.options.temperature);
        if let Some(max_tokens) = self.options.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self.llm.complete(&request).await.map_err(|e| match e {
            AppError::GenerationUnavailable(_) => e,
            other => AppError::GenerationUnavailable(other.to_string()),
        })?;

        Ok(response.content.trim().to_string())
    }
}

/// Map retrieved chunks to source references, dropping duplicates.
fn map_chunks_to_sources(results: &[ScoredChunk]) -> Vec<RagSourceRef> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();

    for result in results {
        let chunk = &result.chunk;
        let source = chunk.source_name().to_string();
        let location = format!("lines {}-{}", chunk.line_range.0, chunk.line_range.1);

        if seen.insert((source.clone(), location.clone())) {
            sources.push(RagSourceRef {
                source,
                location,
                snippet: truncate_snippet(&chunk.text, MAX_SNIPPET_LENGTH),
            });
        }
    }

    sources
}

/// Truncate to `max_chars` characters at a word boundary when possible.
fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let truncated = &text[..cut];
    match truncated.rfind(char::is_whitespace) {
        Some(space) if space > 0 => format!("{}...", truncated[..space].trim_end()),
        _ => format!("{}...", truncated),
    }
}
