//! Offline generative provider.
//!
//! Answers by extracting the prompt sentence that shares the most content
//! words with the question (the last sentence ending in `?`). No network,
//! fully deterministic.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use notes_core::AppResult;
use std::collections::HashSet;

/// Reply used when nothing in the prompt overlaps with the question.
pub const NO_MATCH_ANSWER: &str = "I could not find this in the notes.";

const STOPWORDS: &[&str] = &[
    "the", "and", "are", "was", "were", "what", "does", "did", "how", "why", "which", "who",
    "when", "where", "with", "for", "from", "into", "about", "this", "that", "there", "their",
    "can", "has", "have", "you", "your", "question", "answer", "context",
];

/// Deterministic extractive client.
#[derive(Debug, Default, Clone)]
pub struct MockLlmClient;

impl MockLlmClient {
    pub fn new() -> Self {
        Self
    }

    fn extract(prompt: &str) -> String {
        let sentences = split_sentences(prompt);

        let Some(question) = sentences.iter().rev().find(|s| s.ends_with('?')) else {
            return NO_MATCH_ANSWER.to_string();
        };
        let question_words = content_words(question);

        let mut best: Option<(&str, usize)> = None;
        for sentence in sentences.iter().filter(|s| !s.ends_with('?')) {
            let overlap = content_words(sentence)
                .intersection(&question_words)
                .count();
            if overlap > 0 && best.map_or(true, |(_, score)| overlap > score) {
                best = Some((*sentence, overlap));
            }
        }

        best.map(|(sentence, _)| sentence.to_string())
            .unwrap_or_else(|| NO_MATCH_ANSWER.to_string())
    }
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    for line in text.lines() {
        let mut start = 0;
        for (idx, ch) in line.char_indices() {
            if matches!(ch, '.' | '?' | '!') {
                let end = idx + ch.len_utf8();
                let next_is_break = line[end..].chars().next().map_or(true, char::is_whitespace);
                if next_is_break {
                    sentences.push(line[start..end].trim());
                    start = end;
                }
            }
        }
        sentences.push(line[start..].trim());
    }
    sentences.retain(|s| !s.is_empty());
    sentences
}

fn content_words(sentence: &str) -> HashSet<String> {
    sentence
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() >= 3 && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let content = Self::extract(&request.prompt);
        tracing::debug!(answer_len = content.len(), "Mock client produced answer");

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}
