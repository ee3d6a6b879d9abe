//! Document chunking with configurable size and overlap.
//!
//! Splitting is delegated to `text-splitter`, which prefers paragraph,
//! sentence and word boundaries over hard cuts and never exceeds the
//! configured size in characters.

use crate::types::{Document, KnowledgeChunk};
use notes_core::{AppConfig, AppError, AppResult};
use sha2::{Digest, Sha256};
use text_splitter::{ChunkConfig, TextSplitter};

/// Chunk size and overlap, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }

    fn splitter(&self) -> AppResult<TextSplitter<text_splitter::Characters>> {
        let config = ChunkConfig::new(self.chunk_size)
            .with_overlap(self.chunk_overlap)
            .map_err(|e| {
                AppError::Config(format!(
                    "Invalid chunking (size {}, overlap {}): {}",
                    self.chunk_size, self.chunk_overlap, e
                ))
            })?;
        Ok(TextSplitter::new(config))
    }
}

/// Split every document into chunks, in corpus order.
pub fn chunk_documents(
    documents: &[Document],
    config: &ChunkingConfig,
) -> AppResult<Vec<KnowledgeChunk>> {
    let splitter = config.splitter()?;
    let mut chunks = Vec::new();

    for document in documents {
        let before = chunks.len();
        chunks.extend(split_text(&splitter, &document.relative_path, &document.text));
        tracing::trace!(
            file = %document.relative_path,
            chunks = chunks.len() - before,
            "Chunked document"
        );
    }

    Ok(chunks)
}

/// Split a single text into chunks.
pub fn chunk_text(
    source_path: &str,
    text: &str,
    config: &ChunkingConfig,
) -> AppResult<Vec<KnowledgeChunk>> {
    Ok(split_text(&config.splitter()?, source_path, text))
}

fn split_text(
    splitter: &TextSplitter<text_splitter::Characters>,
    source_path: &str,
    text: &str,
) -> Vec<KnowledgeChunk> {
    splitter
        .chunk_indices(text)
        .filter(|(_, piece)| !piece.trim().is_empty())
        .enumerate()
        .map(|(position, (offset, piece))| {
            let start_line = text[..offset].matches('\n').count() + 1;
            let end_line = start_line + piece.matches('\n').count();
            let position = position as u32;

            KnowledgeChunk {
                id: chunk_id(source_path, position, piece),
                source_path: source_path.to_string(),
                position,
                text: piece.to_string(),
                byte_range: (offset, offset + piece.len()),
                line_range: (start_line, end_line),
                hash: sha256_hex(piece.as_bytes()),
            }
        })
        .collect()
}

fn chunk_id(source_path: &str, position: u32, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_path.as_bytes());
    hasher.update([0u8]);
    hasher.update(position.to_le_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..32].to_string()
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ContentType;
    use std::path::PathBuf;

    fn doc(path: &str, text: &str) -> Document {
        Document {
            path: PathBuf::from(path),
            relative_path: path.to_string(),
            content_type: ContentType::PlainText,
            text: text.to_string(),
            size_bytes: text.len() as u64,
        }
    }

    #[test]
    fn test_short_document_is_one_chunk() {
        let config = ChunkingConfig::default();
        let chunks = chunk_text("a.txt", "Water boils at 100 degrees Celsius.", &config).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Water boils at 100 degrees Celsius.");
        assert_eq!(chunks[0].position, 0);
        assert_eq!(chunks[0].line_range, (1, 1));
    }

    #[test]
    fn test_chunks_respect_size() {
        let config = ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 20,
        };
        let text = "This is a sentence about thermodynamics. ".repeat(40);
        let chunks = chunk_text("long.txt", &text, &config).unwrap();

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert!(chunk.text.chars().count() <= 100);
            assert_eq!(chunk.position, i as u32);
            assert_eq!(&text[chunk.byte_range.0..chunk.byte_range.1], chunk.text);
        }
    }

    #[test]
    fn test_line_ranges() {
        let config = ChunkingConfig {
            chunk_size: 20,
            chunk_overlap: 0,
        };
        let text = "first line here\nsecond line here\nthird line here";
        let chunks = chunk_text("lines.txt", text, &config).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].line_range, (1, 1));
        assert_eq!(chunks[2].line_range, (3, 3));
    }

    #[test]
    fn test_ids_are_deterministic_and_distinct() {
        let config = ChunkingConfig::default();
        let docs = vec![doc("a.txt", "Same text."), doc("b.txt", "Same text.")];

        let first = chunk_documents(&docs, &config).unwrap();
        let second = chunk_documents(&docs, &config).unwrap();

        assert_eq!(first, second);
        assert_ne!(first[0].id, first[1].id);
        assert_eq!(first[0].hash, first[1].hash);
        assert_eq!(first[0].id.len(), 32);
    }

    #[test]
    fn test_utf8_text() {
        let config = ChunkingConfig {
            chunk_size: 50,
            chunk_overlap: 10,
        };
        let text = "Café au lait ☕ est délicieux, n'est-ce pas? ".repeat(20);
        let chunks = chunk_text("fr.txt", &text, &config).unwrap();
        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let config = ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 10,
        };
        let err = chunk_text("a.txt", "text", &config).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
