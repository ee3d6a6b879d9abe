//! Corpus discovery and text extraction.
//!
//! Walks the corpus directory in a deterministic order, reads every readable
//! text file and cleans it according to its content type. Files that cannot
//! be read as UTF-8 text are skipped with a warning.

use crate::progress::ProgressReporter;
use crate::types::Document;
use notes_core::{AppError, AppResult};
use std::fs;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Html,
    Code,
    PlainText,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("html") | Some("htm") => Self::Html,
            Some("rs") | Some("py") | Some("js") | Some("ts") | Some("go") | Some("c")
            | Some("cpp") | Some("java") | Some("sh") => Self::Code,
            Some("txt") | Some("rst") | Some("csv") => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Code => "code",
            Self::PlainText => "text",
            Self::Unknown => "unknown",
        }
    }
}

/// Load every readable document under `root`.
///
/// # Errors
/// Returns `AppError::CorpusUnavailable` if `root` does not exist, is not a
/// directory, or yields no document with text content.
pub fn load_corpus(root: &Path, progress: &ProgressReporter) -> AppResult<Vec<Document>> {
    if !root.exists() {
        return Err(AppError::CorpusUnavailable(format!(
            "Corpus directory does not exist: {}",
            root.display()
        )));
    }
    if !root.is_dir() {
        return Err(AppError::CorpusUnavailable(format!(
            "Corpus path is not a directory: {}",
            root.display()
        )));
    }

    let files: Vec<DirEntry> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable corpus entry: {}", e);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .collect();

    let total = files.len() as u64;
    progress.discover(total, Some(total), &root.display().to_string());

    let mut documents = Vec::with_capacity(files.len());
    for (i, entry) in files.iter().enumerate() {
        let path = entry.path();
        let relative_path = relative_path(root, path);
        progress.parse(i as u64 + 1, Some(total), &relative_path);

        let text = match parse_file(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %relative_path, "Skipping file: {}", e);
                continue;
            }
        };

        if text.trim().is_empty() {
            tracing::debug!(file = %relative_path, "Skipping empty file");
            continue;
        }

        documents.push(Document {
            path: path.to_path_buf(),
            relative_path,
            content_type: ContentType::from_path(path),
            text,
            size_bytes: entry.metadata().map(|m| m.len()).unwrap_or(0),
        });
    }

    if documents.is_empty() {
        return Err(AppError::CorpusUnavailable(format!(
            "No readable documents found in {}",
            root.display()
        )));
    }

    tracing::info!(
        documents = documents.len(),
        scanned = total,
        "Loaded corpus from {}",
        root.display()
    );

    Ok(documents)
}

/// Parse a source file and extract clean text.
pub fn parse_file(path: &Path) -> AppResult<String> {
    let content_type = ContentType::from_path(path);

    let raw = fs::read_to_string(path)?;

    let cleaned = match content_type {
        ContentType::Markdown => clean_markdown(&raw),
        ContentType::Html => clean_html(&raw),
        ContentType::Code => clean_code(&raw),
        ContentType::PlainText => raw,
        ContentType::Unknown => {
            if is_likely_text(&raw) {
                raw
            } else {
                return Err(AppError::Other(format!(
                    "{} looks like a binary file",
                    path.display()
                )));
            }
        }
    };

    Ok(cleaned)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Clean markdown by dropping rules and fences and header markers.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

/// Clean HTML by stripping tags, scripts and styles.
fn clean_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut in_script = false;
    let mut in_style = false;

    for (i, ch) in text.char_indices() {
        if ch == '<' {
            in_tag = true;
            let rest = &text[i..];
            if starts_with_ignore_case(rest, "<script") {
                in_script = true;
            } else if starts_with_ignore_case(rest, "</script") {
                in_script = false;
            } else if starts_with_ignore_case(rest, "<style") {
                in_style = true;
            } else if starts_with_ignore_case(rest, "</style") {
                in_style = false;
            }
        } else if ch == '>' {
            in_tag = false;
            result.push(' ');
        } else if !in_tag && !in_script && !in_style {
            result.push(ch);
        }
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false)
}

/// Clean code by dropping blank lines and line comments.
fn clean_code(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("//") || trimmed.starts_with('#') {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

fn is_likely_text(data: &str) -> bool {
    !data.contains('\0')
}
