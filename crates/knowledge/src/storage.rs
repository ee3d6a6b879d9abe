//! On-disk layout of a persisted index.
//!
//! A storage directory holds three files:
//! - `manifest.json`: build metadata, checked before anything else is read
//! - `vectors.bin`: bincode-encoded vector buffer
//! - `docstore.json`: chunk text and source metadata, in vector order
//!
//! Writes go to a sibling staging directory that replaces the storage
//! directory only once every file is flushed, so readers observe either the
//! previous complete index or the new one.

use crate::flat_index::FlatIndex;
use crate::types::{IndexIdentity, IndexManifest, KnowledgeChunk, INDEX_FORMAT_VERSION};
use crate::vector_index::VectorIndex;
use notes_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const VECTORS_FILE: &str = "vectors.bin";
pub const DOCSTORE_FILE: &str = "docstore.json";

#[derive(Serialize, Deserialize)]
struct VectorPayload {
    dimension: u32,
    values: Vec<f32>,
}

/// Whether `dir` looks like it holds a persisted index.
pub fn exists(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).is_file()
}

/// Write `index` to `dir`, replacing any previous index there.
///
/// # Errors
/// Returns `AppError::PersistFailed` on any filesystem failure. The previous
/// contents of `dir` are left in place when the write fails.
pub fn persist(index: &FlatIndex, dir: &Path) -> AppResult<()> {
    let parent = parent_dir(dir);
    fs::create_dir_all(&parent).map_err(|e| persist_error(&parent, e))?;

    let staging = tempfile::Builder::new()
        .prefix(".index-staging-")
        .tempdir_in(&parent)
        .map_err(|e| persist_error(&parent, e))?;

    let payload = VectorPayload {
        dimension: index.dimension() as u32,
        values: index.vectors().to_vec(),
    };

    write_synced(
        &staging.path().join(MANIFEST_FILE),
        &serde_json::to_vec_pretty(index.manifest())?,
    )?;
    write_synced(
        &staging.path().join(VECTORS_FILE),
        &bincode::serialize(&payload)?,
    )?;
    write_synced(
        &staging.path().join(DOCSTORE_FILE),
        &serde_json::to_vec(index.chunks())?,
    )?;

    swap_into_place(staging.into_path(), dir)?;

    tracing::debug!(
        path = %dir.display(),
        chunks = index.len(),
        "Persisted index"
    );
    Ok(())
}

/// Load the index persisted in `dir`.
///
/// The manifest must match `expected`: an index embedded with another
/// provider, model or vector width is unusable for queries, and one chunked
/// with other settings no longer reflects the configuration.
///
/// # Errors
/// - `AppError::IndexLoadFailed` if files are missing, truncated, malformed
///   or built with a different embedder or chunking
/// - `AppError::Io` for any other filesystem failure (e.g. permissions)
pub fn load(dir: &Path, expected: &IndexIdentity) -> AppResult<FlatIndex> {
    if !dir.is_dir() {
        return Err(AppError::IndexLoadFailed(format!(
            "No index directory at {}",
            dir.display()
        )));
    }

    let manifest: IndexManifest = read_json(&dir.join(MANIFEST_FILE))?;

    if manifest.format_version != INDEX_FORMAT_VERSION {
        return Err(AppError::IndexLoadFailed(format!(
            "Unsupported index format version {} (expected {})",
            manifest.format_version, INDEX_FORMAT_VERSION
        )));
    }
    if manifest.embedding_provider != expected.provider
        || manifest.embedding_model != expected.model
    {
        return Err(AppError::IndexLoadFailed(format!(
            "Index was built with {}/{}, configured embedder is {}/{}",
            manifest.embedding_provider,
            manifest.embedding_model,
            expected.provider,
            expected.model
        )));
    }

    if let Some(dimension) = expected.dimension {
        if manifest.dimension != dimension {
            return Err(AppError::IndexLoadFailed(format!(
                "Index has {}-dimensional vectors, configured embedder produces {}",
                manifest.dimension, dimension
            )));
        }
    }
    if manifest.chunk_size != expected.chunk_size
        || manifest.chunk_overlap != expected.chunk_overlap
    {
        return Err(AppError::IndexLoadFailed(format!(
            "Index was chunked with size {} overlap {}, configured size {} overlap {}",
            manifest.chunk_size, manifest.chunk_overlap, expected.chunk_size, expected.chunk_overlap
        )));
    }

    let vectors_path = dir.join(VECTORS_FILE);
    let payload: VectorPayload = bincode::deserialize(&read_bytes(&vectors_path)?)
        .map_err(|e| corrupt(&vectors_path, e))?;
    if payload.dimension as usize != manifest.dimension {
        return Err(AppError::IndexLoadFailed(format!(
            "Vector store dimension {} disagrees with manifest dimension {}",
            payload.dimension, manifest.dimension
        )));
    }

    let chunks: Vec<KnowledgeChunk> = read_json(&dir.join(DOCSTORE_FILE))?;

    FlatIndex::from_parts(manifest, payload.values, chunks)
}

fn parent_dir(dir: &Path) -> PathBuf {
    match dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> AppResult<()> {
    let mut file = File::create(path).map_err(|e| persist_error(path, e))?;
    file.write_all(bytes).map_err(|e| persist_error(path, e))?;
    file.sync_all().map_err(|e| persist_error(path, e))?;
    Ok(())
}

/// Replace `target` with `staging` using renames only.
fn swap_into_place(staging: PathBuf, target: &Path) -> AppResult<()> {
    let backup = if target.exists() {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index".to_string());
        let backup = parent_dir(target).join(format!(".{}.previous-{}", name, std::process::id()));
        remove_path(&backup);

        if let Err(e) = fs::rename(target, &backup) {
            remove_path(&staging);
            return Err(persist_error(target, e));
        }
        Some(backup)
    } else {
        None
    };

    if let Err(e) = fs::rename(&staging, target) {
        if let Some(backup) = &backup {
            if let Err(restore) = fs::rename(backup, target) {
                tracing::error!(
                    "Failed to restore previous index from {}: {}",
                    backup.display(),
                    restore
                );
            }
        }
        remove_path(&staging);
        return Err(persist_error(target, e));
    }

    if let Some(backup) = backup {
        remove_path(&backup);
    }
    Ok(())
}

fn remove_path(path: &Path) {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    if let Err(e) = result {
        if e.kind() != ErrorKind::NotFound {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

fn read_bytes(path: &Path) -> AppResult<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound | ErrorKind::InvalidData | ErrorKind::UnexpectedEof => {
            corrupt(path, e)
        }
        _ => AppError::Io(e),
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> AppResult<T> {
    let bytes = read_bytes(path)?;
    serde_json::from_slice(&bytes).map_err(|e| corrupt(path, e))
}

fn corrupt(path: &Path, err: impl std::fmt::Display) -> AppError {
    AppError::IndexLoadFailed(format!("{}: {}", path.display(), err))
}

fn persist_error(path: &Path, err: std::io::Error) -> AppError {
    AppError::PersistFailed(format!("{}: {}", path.display(), err))
}
