//! Index lifecycle: load from storage, or build from the corpus and persist.
//!
//! [`IndexManager`] owns the single in-memory index of a process. The first
//! caller of [`IndexManager::acquire`] loads or builds it while concurrent
//! callers wait on the same lock; later callers get the cached handle.

use crate::embeddings::EmbeddingProvider;
use crate::flat_index::{BuildOptions, FlatIndex, PROBE_TEXT};
use crate::loader;
use crate::progress::ProgressReporter;
use crate::storage;
use crate::types::{IndexIdentity, IndexOrigin, IndexStats};
use crate::vector_index::VectorIndex;
use notes_core::{AppConfig, AppError, AppResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

struct Acquired {
    index: Arc<FlatIndex>,
    origin: IndexOrigin,
}

pub struct IndexManager {
    corpus_dir: PathBuf,
    storage_dir: PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
    options: BuildOptions,
    progress: ProgressReporter,
    state: Mutex<Option<Acquired>>,
}

impl IndexManager {
    pub fn new(
        corpus_dir: impl Into<PathBuf>,
        storage_dir: impl Into<PathBuf>,
        embedder: Arc<dyn EmbeddingProvider>,
        options: BuildOptions,
    ) -> Self {
        Self {
            corpus_dir: corpus_dir.into(),
            storage_dir: storage_dir.into(),
            embedder,
            options,
            progress: ProgressReporter::noop(),
            state: Mutex::new(None),
        }
    }

    /// Manager for the configured corpus and storage directories.
    pub fn from_config(config: &AppConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::new(
            config.corpus_dir(),
            config.storage_dir(),
            embedder,
            BuildOptions::from_config(config),
        )
    }

    /// Report build progress through `progress`.
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn corpus_dir(&self) -> &Path {
        &self.corpus_dir
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// The embedder every index vector and query vector comes from.
    pub fn embedder(&self) -> Arc<dyn EmbeddingProvider> {
        Arc::clone(&self.embedder)
    }

    /// Return the process-wide index, loading or building it on first use.
    ///
    /// With `force_rebuild` the corpus is re-read and re-embedded even if an
    /// index is cached or persisted. A persisted index that cannot be loaded
    /// is replaced by a fresh build; a failure to persist that build is
    /// logged and the in-memory index is still returned.
    ///
    /// # Errors
    /// - `AppError::CorpusUnavailable` when a build is needed and the corpus
    ///   is missing or empty
    /// - `AppError::EmbeddingFailed` when the build cannot embed the corpus
    /// - `AppError::Io` when storage exists but cannot be read
    pub async fn acquire(&self, force_rebuild: bool) -> AppResult<Arc<FlatIndex>> {
        let mut state = self.state.lock().await;

        if !force_rebuild {
            if let Some(acquired) = state.as_ref() {
                return Ok(Arc::clone(&acquired.index));
            }
        }

        let (index, origin) = self.load_or_build(force_rebuild).await?;
        *state = Some(Acquired {
            index: Arc::clone(&index),
            origin,
        });

        Ok(index)
    }

    /// The cached index, if one has been acquired.
    pub async fn current(&self) -> Option<Arc<FlatIndex>> {
        self.state
            .lock()
            .await
            .as_ref()
            .map(|acquired| Arc::clone(&acquired.index))
    }

    /// Summary of the cached index, if one has been acquired.
    pub async fn stats(&self) -> Option<IndexStats> {
        let state = self.state.lock().await;
        state.as_ref().map(|acquired| {
            let manifest = acquired.index.manifest();
            IndexStats {
                origin: acquired.origin,
                chunk_count: acquired.index.len(),
                document_count: manifest.document_count,
                dimension: acquired.index.dimension(),
                embedding_provider: manifest.embedding_provider.clone(),
                embedding_model: manifest.embedding_model.clone(),
                created_at: manifest.created_at,
            }
        })
    }

    async fn load_or_build(&self, force_rebuild: bool) -> AppResult<(Arc<FlatIndex>, IndexOrigin)> {
        if force_rebuild {
            tracing::info!("Rebuilding index from {}", self.corpus_dir.display());
        } else if self.storage_dir.exists() {
            match self.load().await {
                Ok(index) => {
                    tracing::info!(
                        chunks = index.len(),
                        dimension = index.dimension(),
                        "Loaded index from {}",
                        self.storage_dir.display()
                    );
                    return Ok((Arc::new(index), IndexOrigin::Loaded));
                }
                Err(e) if e.is_recoverable_by_rebuild() => {
                    tracing::warn!("Persisted index unusable, rebuilding: {}", e);
                }
                Err(e) => return Err(e),
            }
        } else {
            tracing::info!(
                "No index at {}, building from {}",
                self.storage_dir.display(),
                self.corpus_dir.display()
            );
        }

        let index = Arc::new(self.build().await?);
        self.persist(Arc::clone(&index)).await;

        Ok((index, IndexOrigin::Built))
    }

    async fn load(&self) -> AppResult<FlatIndex> {
        let dir = self.storage_dir.clone();
        let expected = IndexIdentity {
            provider: self.embedder.provider_name().to_string(),
            model: self.embedder.model_name().to_string(),
            dimension: self.embedder_dimension().await,
            chunk_size: self.options.chunking.chunk_size,
            chunk_overlap: self.options.chunking.chunk_overlap,
        };

        tokio::task::spawn_blocking(move || storage::load(&dir, &expected))
            .await
            .map_err(|e| AppError::Other(format!("Index load task failed: {}", e)))?
    }

    /// Width of the configured embedder's vectors.
    ///
    /// Providers that cannot tell are asked with one probe embedding. When
    /// the probe fails the width stays unknown and the load skips the check.
    async fn embedder_dimension(&self) -> Option<usize> {
        if let Some(dimension) = self.embedder.known_dimension() {
            return Some(dimension);
        }

        match self.embedder.embed(PROBE_TEXT).await {
            Ok(vector) => Some(vector.len()),
            Err(e) => {
                tracing::warn!("Could not probe embedding width, skipping dimension check: {}", e);
                None
            }
        }
    }

    async fn build(&self) -> AppResult<FlatIndex> {
        let documents = loader::load_corpus(&self.corpus_dir, &self.progress)?;
        FlatIndex::build(
            &documents,
            self.embedder.as_ref(),
            &self.options,
            &self.progress,
        )
        .await
    }

    async fn persist(&self, index: Arc<FlatIndex>) {
        let dir = self.storage_dir.clone();
        self.progress
            .persist(index.len() as u64, &dir.display().to_string());

        let result = tokio::task::spawn_blocking(move || storage::persist(&index, &dir))
            .await
            .map_err(|e| AppError::Other(format!("Index persist task failed: {}", e)))
            .and_then(|r| r);

        match result {
            Ok(()) => tracing::info!("Persisted index to {}", self.storage_dir.display()),
            Err(e) => tracing::warn!(
                "Failed to persist index to {}, continuing with in-memory index: {}",
                self.storage_dir.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::ChunkingConfig;
    use crate::embeddings::providers::MockProvider;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Mock embedder that counts how many texts it embedded.
    #[derive(Debug)]
    struct CountingEmbedder {
        inner: MockProvider,
        model: String,
        reports_width: bool,
        calls: AtomicUsize,
    }

    impl CountingEmbedder {
        fn new(model: &str) -> Arc<Self> {
            Self::with_width(model, 32, true)
        }

        /// With `reports_width` false it behaves like a remote provider
        /// whose width is only known after an embedding call.
        fn with_width(model: &str, width: usize, reports_width: bool) -> Arc<Self> {
            Arc::new(Self {
                inner: MockProvider::new(width),
                model: model.to_string(),
                reports_width,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        fn provider_name(&self) -> &str {
            "counting"
        }

        fn model_name(&self) -> &str {
            &self.model
        }

        fn known_dimension(&self) -> Option<usize> {
            self.reports_width
                .then(|| self.inner.known_dimension())
                .flatten()
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(texts.len(), Ordering::SeqCst);
            self.inner.embed_batch(texts).await
        }
    }

    struct Fixture {
        _temp: TempDir,
        corpus: PathBuf,
        storage: PathBuf,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let corpus = temp.path().join("data");
        fs::create_dir_all(&corpus).unwrap();
        fs::write(
            corpus.join("physics.txt"),
            "Water boils at 100 degrees Celsius at sea level.",
        )
        .unwrap();
        fs::write(
            corpus.join("sky.txt"),
            "The sky is blue because of Rayleigh scattering.",
        )
        .unwrap();
        let storage = temp.path().join("storage");
        Fixture {
            _temp: temp,
            corpus,
            storage,
        }
    }

    fn manager(fx: &Fixture, embedder: Arc<CountingEmbedder>) -> IndexManager {
        IndexManager::new(&fx.corpus, &fx.storage, embedder, BuildOptions::default())
    }

    #[tokio::test]
    async fn test_first_acquire_builds_and_persists() {
        let fx = fixture();
        let embedder = CountingEmbedder::new("m1");
        let manager = manager(&fx, embedder.clone());

        let index = manager.acquire(false).await.unwrap();

        assert_eq!(index.len(), 2);
        assert!(storage::exists(&fx.storage));
        assert_eq!(manager.stats().await.unwrap().origin, IndexOrigin::Built);
        assert!(embedder.calls() > 0);
    }

    #[tokio::test]
    async fn test_second_acquire_reuses_instance() {
        let fx = fixture();
        let embedder = CountingEmbedder::new("m1");
        let manager = manager(&fx, embedder.clone());

        let first = manager.acquire(false).await.unwrap();
        let calls = embedder.calls();
        let second = manager.acquire(false).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(embedder.calls(), calls);
    }

    #[tokio::test]
    async fn test_new_process_loads_without_embedding() {
        let fx = fixture();
        let built = manager(&fx, CountingEmbedder::new("m1"))
            .acquire(false)
            .await
            .unwrap();

        let embedder = CountingEmbedder::new("m1");
        let reloaded_manager = manager(&fx, embedder.clone());
        let reloaded = reloaded_manager.acquire(false).await.unwrap();

        assert_eq!(embedder.calls(), 0);
        assert_eq!(reloaded.chunks(), built.chunks());
        assert_eq!(reloaded.vectors(), built.vectors());
        assert_eq!(
            reloaded_manager.stats().await.unwrap().origin,
            IndexOrigin::Loaded
        );
    }

    #[tokio::test]
    async fn test_corrupt_storage_triggers_rebuild() {
        let fx = fixture();
        manager(&fx, CountingEmbedder::new("m1"))
            .acquire(false)
            .await
            .unwrap();
        fs::write(fx.storage.join(storage::VECTORS_FILE), b"garbage").unwrap();

        let embedder = CountingEmbedder::new("m1");
        let manager = manager(&fx, embedder.clone());
        let index = manager.acquire(false).await.unwrap();

        assert_eq!(index.len(), 2);
        assert!(embedder.calls() > 0);
        assert_eq!(manager.stats().await.unwrap().origin, IndexOrigin::Built);
        assert!(storage::load(&fx.storage, &index.identity()).is_ok());
    }

    #[tokio::test]
    async fn test_model_change_triggers_rebuild() {
        let fx = fixture();
        manager(&fx, CountingEmbedder::new("m1"))
            .acquire(false)
            .await
            .unwrap();

        let embedder = CountingEmbedder::new("m2");
        let index = manager(&fx, embedder.clone()).acquire(false).await.unwrap();

        assert!(embedder.calls() > 0);
        assert_eq!(index.manifest().embedding_model, "m2");
    }

    #[tokio::test]
    async fn test_dimension_change_triggers_rebuild() {
        let fx = fixture();
        manager(&fx, CountingEmbedder::with_width("m1", 32, true))
            .acquire(false)
            .await
            .unwrap();

        let embedder = CountingEmbedder::with_width("m1", 64, true);
        let manager = manager(&fx, embedder.clone());
        let index = manager.acquire(false).await.unwrap();

        assert_eq!(manager.stats().await.unwrap().origin, IndexOrigin::Built);
        assert_eq!(index.dimension(), 64);
        assert!(embedder.calls() > 0);

        let reloaded = IndexManager::new(
            &fx.corpus,
            &fx.storage,
            CountingEmbedder::with_width("m1", 64, true),
            BuildOptions::default(),
        );
        assert_eq!(reloaded.acquire(false).await.unwrap().dimension(), 64);
        assert_eq!(reloaded.stats().await.unwrap().origin, IndexOrigin::Loaded);
    }

    #[tokio::test]
    async fn test_unreported_width_is_probed_on_load() {
        let fx = fixture();
        manager(&fx, CountingEmbedder::with_width("m1", 32, false))
            .acquire(false)
            .await
            .unwrap();

        let same = CountingEmbedder::with_width("m1", 32, false);
        let same_manager = manager(&fx, same.clone());
        same_manager.acquire(false).await.unwrap();
        assert_eq!(same.calls(), 1);
        assert_eq!(same_manager.stats().await.unwrap().origin, IndexOrigin::Loaded);

        let wider = CountingEmbedder::with_width("m1", 48, false);
        let wider_manager = manager(&fx, wider.clone());
        let index = wider_manager.acquire(false).await.unwrap();
        assert_eq!(index.dimension(), 48);
        assert_eq!(wider_manager.stats().await.unwrap().origin, IndexOrigin::Built);
    }

    #[tokio::test]
    async fn test_chunking_change_triggers_rebuild() {
        let fx = fixture();
        manager(&fx, CountingEmbedder::new("m1"))
            .acquire(false)
            .await
            .unwrap();

        let options = BuildOptions {
            chunking: ChunkingConfig {
                chunk_size: 16,
                chunk_overlap: 4,
            },
            ..BuildOptions::default()
        };
        let manager = IndexManager::new(&fx.corpus, &fx.storage, CountingEmbedder::new("m1"), options);
        let index = manager.acquire(false).await.unwrap();

        assert_eq!(manager.stats().await.unwrap().origin, IndexOrigin::Built);
        assert_eq!(index.manifest().chunk_size, 16);
        assert!(index.len() > 2);
    }

    #[tokio::test]
    async fn test_force_rebuild_replaces_cached_index() {
        let fx = fixture();
        let embedder = CountingEmbedder::new("m1");
        let manager = manager(&fx, embedder.clone());

        let first = manager.acquire(false).await.unwrap();
        fs::write(fx.corpus.join("chem.txt"), "Salt dissolves in water.").unwrap();
        let second = manager.acquire(true).await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 3);
        assert!(Arc::ptr_eq(&second, &manager.current().await.unwrap()));
    }

    #[tokio::test]
    async fn test_missing_corpus_without_storage_fails() {
        let temp = TempDir::new().unwrap();
        let manager = IndexManager::new(
            temp.path().join("data"),
            temp.path().join("storage"),
            CountingEmbedder::new("m1"),
            BuildOptions::default(),
        );

        let err = manager.acquire(false).await.unwrap_err();
        assert!(matches!(err, AppError::CorpusUnavailable(_)));
        assert!(manager.current().await.is_none());
    }

    #[tokio::test]
    async fn test_persisted_index_survives_missing_corpus() {
        let fx = fixture();
        manager(&fx, CountingEmbedder::new("m1"))
            .acquire(false)
            .await
            .unwrap();
        fs::remove_dir_all(&fx.corpus).unwrap();

        let index = manager(&fx, CountingEmbedder::new("m1"))
            .acquire(false)
            .await
            .unwrap();
        assert_eq!(index.len(), 2);
    }

    #[tokio::test]
    async fn test_unwritable_storage_keeps_in_memory_index() {
        let fx = fixture();
        // A regular file where the storage directory's parent should be.
        let blocker = fx.storage.parent().unwrap().join("blocked");
        fs::write(&blocker, "not a directory").unwrap();

        let manager = IndexManager::new(
            &fx.corpus,
            blocker.join("storage"),
            CountingEmbedder::new("m1"),
            BuildOptions::default(),
        );

        let index = manager.acquire(false).await.unwrap();
        assert_eq!(index.len(), 2);
        assert!(!blocker.join("storage").exists());
    }

    #[tokio::test]
    async fn test_concurrent_first_acquire_builds_once() {
        let fx = fixture();
        let embedder = CountingEmbedder::new("m1");
        let manager = Arc::new(manager(&fx, embedder.clone()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.acquire(false).await.unwrap() })
            })
            .collect();

        let mut indexes = Vec::new();
        for handle in handles {
            indexes.push(handle.await.unwrap());
        }

        // One probe plus one vector per chunk.
        assert_eq!(embedder.calls(), 1 + 2);
        assert!(indexes.iter().all(|i| Arc::ptr_eq(i, &indexes[0])));
    }
}
