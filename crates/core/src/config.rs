//! Configuration management for the course notes service.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - A `.env` file in the working directory
//! - Config file (`.notes/config.yaml` in the workspace, or `NOTES_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric: the corpus defaults to
//! `<workspace>/data` and the persisted index to `<workspace>/storage`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Generative providers the service knows how to talk to.
pub const KNOWN_PROVIDERS: [&str; 3] = ["gemini", "ollama", "mock"];

/// Embedding providers the service knows how to talk to.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 3] = ["gemini", "ollama", "mock"];

/// Main application configuration.
///
/// Holds every resolved value the pipeline needs: credentials, directory
/// paths, model selection and retrieval tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .notes/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Corpus directory override (default: `<workspace>/data`)
    pub corpus_dir: Option<PathBuf>,

    /// Index storage directory override (default: `<workspace>/storage`)
    pub storage_dir: Option<PathBuf>,

    /// Generative provider ("gemini", "ollama")
    pub provider: String,

    /// Generative model identifier
    pub model: String,

    /// Embedding provider ("gemini", "ollama", "mock")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// API key for the hosted provider
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    /// Custom endpoint for the generative provider
    pub endpoint: Option<String>,

    /// Custom endpoint for the embedding provider
    pub embedding_endpoint: Option<String>,

    /// Sampling temperature for answer generation
    pub temperature: f32,

    /// Maximum tokens to generate per answer
    pub max_tokens: Option<u32>,

    /// Number of chunks retrieved per question
    pub top_k: usize,

    /// Target chunk size in characters
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,

    /// Number of chunks sent per embedding request
    pub embed_batch_size: usize,

    /// Upper bound on context characters packed into one generation call
    pub max_context_chars: usize,

    /// Timeout applied to every outbound model request
    pub request_timeout_secs: u64,

    /// Address the HTTP server binds to
    pub bind: String,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    paths: Option<PathsSection>,
    llm: Option<LlmSection>,
    embedding: Option<EmbeddingSection>,
    retrieval: Option<RetrievalSection>,
    server: Option<ServerSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PathsSection {
    corpus: Option<PathBuf>,
    storage: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
    temperature: Option<f32>,
    #[serde(rename = "maxTokens")]
    max_tokens: Option<u32>,
    #[serde(rename = "timeoutSecs")]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "batchSize")]
    batch_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RetrievalSection {
    #[serde(rename = "topK")]
    top_k: Option<usize>,
    #[serde(rename = "chunkSize")]
    chunk_size: Option<usize>,
    #[serde(rename = "chunkOverlap")]
    chunk_overlap: Option<usize>,
    #[serde(rename = "maxContextChars")]
    max_context_chars: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerSection {
    bind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            corpus_dir: None,
            storage_dir: None,
            provider: "gemini".to_string(),
            model: "gemini-1.5-flash".to_string(),
            embedding_provider: "gemini".to_string(),
            embedding_model: "models/embedding-001".to_string(),
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            endpoint: None,
            embedding_endpoint: None,
            temperature: 0.2,
            max_tokens: None,
            top_k: 5,
            chunk_size: 1024,
            chunk_overlap: 200,
            embed_batch_size: 32,
            max_context_chars: 12_000,
            request_timeout_secs: 60,
            bind: "127.0.0.1:8000".to_string(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, the YAML config file, environment
    /// variables and defaults.
    ///
    /// Environment variables:
    /// - `NOTES_WORKSPACE`: Override workspace path
    /// - `NOTES_CONFIG`: Path to config file
    /// - `NOTES_CORPUS_DIR` / `NOTES_STORAGE_DIR`: Directory overrides
    /// - `NOTES_PROVIDER` / `NOTES_MODEL`: Generative provider and model
    /// - `NOTES_EMBEDDING_PROVIDER` / `NOTES_EMBEDDING_MODEL`: Embedding provider and model
    /// - `GEMINI_API_KEY` (or the variable named by `llm.apiKeyEnv`): API key
    /// - `OLLAMA_URL`: Ollama endpoint for both providers
    /// - `NOTES_BIND`: HTTP bind address
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use notes_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Corpus: {:?}", config.corpus_dir());
    /// ```
    pub fn load() -> AppResult<Self> {
        // A missing .env is the common case
        let _ = dotenv::dotenv();

        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("NOTES_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("NOTES_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.notes_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(dir) = std::env::var("NOTES_CORPUS_DIR") {
            config.corpus_dir = Some(PathBuf::from(dir));
        }
        if let Ok(dir) = std::env::var("NOTES_STORAGE_DIR") {
            config.storage_dir = Some(PathBuf::from(dir));
        }
        if let Ok(provider) = std::env::var("NOTES_PROVIDER") {
            config.provider = provider;
        }
        if let Ok(model) = std::env::var("NOTES_MODEL") {
            config.model = model;
        }
        if let Ok(provider) = std::env::var("NOTES_EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }
        if let Ok(model) = std::env::var("NOTES_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            if config.provider == "ollama" {
                config.endpoint = Some(url.clone());
            }
            if config.embedding_provider == "ollama" {
                config.embedding_endpoint = Some(url);
            }
        }
        if let Ok(bind) = std::env::var("NOTES_BIND") {
            config.bind = bind;
        }

        config.api_key = std::env::var(&config.api_key_env).ok();
        config.log_level = std::env::var("RUST_LOG").ok().or(config.log_level);

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(paths) = config_file.paths {
            if let Some(corpus) = paths.corpus {
                result.corpus_dir = Some(corpus);
            }
            if let Some(storage) = paths.storage {
                result.storage_dir = Some(storage);
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if llm.endpoint.is_some() {
                result.endpoint = llm.endpoint;
            }
            if let Some(env) = llm.api_key_env {
                result.api_key_env = env;
            }
            if let Some(temperature) = llm.temperature {
                result.temperature = temperature;
            }
            if llm.max_tokens.is_some() {
                result.max_tokens = llm.max_tokens;
            }
            if let Some(timeout) = llm.timeout_secs {
                result.request_timeout_secs = timeout;
            }
        }

        if let Some(embedding) = config_file.embedding {
            if let Some(provider) = embedding.provider {
                result.embedding_provider = provider;
            }
            if let Some(model) = embedding.model {
                result.embedding_model = model;
            }
            if embedding.endpoint.is_some() {
                result.embedding_endpoint = embedding.endpoint;
            }
            if let Some(batch_size) = embedding.batch_size {
                result.embed_batch_size = batch_size;
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            if let Some(top_k) = retrieval.top_k {
                result.top_k = top_k;
            }
            if let Some(size) = retrieval.chunk_size {
                result.chunk_size = size;
            }
            if let Some(overlap) = retrieval.chunk_overlap {
                result.chunk_overlap = overlap;
            }
            if let Some(max) = retrieval.max_context_chars {
                result.max_context_chars = max;
            }
        }

        if let Some(server) = config_file.server {
            if let Some(bind) = server.bind {
                result.bind = bind;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        corpus_dir: Option<PathBuf>,
        storage_dir: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if corpus_dir.is_some() {
            self.corpus_dir = corpus_dir;
        }

        if storage_dir.is_some() {
            self.storage_dir = storage_dir;
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .notes directory.
    pub fn notes_dir(&self) -> PathBuf {
        self.workspace.join(".notes")
    }

    /// Resolved corpus directory.
    pub fn corpus_dir(&self) -> PathBuf {
        self.resolve_path(self.corpus_dir.as_deref(), "data")
    }

    /// Resolved index storage directory.
    pub fn storage_dir(&self) -> PathBuf {
        self.resolve_path(self.storage_dir.as_deref(), "storage")
    }

    fn resolve_path(&self, configured: Option<&Path>, default: &str) -> PathBuf {
        match configured {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => self.workspace.join(path),
            None => self.workspace.join(default),
        }
    }

    /// Validate configuration for the selected providers.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        let needs_key = self.provider == "gemini" || self.embedding_provider == "gemini";
        if needs_key && self.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.api_key_env
            )));
        }

        if self.top_k == 0 {
            return Err(AppError::Config("top_k must be at least 1".to_string()));
        }

        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if self.embed_batch_size == 0 {
            return Err(AppError::Config(
                "embedding batch size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
