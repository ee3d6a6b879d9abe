//! Serve command handler.

use clap::Args;
use notes_core::{config::AppConfig, AppResult};
use std::sync::Arc;

/// Acquire the index and serve the HTTP query API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind (overrides NOTES_BIND)
    #[arg(long)]
    pub bind: Option<String>,

    /// Rebuild the index from the corpus instead of loading it
    #[arg(long)]
    pub rebuild: bool,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        config.validate()?;

        let bind = self.bind.as_deref().unwrap_or(&config.bind);
        tracing::info!(
            corpus = %config.corpus_dir().display(),
            storage = %config.storage_dir().display(),
            "Starting course notes server"
        );

        let engine = notes_knowledge::open_engine(config, super::stderr_progress(true))?;
        if self.rebuild {
            engine.manager().acquire(true).await?;
        }

        notes_server::serve(Arc::new(engine), bind).await
    }
}
