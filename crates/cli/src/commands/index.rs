//! Index command handler.
//!
//! Loads the persisted index or builds it from the corpus, then prints
//! what was acquired.

use clap::Args;
use notes_core::{config::AppConfig, AppError, AppResult};
use notes_knowledge::{IndexOrigin, IndexStats};

/// Build or load the index and print its statistics
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Ignore the persisted index and rebuild from the corpus
    #[arg(long)]
    pub rebuild: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!(rebuild = self.rebuild, "Executing index command");

        let manager = notes_knowledge::open_manager(config, super::stderr_progress(!self.json))?;
        manager.acquire(self.rebuild).await?;

        let stats = manager
            .stats()
            .await
            .ok_or_else(|| AppError::Other("Index was not acquired".to_string()))?;

        if self.json {
            let output = serde_json::json!({
                "storage": config.storage_dir(),
                "stats": stats,
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", format_stats(&stats));
            println!("Storage: {}", config.storage_dir().display());
        }

        Ok(())
    }
}

fn format_stats(stats: &IndexStats) -> String {
    let origin = match stats.origin {
        IndexOrigin::Loaded => "Loaded",
        IndexOrigin::Built => "Built",
    };
    format!(
        "{} index: {} chunks from {} documents ({}/{}, {} dimensions, created {})",
        origin,
        stats.chunk_count,
        stats.document_count,
        stats.embedding_provider,
        stats.embedding_model,
        stats.dimension,
        stats.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}
