//! Ask command handler.
//!
//! Answers a single question in-process without going through the server.

use clap::Args;
use notes_core::{config::AppConfig, AppError, AppResult};
use notes_knowledge::QueryOptions;

/// Answer one question in-process
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Number of passages to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Temperature for response generation (0.0-2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        config.validate()?;

        let engine = notes_knowledge::open_engine(config, super::stderr_progress(!self.json))?
            .with_options(self.options(config));

        let response = engine.ask(&self.question).await?;

        if self.json {
            let output = serde_json::json!({
                "question": self.question,
                "answer": response.answer,
                "sources": response.sources,
                "provider": config.provider,
                "model": config.model,
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", response.answer.trim());

            if !response.sources.is_empty() {
                println!();
                println!("Sources:");
                for source in &response.sources {
                    println!("  - {} ({})", source.source, source.location);
                }
            }
        }

        Ok(())
    }

    fn options(&self, config: &AppConfig) -> QueryOptions {
        let mut options = QueryOptions::from_config(config);
        if let Some(top_k) = self.top_k {
            options = options.with_top_k(top_k);
        }
        if let Some(temperature) = self.temperature {
            options.temperature = temperature;
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let config = AppConfig::default();
        let cmd = AskCommand {
            question: "Why?".to_string(),
            top_k: Some(2),
            temperature: Some(0.7),
            json: false,
        };

        let options = cmd.options(&config);
        assert_eq!(options.top_k, 2);
        assert_eq!(options.temperature, 0.7);
        assert_eq!(options.model, config.model);
    }
}
