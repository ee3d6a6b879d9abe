//! Chat command handler.
//!
//! A line-oriented chat client for a running `notes serve`. Every question is
//! sent to `POST /query`; the conversation is kept in memory and printed as a
//! transcript on `/history` and when the session ends.

use clap::Args;
use notes_core::{config::AppConfig, AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Interactive chat against a running server
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Server URL (default: http://<NOTES_BIND>)
    #[arg(long, env = "NOTES_URL")]
    pub url: Option<String>,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let url = self
            .url
            .clone()
            .unwrap_or_else(|| format!("http://{}", config.bind));
        tracing::info!("Starting chat session against {}", url);

        let mut session =
            ChatSession::new(url, Duration::from_secs(config.request_timeout_secs))?;

        println!("Ask a question about the course notes. /history shows the transcript, /exit quits.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            eprint!("> ");
            let Some(line) = lines.next_line().await? else {
                break;
            };

            match line.trim() {
                "" => continue,
                "/exit" | "/quit" => break,
                "/history" => print!("{}", session.transcript()),
                question => match session.send(question).await {
                    Ok(answer) => println!("{}\n", answer.trim()),
                    Err(e) => eprintln!("error: {}", e),
                },
            }
        }

        if !session.history().is_empty() {
            println!("\n{}", session.transcript());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => write!(f, "You"),
            Speaker::Assistant => write!(f, "Notes"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub speaker: Speaker,
    pub text: String,
}

#[derive(Serialize)]
struct QueryBody<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct AnswerBody {
    answer: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

/// In-memory chat history plus the HTTP client used to reach the server.
pub struct ChatSession {
    client: reqwest::Client,
    query_url: String,
    history: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into();
        Ok(Self {
            client,
            query_url: format!("{}/query", base_url.trim_end_matches('/')),
            history: Vec::new(),
        })
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Send a question and record both sides of the exchange.
    ///
    /// Failed exchanges are not added to the history.
    pub async fn send(&mut self, question: &str) -> AppResult<String> {
        let response = self
            .client
            .post(&self.query_url)
            .json(&QueryBody { question })
            .send()
            .await
            .map_err(|e| AppError::Other(format!("Failed to reach {}: {}", self.query_url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(err) if !err.message.is_empty() => format!("{} ({})", err.message, err.error),
                _ => body,
            };
            return Err(AppError::Other(format!("Server returned {}: {}", status, detail)));
        }

        let body: AnswerBody = response
            .json()
            .await
            .map_err(|e| AppError::Serialization(format!("Invalid server response: {}", e)))?;

        self.history.push(ChatTurn {
            speaker: Speaker::User,
            text: question.to_string(),
        });
        self.history.push(ChatTurn {
            speaker: Speaker::Assistant,
            text: body.answer.clone(),
        });

        Ok(body.answer)
    }

    pub fn transcript(&self) -> String {
        self.history
            .iter()
            .map(|turn| format!("{}: {}\n", turn.speaker, turn.text.trim()))
            .collect()
    }
}
