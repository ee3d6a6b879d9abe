//! HTTP transport for the course notes question-answering service.
//!
//! Routes:
//! - `POST /query` with `{"question": "..."}` returns `{"answer": "...", "sources": [...]}`
//! - `GET /health` returns index status
//!
//! The index is acquired before the listener is bound, so the first request
//! never pays for a build.

mod error;

pub use error::ApiError;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use notes_core::{AppError, AppResult};
use notes_knowledge::{QueryEngine, RagSourceRef};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct AppState {
    engine: Arc<QueryEngine>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<RagSourceRef>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub chunks: usize,
    pub dimension: usize,
}

/// Build the application router.
pub fn router(engine: Arc<QueryEngine>) -> Router {
    let state = AppState { engine };

    Router::new()
        .route("/query", post(query_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Acquire the index, bind `addr` and serve until Ctrl+C.
pub async fn serve(engine: Arc<QueryEngine>, addr: &str) -> AppResult<()> {
    let index = engine.manager().acquire(false).await?;
    tracing::info!(chunks = notes_knowledge::VectorIndex::len(index.as_ref()), "Index ready");

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        AppError::Config(format!("Failed to bind {}: {}", addr, e))
    })?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router(engine))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

async fn query_handler(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = payload?;
    let response = state.engine.ask(&request.question).await?;

    Ok(Json(QueryResponse {
        answer: response.answer,
        sources: response.sources,
    }))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let health = match state.engine.manager().stats().await {
        Some(stats) => HealthResponse {
            status: "ok".to_string(),
            chunks: stats.chunk_count,
            dimension: stats.dimension,
        },
        None => HealthResponse {
            status: "initializing".to_string(),
            chunks: 0,
            dimension: 0,
        },
    };
    Json(health)
}
