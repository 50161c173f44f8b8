use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{errors::AppError, state::AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub database: String,
    pub storage: String,
    pub embedder: String,
    pub llm: String,
    pub version: String,
}

/// Health check endpoint
///
/// Returns the health status of the API and the providers it was wired with
async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let db_status = match state.store.health_check().await {
        Ok(_) => "connected".to_string(),
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            "disconnected".to_string()
        }
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        database: db_status,
        storage: state.blobs.name().to_string(),
        embedder: state.embedder.name().to_string(),
        llm: state.generator.name().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Readiness probe for load balancers
///
/// Returns 200 if the service is ready to accept traffic
async fn readiness(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.store.health_check().await?;

    Ok(Json(serde_json::json!({
        "ready": true
    })))
}

/// Liveness probe for orchestration systems
async fn liveness() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "alive": true
    }))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/readiness", get(readiness))
        .route("/liveness", get(liveness))
}
