use axum::{Json, extract::State, response::IntoResponse};

use crate::AppState;
use crate::metrics;

/// Service banner
pub async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Room relay is running" }))
}

/// Health check endpoint - the relay is healthy whenever it can answer
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let rooms = state.broadcaster.rooms().await;
    let metrics = state.metrics.snapshot(state.broadcaster.stats());

    Json(metrics::HealthStatus {
        status: "healthy".to_string(),
        connections: metrics.connections.active,
        rooms: rooms.len() as u64,
        uptime_secs: metrics.uptime_secs,
        timestamp: chrono::Utc::now(),
    })
}

/// Metrics endpoint - returns detailed server metrics
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot(state.broadcaster.stats()))
}

/// Liveness probe - returns 200 if the server is running
pub async fn health_live_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "alive" }))
}
