//! Health handlers

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
}

/// Liveness: the process is serving requests
pub async fn health_alive(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "alive".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
    })
}

/// Readiness response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub subscriptions: usize,
    pub registered_instances: usize,
}

/// Readiness: the key-value store answers
pub async fn health_ready(State(state): State<AppState>) -> ApiResult<Json<ReadinessResponse>> {
    state.store.get_all(&state.probe_namespace).await?;

    Ok(Json(ReadinessResponse {
        status: "ready".to_string(),
        subscriptions: state.registry.len(),
        registered_instances: state.registrations.list().len(),
    }))
}
