//! App instance registration handlers

use super::json_body;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use appmgr_types::{AppEndpoint, DeregisterRequest, RegisterRequest};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

pub async fn register_app(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AppEndpoint>)> {
    let request = json_body(payload)?;
    let endpoint = state.registrations.register(request).await?;
    Ok((StatusCode::CREATED, Json(endpoint)))
}

pub async fn deregister_app(
    State(state): State<AppState>,
    payload: Result<Json<DeregisterRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let request = json_body(payload)?;
    state
        .registrations
        .deregister(&request)
        .await?
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiError::NotFound(format!("App instance {} not registered", request.key())))
}

/// Instances currently registered with this daemon
pub async fn list_registered(State(state): State<AppState>) -> Json<Vec<AppEndpoint>> {
    Json(state.registrations.list())
}
