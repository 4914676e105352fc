//! App lifecycle handlers

use super::json_body;
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use appmgr_types::{AppDescriptor, AppSnapshot};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

pub async fn list_apps(State(state): State<AppState>) -> ApiResult<Json<Vec<AppSnapshot>>> {
    Ok(Json(state.lifecycle.status_all().await?))
}

/// Install an app; subscribers get a `created` event
pub async fn install_app(
    State(state): State<AppState>,
    payload: Result<Json<AppDescriptor>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AppSnapshot>)> {
    let descriptor = json_body(payload)?;
    let snapshot = state.lifecycle.install(&descriptor).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

pub async fn get_app(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<AppSnapshot>> {
    Ok(Json(state.lifecycle.status(&name).await?))
}

/// Delete an app; subscribers get a `deleted` event
pub async fn delete_app(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    state.lifecycle.delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
