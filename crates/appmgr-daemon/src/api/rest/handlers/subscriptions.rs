//! Subscription handlers

use super::json_body;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use appmgr_types::{Subscription, SubscriptionId, SubscriptionRequest, SubscriptionResponse};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

/// List all subscriptions
pub async fn list_subscriptions(State(state): State<AppState>) -> Json<Vec<Subscription>> {
    Json(state.registry.get_all())
}

/// Create a subscription; an existing one with the same target and event is returned as is
pub async fn create_subscription(
    State(state): State<AppState>,
    payload: Result<Json<SubscriptionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubscriptionResponse>)> {
    let request = json_body(payload)?;
    let response = state.registry.add(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Subscription>> {
    state
        .registry
        .get(&SubscriptionId::new(id.as_str()))
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Subscription {} not found", id)))
}

pub async fn modify_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SubscriptionRequest>, JsonRejection>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let request = json_body(payload)?;
    state
        .registry
        .modify(&SubscriptionId::new(id.as_str()), request)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Subscription {} not found", id)))
}

pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .registry
        .delete(&SubscriptionId::new(id.as_str()))
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiError::NotFound(format!("Subscription {} not found", id)))
}
