//! API request handlers

mod apps;
mod health;
mod registration;
mod subscriptions;

pub use apps::*;
pub use health::*;
pub use registration::*;
pub use subscriptions::*;

use crate::error::{ApiError, ApiResult};
use axum::extract::rejection::JsonRejection;
use axum::Json;

/// Unwrap a JSON body, turning extractor rejections into 400s
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}
