//! Error types for the hooks crate

use appmgr_store::StoreError;
use appmgr_types::{SubscriptionId, ValidationError};
use thiserror::Error;

/// Result type for registry, delivery and directory operations
pub type HookResult<T> = Result<T, HookError>;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Another subscription already covers the same target and event type
    #[error("Subscription {0} already covers this target and event type")]
    Conflict(SubscriptionId),

    /// A single webhook attempt failed (transport error or non-200)
    #[error("Delivery failed: {0}")]
    Delivery(String),
}
