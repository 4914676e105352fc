//! Subscription records
//!
//! A subscription pairs a webhook target URL with an event type and a retry
//! policy. Two subscriptions with the same `(target_url, event_type)` are
//! duplicates.

use crate::{EventType, SubscriptionId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Caller-supplied subscription parameters (create and modify)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    /// Callback endpoint
    pub target_url: String,

    /// Class of lifecycle event wanted
    pub event_type: EventType,

    /// Delivery attempts before the subscriber is dropped
    pub max_retries: i64,

    /// Seconds to wait between attempts
    pub retry_timer: i64,
}

impl SubscriptionRequest {
    pub fn new(
        target_url: impl Into<String>,
        event_type: EventType,
        max_retries: i64,
        retry_timer: i64,
    ) -> Self {
        Self {
            target_url: target_url.into(),
            event_type,
            max_retries,
            retry_timer,
        }
    }

    /// Validate the request before it touches any registry state
    pub fn validate(&self) -> Result<(), ValidationError> {
        let url = Url::parse(&self.target_url)
            .map_err(|e| ValidationError::InvalidTargetUrl(format!("{}: {}", self.target_url, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidTargetUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(ValidationError::InvalidTargetUrl(format!(
                "{} has no host",
                self.target_url
            )));
        }

        if self.max_retries < 0 {
            return Err(ValidationError::NegativeRetryBudget(self.max_retries));
        }

        if self.retry_timer < 0 {
            return Err(ValidationError::NegativeRetryTimer(self.retry_timer));
        }

        Ok(())
    }
}

/// A registered subscription as held by the registry and persisted to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: SubscriptionId,
    pub target_url: String,
    pub event_type: EventType,
    pub max_retries: i64,
    pub retry_timer: i64,
}

impl Subscription {
    pub fn from_request(id: SubscriptionId, request: SubscriptionRequest) -> Self {
        Self {
            id,
            target_url: request.target_url,
            event_type: request.event_type,
            max_retries: request.max_retries,
            retry_timer: request.retry_timer,
        }
    }

    /// Whether `request` would register the same `(target_url, event_type)` pair
    pub fn duplicates(&self, request: &SubscriptionRequest) -> bool {
        self.target_url == request.target_url && self.event_type == request.event_type
    }

    pub fn response(&self) -> SubscriptionResponse {
        SubscriptionResponse {
            id: self.id.clone(),
            version: 0,
            event_type: self.event_type,
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_timer.max(0) as u64)
    }
}

/// Receipt returned for create/modify
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub id: SubscriptionId,
    pub version: u64,
    pub event_type: EventType,
}

/// Rejected caller input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid target URL: {0}")]
    InvalidTargetUrl(String),

    #[error("maxRetries must be >= 0, got {0}")]
    NegativeRetryBudget(i64),

    #[error("retryTimer must be >= 0, got {0}")]
    NegativeRetryTimer(i64),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> SubscriptionRequest {
        SubscriptionRequest::new(url, EventType::Created, 2, 1)
    }

    #[test]
    fn accepts_http_and_https_targets() {
        assert!(request("http://h/hook").validate().is_ok());
        assert!(request("https://hooks.example.com:8443/cb").validate().is_ok());
    }

    #[test]
    fn rejects_bad_targets() {
        assert!(matches!(
            request("not a url").validate(),
            Err(ValidationError::InvalidTargetUrl(_))
        ));
        assert!(matches!(
            request("ftp://h/hook").validate(),
            Err(ValidationError::InvalidTargetUrl(_))
        ));
    }

    #[test]
    fn rejects_negative_policy() {
        let mut req = request("http://h/hook");
        req.max_retries = -1;
        assert_eq!(req.validate(), Err(ValidationError::NegativeRetryBudget(-1)));

        let mut req = request("http://h/hook");
        req.retry_timer = -3;
        assert_eq!(req.validate(), Err(ValidationError::NegativeRetryTimer(-3)));
    }

    #[test]
    fn request_uses_camel_case() {
        let req: SubscriptionRequest = serde_json::from_value(serde_json::json!({
            "targetUrl": "http://h/hook",
            "eventType": "created",
            "maxRetries": 2,
            "retryTimer": 1
        }))
        .unwrap();
        assert_eq!(req, request("http://h/hook"));
    }

    #[test]
    fn response_version_is_zero() {
        let sub = Subscription::from_request(SubscriptionId::new("x"), request("http://h/hook"));
        let resp = sub.response();
        assert_eq!(resp.version, 0);
        assert_eq!(resp.event_type, EventType::Created);
        assert!(sub.duplicates(&request("http://h/hook")));
        assert!(!sub.duplicates(&request("http://h/other")));
    }
}
