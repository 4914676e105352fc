//! Lifecycle event types and the webhook notification envelope

use crate::{AppSnapshot, SubscriptionId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Class of app lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Wildcard: any app changed
    All,
    Created,
    Deleted,
    Modified,
    Deployed,
    Undeployed,
    Restarted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::All => "all",
            EventType::Created => "created",
            EventType::Deleted => "deleted",
            EventType::Modified => "modified",
            EventType::Deployed => "deployed",
            EventType::Undeployed => "undeployed",
            EventType::Restarted => "restarted",
        }
    }

    /// Whether a subscriber registered for `self` wants an event of type `event`
    pub fn accepts(&self, event: EventType) -> bool {
        *self == EventType::All || *self == event
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown event type: {0}")]
pub struct ParseEventTypeError(String);

impl FromStr for EventType {
    type Err = ParseEventTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(EventType::All),
            "created" => Ok(EventType::Created),
            "deleted" => Ok(EventType::Deleted),
            "modified" => Ok(EventType::Modified),
            "deployed" => Ok(EventType::Deployed),
            "undeployed" => Ok(EventType::Undeployed),
            "restarted" => Ok(EventType::Restarted),
            other => Err(ParseEventTypeError(other.to_string())),
        }
    }
}

/// One element of the JSON array POSTed to a subscriber.
///
/// `version` is the publish sequence number shared by every subscriber
/// notified in the same publish call, not a per-subscription counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEnvelope {
    pub id: SubscriptionId,
    pub version: u64,
    pub event_type: EventType,
    #[serde(rename = "xapp")]
    pub payload: Vec<AppSnapshot>,
}

impl NotificationEnvelope {
    /// Wire body: a single-element JSON array
    pub fn to_body(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(std::slice::from_ref(self))
    }
}
