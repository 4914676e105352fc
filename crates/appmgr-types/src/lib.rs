//! App Manager Types - core types shared by the store, hooks and daemon crates
//!
//! The app manager installs and removes pluggable applications ("apps") and
//! notifies webhook subscribers whenever an app changes lifecycle state.
//!
//! ## Key Concepts
//!
//! - **Subscription**: a durable webhook registration (target URL, event type, retry policy)
//! - **EventType**: the class of lifecycle event a subscriber wants (`all` is the wildcard)
//! - **NotificationEnvelope**: the body POSTed to a subscriber for one publish call
//! - **AppSnapshot**: the externally visible state of an installed app
//! - **AppEndpoint**: the callback endpoints of one registered app instance

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod app;
pub mod events;
pub mod ids;
pub mod subscription;

pub use app::{
    AppDescriptor, AppEndpoint, AppInstance, AppSnapshot, AppStatus, DeregisterRequest,
    RegisterRequest,
};
pub use events::{EventType, NotificationEnvelope, ParseEventTypeError};
pub use ids::SubscriptionId;
pub use subscription::{Subscription, SubscriptionRequest, SubscriptionResponse, ValidationError};
