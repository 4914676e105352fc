//! App Manager subscription registry and webhook delivery.
//!
//! - [`SubscriptionRegistry`]: durable, deduplicated set of webhook subscribers
//! - [`DeliveryEngine`]: fire-and-forget fan-out of lifecycle events with bounded retry
//! - [`AppEndpointDirectory`]: remembers registered app instances across restarts
//!
//! Registry and directory persist through [`appmgr_store::NamespacedStore`],
//! each under its own namespace.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

pub mod delivery;
pub mod directory;
pub mod error;
pub mod registry;

pub use delivery::{DeliveryConfig, DeliveryEngine, Dispatch};
pub use directory::AppEndpointDirectory;
pub use error::{HookError, HookResult};
pub use registry::SubscriptionRegistry;
