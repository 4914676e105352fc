//! App Manager daemon library
//!
//! Wires the key-value store, subscription registry, webhook delivery and
//! app registrations together behind a REST API:
//! - [`config`]: layered configuration (defaults, file, `APPMGR_*` environment)
//! - [`lifecycle`]: package-manager seam and event-publishing facade
//! - [`registration`]: app instance registration
//! - [`server`]: startup sequence and graceful shutdown

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod api;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod registration;
pub mod server;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError, DaemonResult};
pub use lifecycle::{AppLifecycle, InMemoryPackageManager, PackageManager};
pub use registration::AppRegistrations;
pub use server::Server;
