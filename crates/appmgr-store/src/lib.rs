//! App Manager namespaced key-value store.
//!
//! Several subsystems (subscription storage, app-endpoint bookkeeping) share
//! one physical store. This crate keeps them apart:
//! - [`KeyValueBackend`] is the physical store (Redis in production, memory in tests)
//! - [`NamespacedStore`] prefixes every key with `{namespace},` and strips it on the way back
//! - [`KeyValueBatch`] is the statically typed batch accepted by `set`
//!
//! Empty inputs (`get`/`set`/`remove` with nothing to do, `remove_all` on an
//! empty namespace) succeed without touching the backend.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod backend;
mod batch;
mod error;
pub mod memory;
mod namespaced;
#[cfg(feature = "redis")]
pub mod redis_backend;

pub use backend::KeyValueBackend;
pub use batch::KeyValueBatch;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryBackend;
pub use namespaced::{namespace_prefix, NamespacedStore};
#[cfg(feature = "redis")]
pub use redis_backend::RedisBackend;
