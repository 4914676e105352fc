//! Application state for API handlers

use crate::lifecycle::AppLifecycle;
use crate::registration::AppRegistrations;
use appmgr_hooks::SubscriptionRegistry;
use appmgr_store::NamespacedStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Webhook subscriptions
    pub registry: Arc<SubscriptionRegistry>,

    /// Package-manager facade
    pub lifecycle: Arc<AppLifecycle>,

    /// Registered app instances
    pub registrations: Arc<AppRegistrations>,

    /// Store handle for readiness checks
    pub store: NamespacedStore,

    /// Namespace probed by the readiness check
    pub probe_namespace: String,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        lifecycle: Arc<AppLifecycle>,
        registrations: Arc<AppRegistrations>,
        store: NamespacedStore,
        probe_namespace: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            lifecycle,
            registrations,
            store,
            probe_namespace: probe_namespace.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let duration = chrono::Utc::now() - self.started_at;
        let secs = duration.num_seconds();

        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        }
    }
}
