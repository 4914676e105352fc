//! Configuration for appmgrd

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Key-value store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Webhook delivery configuration
    #[serde(default)]
    pub delivery: DeliverySettings,

    /// Store namespaces
    #[serde(default)]
    pub namespaces: NamespaceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            enable_cors: true,
        }
    }
}

/// Key-value store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Fixed delay between startup connectivity probes
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            probe_interval_secs: default_probe_interval(),
        }
    }
}

impl StoreConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local store (development/testing)
    #[default]
    Memory,

    /// Redis server
    Redis {
        /// Connection URL, e.g. `redis://service-ricplt-dbaas-tcp:6379/`
        url: String,
    },
}

/// Webhook delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverySettings {
    /// Timeout for a single webhook POST
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Namespaces of the shared key-value store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceConfig {
    #[serde(default = "default_subscriptions_namespace")]
    pub subscriptions: String,

    #[serde(default = "default_endpoints_namespace")]
    pub endpoints: String,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            subscriptions: default_subscriptions_namespace(),
            endpoints: default_endpoints_namespace(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_probe_interval() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    10
}

fn default_subscriptions_namespace() -> String {
    "appmgr".to_string()
}

fn default_endpoints_namespace() -> String {
    "appdb".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then the optional file, then `APPMGR_*` variables.
    ///
    /// Nested keys use `__`, e.g. `APPMGR_STORE__BACKEND__TYPE=redis`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("APPMGR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
