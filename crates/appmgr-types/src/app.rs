//! App snapshots and endpoint descriptors
//!
//! An [`AppSnapshot`] is what the package-manager driver reports and what
//! subscribers receive as payload. An [`AppEndpoint`] is what a running app
//! instance registers so it can be rediscovered after a restart.

use crate::ValidationError;
use serde::{Deserialize, Serialize};

/// Installed app status as reported by the package manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    Unknown,
    Deployed,
    Deleted,
    Superseded,
    Failed,
    Deleting,
}

/// One running instance of an app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInstance {
    pub name: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default)]
    pub tx_messages: Vec<String>,
    #[serde(default)]
    pub rx_messages: Vec<String>,
}

/// Externally visible state of an app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshot {
    pub name: String,
    pub status: AppStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub instances: Vec<AppInstance>,
}

impl AppSnapshot {
    pub fn new(name: impl Into<String>, status: AppStatus) -> Self {
        Self {
            name: name.into(),
            status,
            version: None,
            instances: Vec::new(),
        }
    }
}

/// Install request handed to the package-manager driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDescriptor {
    pub app_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl AppDescriptor {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.app_name.trim().is_empty() {
            return Err(ValidationError::MissingField("appName"));
        }
        Ok(())
    }
}

/// Registration sent by a running app instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub app_name: String,
    #[serde(default)]
    pub app_version: String,
    pub app_instance_name: String,
    pub http_endpoint: String,
    pub rmr_endpoint: String,
    /// App configuration; never persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.app_name.trim().is_empty() {
            return Err(ValidationError::MissingField("appName"));
        }
        if self.app_instance_name.trim().is_empty() {
            return Err(ValidationError::MissingField("appInstanceName"));
        }
        if self.http_endpoint.trim().is_empty() {
            return Err(ValidationError::MissingField("httpEndpoint"));
        }
        split_host_port(&self.rmr_endpoint)?;
        Ok(())
    }

    /// The persisted part of a registration (configuration stripped)
    pub fn endpoint(&self) -> AppEndpoint {
        AppEndpoint {
            app_name: self.app_name.clone(),
            app_version: self.app_version.clone(),
            app_instance_name: self.app_instance_name.clone(),
            http_endpoint: self.http_endpoint.clone(),
            rmr_endpoint: self.rmr_endpoint.clone(),
        }
    }
}

/// Deregistration sent by an app instance that is going away
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeregisterRequest {
    pub app_name: String,
    pub app_instance_name: String,
}

impl DeregisterRequest {
    pub fn key(&self) -> String {
        endpoint_key(&self.app_name, &self.app_instance_name)
    }
}

/// Callback endpoints of one registered app instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEndpoint {
    pub app_name: String,
    #[serde(default)]
    pub app_version: String,
    pub app_instance_name: String,
    pub http_endpoint: String,
    pub rmr_endpoint: String,
}

impl AppEndpoint {
    /// Logical store key: `<appName>/<appInstanceName>`
    pub fn key(&self) -> String {
        endpoint_key(&self.app_name, &self.app_instance_name)
    }

    /// Snapshot published to subscribers for this instance
    pub fn to_snapshot(&self, status: AppStatus, instance_status: &str) -> AppSnapshot {
        let (ip, port) = match split_host_port(&self.rmr_endpoint) {
            Ok((host, port)) => (Some(host), Some(port)),
            Err(_) => (None, None),
        };

        AppSnapshot {
            name: self.app_name.clone(),
            status,
            version: (!self.app_version.is_empty()).then(|| self.app_version.clone()),
            instances: vec![AppInstance {
                name: self.app_instance_name.clone(),
                status: instance_status.to_string(),
                ip,
                port,
                tx_messages: Vec::new(),
                rx_messages: Vec::new(),
            }],
        }
    }
}

pub fn endpoint_key(app_name: &str, instance_name: &str) -> String {
    format!("{}/{}", app_name, instance_name)
}

/// Split `[scheme://]host:port` into its host and port
fn split_host_port(endpoint: &str) -> Result<(String, u16), ValidationError> {
    let address = endpoint
        .split_once("//")
        .map_or(endpoint, |(_, rest)| rest)
        .trim_end_matches('/');

    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| ValidationError::InvalidEndpoint(format!("{} has no port", endpoint)))?;

    if host.is_empty() {
        return Err(ValidationError::InvalidEndpoint(format!(
            "{} has no host",
            endpoint
        )));
    }

    let port = port
        .parse::<u16>()
        .map_err(|e| ValidationError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

    Ok((host.to_string(), port))
}
