//! Package-manager seam and the lifecycle facade that publishes events

use appmgr_hooks::DeliveryEngine;
use appmgr_types::{AppDescriptor, AppInstance, AppSnapshot, AppStatus, EventType, ValidationError};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors reported by a package-manager driver
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("App not found: {0}")]
    NotFound(String),

    #[error("App already installed: {0}")]
    AlreadyInstalled(String),

    #[error("Invalid descriptor: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Package manager failure: {0}")]
    Failed(String),
}

/// Installs, inspects and removes apps in the cluster
#[async_trait]
pub trait PackageManager: Send + Sync {
    async fn install(&self, descriptor: &AppDescriptor) -> Result<AppSnapshot, DriverError>;

    async fn status(&self, name: &str) -> Result<AppSnapshot, DriverError>;

    async fn status_all(&self) -> Result<Vec<AppSnapshot>, DriverError>;

    async fn delete(&self, name: &str) -> Result<AppSnapshot, DriverError>;
}

/// Development driver keeping installed apps in memory
#[derive(Debug, Default)]
pub struct InMemoryPackageManager {
    apps: DashMap<String, AppSnapshot>,
}

impl InMemoryPackageManager {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PackageManager for InMemoryPackageManager {
    async fn install(&self, descriptor: &AppDescriptor) -> Result<AppSnapshot, DriverError> {
        descriptor.validate()?;

        match self.apps.entry(descriptor.app_name.clone()) {
            Entry::Occupied(_) => Err(DriverError::AlreadyInstalled(descriptor.app_name.clone())),
            Entry::Vacant(slot) => {
                let namespace = descriptor.namespace.as_deref().unwrap_or("ricxapp");
                let snapshot = AppSnapshot {
                    name: descriptor.app_name.clone(),
                    status: AppStatus::Deployed,
                    version: descriptor.version.clone(),
                    instances: vec![AppInstance {
                        name: format!("{}-{}-0", namespace, descriptor.app_name),
                        status: "running".to_string(),
                        ip: None,
                        port: None,
                        tx_messages: Vec::new(),
                        rx_messages: Vec::new(),
                    }],
                };
                slot.insert(snapshot.clone());
                Ok(snapshot)
            }
        }
    }

    async fn status(&self, name: &str) -> Result<AppSnapshot, DriverError> {
        self.apps
            .get(name)
            .map(|app| app.clone())
            .ok_or_else(|| DriverError::NotFound(name.to_string()))
    }

    async fn status_all(&self) -> Result<Vec<AppSnapshot>, DriverError> {
        let mut apps: Vec<AppSnapshot> = self.apps.iter().map(|a| a.value().clone()).collect();
        apps.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(apps)
    }

    async fn delete(&self, name: &str) -> Result<AppSnapshot, DriverError> {
        let (_, mut snapshot) = self
            .apps
            .remove(name)
            .ok_or_else(|| DriverError::NotFound(name.to_string()))?;
        snapshot.status = AppStatus::Deleted;
        for instance in &mut snapshot.instances {
            instance.status = "deleted".to_string();
        }
        Ok(snapshot)
    }
}

/// Drives the package manager and publishes the resulting lifecycle events
pub struct AppLifecycle {
    driver: Arc<dyn PackageManager>,
    delivery: Arc<DeliveryEngine>,
}

impl AppLifecycle {
    pub fn new(driver: Arc<dyn PackageManager>, delivery: Arc<DeliveryEngine>) -> Self {
        Self { driver, delivery }
    }

    /// Install an app and publish `created`
    pub async fn install(&self, descriptor: &AppDescriptor) -> Result<AppSnapshot, DriverError> {
        let snapshot = self.driver.install(descriptor).await?;
        info!(app = %snapshot.name, "App installed");
        self.delivery.publish(snapshot.clone(), EventType::Created);
        Ok(snapshot)
    }

    pub async fn status(&self, name: &str) -> Result<AppSnapshot, DriverError> {
        self.driver.status(name).await
    }

    pub async fn status_all(&self) -> Result<Vec<AppSnapshot>, DriverError> {
        self.driver.status_all().await
    }

    /// Delete an app and publish `deleted`
    pub async fn delete(&self, name: &str) -> Result<AppSnapshot, DriverError> {
        let snapshot = self.driver.delete(name).await?;
        info!(app = %name, "App deleted");
        self.delivery.publish(snapshot.clone(), EventType::Deleted);
        Ok(snapshot)
    }
}
