//! App instance registration
//!
//! Running instances announce themselves with a [`RegisterRequest`]. The
//! daemon keeps a local view of registered instances, persists their
//! endpoints through the [`AppEndpointDirectory`] and publishes `deployed` /
//! `undeployed` events. App configuration carried in a registration is never
//! persisted.

use appmgr_hooks::{AppEndpointDirectory, DeliveryEngine, HookResult};
use appmgr_types::{AppEndpoint, AppStatus, DeregisterRequest, EventType, RegisterRequest};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

pub struct AppRegistrations {
    directory: AppEndpointDirectory,
    delivery: Arc<DeliveryEngine>,
    registered: DashMap<String, AppEndpoint>,
}

impl AppRegistrations {
    pub fn new(directory: AppEndpointDirectory, delivery: Arc<DeliveryEngine>) -> Self {
        Self {
            directory,
            delivery,
            registered: DashMap::new(),
        }
    }

    /// Repopulate the local view from the directory; returns the number loaded.
    pub async fn load(&self) -> HookResult<usize> {
        let endpoints = self.directory.list_recorded().await?;
        let count = endpoints.len();
        for endpoint in endpoints {
            self.registered.insert(endpoint.key(), endpoint);
        }
        Ok(count)
    }

    pub async fn register(&self, request: RegisterRequest) -> HookResult<AppEndpoint> {
        request.validate()?;

        let endpoint = request.endpoint();
        self.directory.record(&endpoint).await?;
        self.registered.insert(endpoint.key(), endpoint.clone());

        info!(
            app = %endpoint.app_name,
            instance = %endpoint.app_instance_name,
            "App instance registered"
        );
        self.delivery.publish(
            endpoint.to_snapshot(AppStatus::Deployed, "deployed"),
            EventType::Deployed,
        );
        Ok(endpoint)
    }

    /// `None` if the instance was never registered.
    ///
    /// The local view only drops the instance once the directory has forgotten
    /// it, so a failed deregistration can be retried.
    pub async fn deregister(&self, request: &DeregisterRequest) -> HookResult<Option<AppEndpoint>> {
        let key = request.key();
        if !self.registered.contains_key(&key) {
            return Ok(None);
        }

        self.directory
            .forget(&request.app_name, &request.app_instance_name)
            .await?;

        let Some((_, endpoint)) = self.registered.remove(&key) else {
            return Ok(None);
        };

        info!(
            app = %endpoint.app_name,
            instance = %endpoint.app_instance_name,
            "App instance deregistered"
        );
        self.delivery.publish(
            endpoint.to_snapshot(AppStatus::Deleted, "undeployed"),
            EventType::Undeployed,
        );
        Ok(Some(endpoint))
    }

    /// Registered instances, ordered by key
    pub fn list(&self) -> Vec<AppEndpoint> {
        let mut endpoints: Vec<AppEndpoint> =
            self.registered.iter().map(|e| e.value().clone()).collect();
        endpoints.sort_by_key(|e| e.key());
        endpoints
    }
}
