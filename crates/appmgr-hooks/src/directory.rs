//! Registered app endpoints, persisted under their own namespace

use crate::HookResult;
use appmgr_store::NamespacedStore;
use appmgr_types::{app::endpoint_key, AppEndpoint};
use tracing::{debug, info, warn};

/// Remembers where each registered app instance can be reached.
///
/// Records are keyed `<appName>/<appInstanceName>`.
#[derive(Debug, Clone)]
pub struct AppEndpointDirectory {
    store: NamespacedStore,
    namespace: String,
}

impl AppEndpointDirectory {
    pub fn new(store: NamespacedStore, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub async fn record(&self, endpoint: &AppEndpoint) -> HookResult<()> {
        let key = endpoint.key();
        let value = serde_json::to_string(endpoint)?;
        self.store.set(&self.namespace, [(key.as_str(), value)]).await?;
        debug!(key = %key, "App endpoint recorded");
        Ok(())
    }

    pub async fn forget(&self, app_name: &str, instance_name: &str) -> HookResult<()> {
        let key = endpoint_key(app_name, instance_name);
        self.store.remove(&self.namespace, &[key.clone()]).await?;
        debug!(key = %key, "App endpoint forgotten");
        Ok(())
    }

    /// Every recorded endpoint; undecodable records are skipped.
    pub async fn list_recorded(&self) -> HookResult<Vec<AppEndpoint>> {
        let keys = self.store.get_all(&self.namespace).await?;
        let records = self.store.get(&self.namespace, &keys).await?;

        let mut endpoints = Vec::with_capacity(records.len());
        for key in &keys {
            let Some(Some(value)) = records.get(key) else {
                continue;
            };
            match serde_json::from_str::<AppEndpoint>(value) {
                Ok(endpoint) => endpoints.push(endpoint),
                Err(e) => warn!(key = %key, error = %e, "Skipping malformed app endpoint record"),
            }
        }

        info!(namespace = %self.namespace, count = endpoints.len(), "App endpoints loaded");
        Ok(endpoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HookError;
    use appmgr_store::InMemoryBackend;
    use std::sync::Arc;

    fn endpoint(instance: &str) -> AppEndpoint {
        AppEndpoint {
            app_name: "dummy-xapp".into(),
            app_version: "1.0.0".into(),
            app_instance_name: instance.into(),
            http_endpoint: "http://10.0.0.5:8080".into(),
            rmr_endpoint: "10.0.0.5:4560".into(),
        }
    }

    #[tokio::test]
    async fn record_list_forget() {
        let directory = AppEndpointDirectory::new(NamespacedStore::in_memory(), "appdb");
        directory.record(&endpoint("inst-0")).await.unwrap();
        directory.record(&endpoint("inst-1")).await.unwrap();
        directory.record(&endpoint("inst-1")).await.unwrap();

        let recorded = directory.list_recorded().await.unwrap();
        assert_eq!(recorded, vec![endpoint("inst-0"), endpoint("inst-1")]);

        directory.forget("dummy-xapp", "inst-0").await.unwrap();
        assert_eq!(directory.list_recorded().await.unwrap(), vec![endpoint("inst-1")]);
    }

    #[tokio::test]
    async fn does_not_see_other_namespaces() {
        let store = NamespacedStore::in_memory();
        store.set("appmgr", [("x", "{}")]).await.unwrap();

        let directory = AppEndpointDirectory::new(store.clone(), "appdb");
        directory.record(&endpoint("inst-0")).await.unwrap();
        store.set("appdb", [("broken/0", "not json")]).await.unwrap();

        assert_eq!(directory.list_recorded().await.unwrap(), vec![endpoint("inst-0")]);
    }

    #[tokio::test]
    async fn store_failures_are_reported() {
        let backend = InMemoryBackend::new();
        backend.set_offline(true);
        let directory =
            AppEndpointDirectory::new(NamespacedStore::new(Arc::new(backend)), "appdb");

        let err = directory.record(&endpoint("inst-0")).await.unwrap_err();
        assert!(matches!(err, HookError::Store(_)));
    }
}
