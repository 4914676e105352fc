//! Namespace isolation over a shared [`KeyValueBackend`]

use crate::{InMemoryBackend, KeyValueBackend, KeyValueBatch, StoreResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Physical key prefix for a namespace: `{namespace},`
///
/// The braces form a hash tag, so a cluster backend places every record of a
/// namespace in the same slot.
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{{{}}},", namespace)
}

fn namespaced_key(namespace: &str, key: &str) -> String {
    format!("{}{}", namespace_prefix(namespace), key)
}

/// Client handing each subsystem its own key space on one physical store.
///
/// Callers only ever see bare keys: keys are prefixed on the way in and
/// stripped on the way out.
#[derive(Clone)]
pub struct NamespacedStore {
    backend: Arc<dyn KeyValueBackend>,
}

impl std::fmt::Debug for NamespacedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespacedStore").finish_non_exhaustive()
    }
}

impl NamespacedStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    /// Store over a fresh [`InMemoryBackend`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBackend::new()))
    }

    /// Write every pair of `batch` in one round trip.
    pub async fn set(&self, namespace: &str, batch: impl Into<KeyValueBatch>) -> StoreResult<()> {
        let batch = batch.into();
        if batch.is_empty() {
            return Ok(());
        }

        let pairs: Vec<(String, String)> = batch
            .into_pairs()
            .into_iter()
            .map(|(k, v)| (namespaced_key(namespace, &k), v))
            .collect();

        debug!(namespace, count = pairs.len(), "Writing keys");
        self.backend.mset(&pairs).await
    }

    /// Read `keys`; the result is keyed by bare key, with `None` for keys not present.
    pub async fn get(
        &self,
        namespace: &str,
        keys: &[String],
    ) -> StoreResult<HashMap<String, Option<String>>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let physical: Vec<String> = keys.iter().map(|k| namespaced_key(namespace, k)).collect();
        let values = self.backend.mget(&physical).await?;

        Ok(keys.iter().cloned().zip(values).collect())
    }

    /// Every bare key currently stored under `namespace`, sorted.
    pub async fn get_all(&self, namespace: &str) -> StoreResult<Vec<String>> {
        let prefix = namespace_prefix(namespace);
        let mut keys: Vec<String> = self
            .backend
            .keys_with_prefix(&prefix)
            .await?
            .into_iter()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
            .collect();
        keys.sort();
        Ok(keys)
    }

    pub async fn remove(&self, namespace: &str, keys: &[String]) -> StoreResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let physical: Vec<String> = keys.iter().map(|k| namespaced_key(namespace, k)).collect();
        self.backend.del(&physical).await
    }

    pub async fn remove_all(&self, namespace: &str) -> StoreResult<()> {
        let keys = self.get_all(namespace).await?;
        self.remove(namespace, &keys).await
    }

    /// Block until a listing of `namespace` succeeds, retrying on a fixed delay.
    pub async fn wait_until_ready(&self, namespace: &str, interval: Duration) {
        let mut attempt: u64 = 1;
        loop {
            match self.get_all(namespace).await {
                Ok(keys) => {
                    info!(namespace, keys = keys.len(), attempt, "Key-value store reachable");
                    return;
                }
                Err(e) => {
                    warn!(
                        namespace,
                        attempt,
                        error = %e,
                        retry_in_secs = interval.as_secs(),
                        "Key-value store not ready, retrying"
                    );
                }
            }
            attempt += 1;
            tokio::time::sleep(interval).await;
        }
    }
}
