//! In-memory key-value backend for development and testing

use crate::{KeyValueBackend, StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Process-local backend.
///
/// Clones share the same underlying map, so a test can keep a handle while a
/// registry owns another. [`set_offline`](Self::set_offline) makes every
/// command fail with [`StoreError::Connection`] until switched back.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing (or regaining) connectivity
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of physical keys across all namespaces
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("in-memory backend is offline".into()));
        }
        Ok(())
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Backend(format!("lock poisoned: {}", e))
}

#[async_trait]
impl KeyValueBackend for InMemoryBackend {
    async fn mset(&self, pairs: &[(String, String)]) -> StoreResult<()> {
        self.check_online()?;
        let mut entries = self.entries.write().map_err(poisoned)?;
        for (key, value) in pairs {
            entries.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        self.check_online()?;
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(keys.iter().map(|k| entries.get(k).cloned()).collect())
    }

    async fn del(&self, keys: &[String]) -> StoreResult<()> {
        self.check_online()?;
        let mut entries = self.entries.write().map_err(poisoned)?;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.check_online()?;
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
