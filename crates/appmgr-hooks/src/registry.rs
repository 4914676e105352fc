//! Durable subscription registry
//!
//! Subscriptions live in a sharded [`DashMap`] and are written through to the
//! store as a full snapshot on every mutation. Deleting a subscription also
//! removes its record, so a restart never brings it back. A record delete that
//! fails stays pending and is retried by every later snapshot until it lands.
//!
//! Two locks exist besides the map shards:
//! - `admission` covers the duplicate scan and write of [`add`](SubscriptionRegistry::add)
//!   and [`modify`](SubscriptionRegistry::modify), and is never held across I/O
//! - `persist` serializes snapshot writes so the newest snapshot is always written last,
//!   and guards the pending record deletes

use crate::{HookError, HookResult};
use appmgr_store::{KeyValueBatch, NamespacedStore};
use appmgr_types::{
    EventType, Subscription, SubscriptionId, SubscriptionRequest, SubscriptionResponse,
};
use dashmap::DashMap;
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub struct SubscriptionRegistry {
    subscriptions: DashMap<SubscriptionId, Subscription>,
    admission: Mutex<()>,
    /// Ids whose record delete has not reached the store yet
    persist: Mutex<HashSet<SubscriptionId>>,
    store: NamespacedStore,
    namespace: String,
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("namespace", &self.namespace)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl SubscriptionRegistry {
    /// Empty registry persisting under `namespace`
    pub fn new(store: NamespacedStore, namespace: impl Into<String>) -> Self {
        Self {
            subscriptions: DashMap::new(),
            admission: Mutex::new(()),
            persist: Mutex::new(HashSet::new()),
            store,
            namespace: namespace.into(),
        }
    }

    /// Rebuild the registry from every record stored under `namespace`.
    ///
    /// A store failure leaves the registry empty; undecodable records are skipped.
    pub async fn restore(store: NamespacedStore, namespace: impl Into<String>) -> Self {
        let registry = Self::new(store, namespace);

        let keys = match registry.store.get_all(&registry.namespace).await {
            Ok(keys) => keys,
            Err(e) => {
                error!(namespace = %registry.namespace, error = %e, "Failed to list subscriptions, starting empty");
                return registry;
            }
        };

        let records = match registry.store.get(&registry.namespace, &keys).await {
            Ok(records) => records,
            Err(e) => {
                error!(namespace = %registry.namespace, error = %e, "Failed to read subscriptions, starting empty");
                return registry;
            }
        };

        for (key, value) in records {
            let Some(value) = value else {
                debug!(key = %key, "Subscription record vanished during restore");
                continue;
            };

            match serde_json::from_str::<Subscription>(&value) {
                Ok(subscription) => {
                    registry
                        .subscriptions
                        .insert(subscription.id.clone(), subscription);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping malformed subscription record");
                }
            }
        }

        info!(
            namespace = %registry.namespace,
            count = registry.subscriptions.len(),
            "Subscriptions restored"
        );
        registry
    }

    /// Register a subscription, or return the existing one for the same
    /// `(target_url, event_type)`.
    pub async fn add(&self, request: SubscriptionRequest) -> HookResult<SubscriptionResponse> {
        request.validate()?;

        let response = {
            let _admission = self.admission.lock().await;

            if let Some(existing) = self
                .subscriptions
                .iter()
                .find(|entry| entry.value().duplicates(&request))
            {
                info!(
                    subscription_id = %existing.id,
                    target_url = %request.target_url,
                    event_type = %request.event_type,
                    "Subscription already exists"
                );
                return Ok(existing.response());
            }

            let subscription = Subscription::from_request(SubscriptionId::generate(), request);
            let response = subscription.response();
            self.subscriptions
                .insert(subscription.id.clone(), subscription);
            response
        };

        info!(subscription_id = %response.id, event_type = %response.event_type, "Subscription added");
        self.persist_snapshot(None).await;
        Ok(response)
    }

    pub fn get(&self, id: &SubscriptionId) -> Option<Subscription> {
        self.subscriptions.get(id).map(|s| s.clone())
    }

    /// Every subscription, ordered by id (creation order)
    pub fn get_all(&self) -> Vec<Subscription> {
        let mut all: Vec<Subscription> = self
            .subscriptions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub async fn delete(&self, id: &SubscriptionId) -> Option<Subscription> {
        let (_, removed) = self.subscriptions.remove(id)?;
        info!(subscription_id = %id, "Subscription deleted");
        self.persist_snapshot(Some(id)).await;
        Some(removed)
    }

    /// Replace target and policy of `id` in place; `None` if unknown.
    ///
    /// Fails with [`HookError::Conflict`] when another subscription already
    /// has the requested `(target_url, event_type)`.
    pub async fn modify(
        &self,
        id: &SubscriptionId,
        request: SubscriptionRequest,
    ) -> HookResult<Option<SubscriptionResponse>> {
        request.validate()?;

        let response = {
            let _admission = self.admission.lock().await;

            if !self.subscriptions.contains_key(id) {
                return Ok(None);
            }

            let conflicting = self
                .subscriptions
                .iter()
                .find(|entry| entry.key() != id && entry.value().duplicates(&request))
                .map(|entry| entry.key().clone());
            if let Some(existing) = conflicting {
                warn!(
                    subscription_id = %id,
                    existing_id = %existing,
                    target_url = %request.target_url,
                    event_type = %request.event_type,
                    "Modification would duplicate an existing subscription"
                );
                return Err(HookError::Conflict(existing));
            }

            match self.subscriptions.get_mut(id) {
                Some(mut entry) => {
                    *entry = Subscription::from_request(id.clone(), request);
                    entry.response()
                }
                None => return Ok(None),
            }
        };

        info!(subscription_id = %id, event_type = %response.event_type, "Subscription modified");
        self.persist_snapshot(None).await;
        Ok(Some(response))
    }

    /// Drop every subscription, in memory and in the store.
    pub async fn flush(&self) -> HookResult<()> {
        let mut pending = self.persist.lock().await;
        self.subscriptions.clear();
        self.store.remove_all(&self.namespace).await?;
        pending.clear();
        info!(namespace = %self.namespace, "Subscriptions flushed");
        Ok(())
    }

    /// Remove `id` if still present. Removing an absent id is not an error.
    pub async fn remove(&self, id: &SubscriptionId) -> bool {
        if self.subscriptions.remove(id).is_none() {
            debug!(subscription_id = %id, "Subscription already gone");
            return false;
        }
        self.persist_snapshot(Some(id)).await;
        true
    }

    /// Subscriptions that want events of type `event`
    pub fn subscribers_for(&self, event: EventType) -> Vec<Subscription> {
        self.subscriptions
            .iter()
            .filter(|entry| entry.event_type.accepts(event))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Write every current record, then delete `removed` and any record
    /// delete still pending from an earlier failure.
    ///
    /// Failures are logged and memory stays authoritative. Failed deletes are
    /// kept and retried on the next snapshot.
    async fn persist_snapshot(&self, removed: Option<&SubscriptionId>) {
        let mut pending = self.persist.lock().await;
        if let Some(id) = removed {
            pending.insert(id.clone());
        }

        let mut batch = KeyValueBatch::with_capacity(self.subscriptions.len());
        for subscription in self.get_all() {
            match serde_json::to_string(&subscription) {
                Ok(record) => {
                    batch.push(subscription.id.as_str(), record);
                }
                Err(e) => {
                    error!(subscription_id = %subscription.id, error = %e, "Failed to encode subscription");
                }
            }
        }

        if let Err(e) = self.store.set(&self.namespace, batch).await {
            error!(namespace = %self.namespace, error = %e, "Failed to persist subscriptions");
        }

        if pending.is_empty() {
            return;
        }

        let keys: Vec<String> = pending.iter().map(|id| id.as_str().to_string()).collect();
        match self.store.remove(&self.namespace, &keys).await {
            Ok(()) => pending.clear(),
            Err(e) => {
                error!(
                    namespace = %self.namespace,
                    pending = keys.len(),
                    error = %e,
                    "Failed to remove subscription records, will retry"
                );
            }
        }
    }
}
