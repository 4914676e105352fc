//! Webhook fan-out with bounded retry
//!
//! Every publish call takes the next sequence number and spawns one task per
//! matching subscriber. A task POSTs the envelope until it gets a 200 or the
//! subscriber's retry budget runs out, in which case the subscription is
//! removed from the registry. Publishers never see delivery outcomes.

use crate::{HookError, HookResult, SubscriptionRegistry};
use appmgr_types::{AppSnapshot, EventType, NotificationEnvelope, Subscription};
use futures::future::join_all;
use reqwest::{header, Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Timeout for a single webhook POST
    pub request_timeout: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}

pub struct DeliveryEngine {
    registry: Arc<SubscriptionRegistry>,
    client: Client,
    sequence: AtomicU64,
}

impl DeliveryEngine {
    pub fn new(registry: Arc<SubscriptionRegistry>, config: DeliveryConfig) -> HookResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| HookError::Delivery(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(registry, client))
    }

    pub fn with_client(registry: Arc<SubscriptionRegistry>, client: Client) -> Self {
        Self {
            registry,
            client,
            sequence: AtomicU64::new(0),
        }
    }

    /// Sequence number of the most recent publish call
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Publish a single app snapshot.
    pub fn publish(&self, payload: AppSnapshot, event: EventType) -> Option<Dispatch> {
        self.notify_all(vec![payload], event)
    }

    /// Fan `payloads` out to every subscriber accepting `event`.
    ///
    /// Returns immediately. `None` means nothing was dispatched: no payloads or
    /// no subscriptions at all. The returned [`Dispatch`] can be dropped.
    pub fn notify_all(&self, payloads: Vec<AppSnapshot>, event: EventType) -> Option<Dispatch> {
        if payloads.is_empty() {
            debug!(event_type = %event, "Nothing to publish");
            return None;
        }
        if self.registry.is_empty() {
            debug!(event_type = %event, "No subscriptions, skipping publish");
            return None;
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let subscribers = self.registry.subscribers_for(event);

        info!(
            event_type = %event,
            sequence,
            subscribers = subscribers.len(),
            "Publishing lifecycle event"
        );

        let deliveries = subscribers
            .into_iter()
            .filter_map(|subscription| {
                let envelope = NotificationEnvelope {
                    id: subscription.id.clone(),
                    version: sequence,
                    event_type: event,
                    payload: payloads.clone(),
                };

                let body = match envelope.to_body() {
                    Ok(body) => body,
                    Err(e) => {
                        error!(subscription_id = %subscription.id, error = %e, "Failed to encode notification");
                        return None;
                    }
                };

                let registry = self.registry.clone();
                let client = self.client.clone();
                Some(tokio::spawn(deliver(registry, client, subscription, body)))
            })
            .collect();

        Some(Dispatch {
            sequence,
            deliveries,
        })
    }
}

/// Handle to the delivery tasks of one publish call.
///
/// Dropping it detaches the tasks.
#[derive(Debug)]
pub struct Dispatch {
    sequence: u64,
    deliveries: Vec<JoinHandle<()>>,
}

impl Dispatch {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Number of delivery tasks started
    pub fn deliveries(&self) -> usize {
        self.deliveries.len()
    }

    /// Wait until every delivery task has finished, successfully or not.
    pub async fn settled(self) {
        for result in join_all(self.deliveries).await {
            if let Err(e) = result {
                error!(error = %e, "Delivery task aborted");
            }
        }
    }
}

/// Deliver one envelope, retrying until success or budget exhaustion.
async fn deliver(
    registry: Arc<SubscriptionRegistry>,
    client: Client,
    subscription: Subscription,
    body: Vec<u8>,
) {
    let mut remaining = subscription.max_retries;
    let mut attempt: u64 = 1;

    loop {
        match post(&client, &subscription.target_url, &body).await {
            Ok(()) => {
                debug!(
                    subscription_id = %subscription.id,
                    target_url = %subscription.target_url,
                    attempt,
                    "Notification delivered"
                );
                return;
            }
            Err(e) => {
                remaining = remaining.saturating_sub(1);
                warn!(
                    subscription_id = %subscription.id,
                    target_url = %subscription.target_url,
                    attempt,
                    remaining,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }

        if remaining <= 0 {
            break;
        }

        debug!(
            subscription_id = %subscription.id,
            retry_in_secs = subscription.retry_timer,
            "Scheduling delivery retry"
        );
        tokio::time::sleep(subscription.retry_delay()).await;
        attempt += 1;
    }

    warn!(
        subscription_id = %subscription.id,
        target_url = %subscription.target_url,
        attempts = attempt,
        "Retries exhausted, removing subscription"
    );
    registry.remove(&subscription.id).await;
}

async fn post(client: &Client, target_url: &str, body: &[u8]) -> HookResult<()> {
    let response = client
        .post(target_url)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.to_vec())
        .send()
        .await
        .map_err(|e| HookError::Delivery(e.to_string()))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(HookError::Delivery(format!("unexpected status {}", status)));
    }
    Ok(())
}
