//! End-to-end delivery against live webhook endpoints

use appmgr_hooks::{DeliveryConfig, DeliveryEngine, SubscriptionRegistry};
use appmgr_store::{InMemoryBackend, NamespacedStore};
use appmgr_types::{AppSnapshot, AppStatus, EventType, SubscriptionRequest};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NS: &str = "appmgr";

fn engine_over(store: NamespacedStore) -> DeliveryEngine {
    let registry = Arc::new(SubscriptionRegistry::new(store, NS));
    DeliveryEngine::new(registry, DeliveryConfig::default()).unwrap()
}

fn snapshot() -> AppSnapshot {
    AppSnapshot::new("dummy-xapp", AppStatus::Deployed)
}

#[tokio::test]
async fn failing_subscriber_is_removed_after_retry_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let engine = engine_over(NamespacedStore::in_memory());
    let url = format!("{}/hook", server.uri());

    let first = engine
        .registry()
        .add(SubscriptionRequest::new(&url, EventType::Created, 2, 1))
        .await
        .unwrap();
    assert_eq!(first.version, 0);
    assert_eq!(first.event_type, EventType::Created);

    let again = engine
        .registry()
        .add(SubscriptionRequest::new(&url, EventType::Created, 2, 1))
        .await
        .unwrap();
    assert_eq!(again.id, first.id);

    let started = Instant::now();
    let dispatch = engine.publish(snapshot(), EventType::Created).unwrap();
    assert_eq!(dispatch.deliveries(), 1);
    dispatch.settled().await;

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(engine.registry().get_all().is_empty());
    server.verify().await;
}

#[tokio::test]
async fn exhausted_budget_makes_exactly_that_many_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let store = NamespacedStore::in_memory();
    let engine = engine_over(store.clone());
    let sub = engine
        .registry()
        .add(SubscriptionRequest::new(server.uri(), EventType::All, 4, 0))
        .await
        .unwrap();

    engine
        .publish(snapshot(), EventType::Deployed)
        .unwrap()
        .settled()
        .await;

    assert!(engine.registry().get(&sub.id).is_none());
    assert!(store.get_all(NS).await.unwrap().is_empty());
    server.verify().await;
}

#[tokio::test]
async fn zero_budget_still_gets_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_over(NamespacedStore::in_memory());
    engine
        .registry()
        .add(SubscriptionRequest::new(server.uri(), EventType::Created, 0, 0))
        .await
        .unwrap();

    engine
        .publish(snapshot(), EventType::Created)
        .unwrap()
        .settled()
        .await;

    assert!(engine.registry().is_empty());
    server.verify().await;
}

#[tokio::test]
async fn successful_delivery_keeps_subscription_and_sends_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_over(NamespacedStore::in_memory());
    let url = format!("{}/hook", server.uri());
    let sub = engine
        .registry()
        .add(SubscriptionRequest::new(&url, EventType::Created, 2, 1))
        .await
        .unwrap();
    let before = engine.registry().get(&sub.id).unwrap();

    let dispatch = engine.publish(snapshot(), EventType::Created).unwrap();
    let sequence = dispatch.sequence();
    dispatch.settled().await;

    assert_eq!(engine.registry().get(&sub.id), Some(before));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let envelope = &body.as_array().unwrap()[0];
    assert_eq!(envelope["id"], sub.id.as_str());
    assert_eq!(envelope["version"], sequence);
    assert_eq!(envelope["eventType"], "created");
    assert_eq!(envelope["xapp"][0]["name"], "dummy-xapp");
}

#[tokio::test]
async fn unreachable_subscriber_counts_as_failure() {
    let engine = engine_over(NamespacedStore::in_memory());
    engine
        .registry()
        .add(SubscriptionRequest::new("http://127.0.0.1:1/hook", EventType::Created, 1, 0))
        .await
        .unwrap();

    engine
        .publish(snapshot(), EventType::Created)
        .unwrap()
        .settled()
        .await;

    assert!(engine.registry().is_empty());
}

#[tokio::test]
async fn only_matching_subscribers_are_notified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/created"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/deleted"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let engine = engine_over(NamespacedStore::in_memory());
    for (suffix, event) in [("created", EventType::Created), ("deleted", EventType::Deleted)] {
        engine
            .registry()
            .add(SubscriptionRequest::new(
                format!("{}/{}", server.uri(), suffix),
                event,
                1,
                0,
            ))
            .await
            .unwrap();
    }

    let dispatch = engine.publish(snapshot(), EventType::Created).unwrap();
    assert_eq!(dispatch.deliveries(), 1);
    dispatch.settled().await;

    assert_eq!(engine.registry().len(), 2);
    server.verify().await;
}

#[tokio::test]
async fn registry_restores_from_store() {
    let backend = InMemoryBackend::new();
    let store = NamespacedStore::new(Arc::new(backend.clone()));

    let registry = SubscriptionRegistry::new(store.clone(), NS);
    for (url, event) in [
        ("http://h/a", EventType::Created),
        ("http://h/b", EventType::Deleted),
        ("https://h/c", EventType::All),
    ] {
        registry
            .add(SubscriptionRequest::new(url, event, 3, 2))
            .await
            .unwrap();
    }
    let before = registry.get_all();
    drop(registry);

    let rebuilt = SubscriptionRegistry::restore(store, NS).await;
    assert_eq!(rebuilt.get_all(), before);
}

#[tokio::test]
async fn unreachable_store_restores_empty() {
    let backend = InMemoryBackend::new();
    let store = NamespacedStore::new(Arc::new(backend.clone()));
    SubscriptionRegistry::new(store.clone(), NS)
        .add(SubscriptionRequest::new("http://h/a", EventType::Created, 1, 1))
        .await
        .unwrap();

    backend.set_offline(true);
    let rebuilt = SubscriptionRegistry::restore(store, NS).await;
    assert!(rebuilt.is_empty());
}
