//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health/alive", get(handlers::health_alive))
        .route("/health/ready", get(handlers::health_ready))
        // Subscriptions
        .route(
            "/subscriptions",
            get(handlers::list_subscriptions).post(handlers::create_subscription),
        )
        .route(
            "/subscriptions/:id",
            get(handlers::get_subscription)
                .put(handlers::modify_subscription)
                .delete(handlers::delete_subscription),
        )
        // Apps
        .route("/xapps", get(handlers::list_apps).post(handlers::install_app))
        .route(
            "/xapps/:name",
            get(handlers::get_app).delete(handlers::delete_app),
        )
        // Registration
        .route("/register", post(handlers::register_app))
        .route("/deregister", post(handlers::deregister_app))
        .route("/registered", get(handlers::list_registered));

    let router = Router::new()
        .nest("/ric/v1", api_routes)
        .layer(TraceLayer::new_for_http());

    let router = if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{AppLifecycle, InMemoryPackageManager};
    use crate::registration::AppRegistrations;
    use appmgr_hooks::{AppEndpointDirectory, DeliveryConfig, DeliveryEngine, SubscriptionRegistry};
    use appmgr_store::{InMemoryBackend, NamespacedStore};
    use appmgr_types::{SubscriptionId, SubscriptionResponse};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state(backend: InMemoryBackend) -> AppState {
        let store = NamespacedStore::new(Arc::new(backend));
        let registry = Arc::new(SubscriptionRegistry::new(store.clone(), "appmgr"));
        let delivery = Arc::new(
            DeliveryEngine::new(registry.clone(), DeliveryConfig::default()).unwrap(),
        );
        let lifecycle = Arc::new(AppLifecycle::new(
            Arc::new(InMemoryPackageManager::new()),
            delivery.clone(),
        ));
        let registrations = Arc::new(AppRegistrations::new(
            AppEndpointDirectory::new(store.clone(), "appdb"),
            delivery,
        ));
        AppState::new(registry, lifecycle, registrations, store, "appmgr")
    }

    fn test_router() -> Router {
        create_router(test_state(InMemoryBackend::new()), true)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let resp = app.clone().oneshot(request).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn subscription_body(url: &str) -> Value {
        json!({
            "targetUrl": url,
            "eventType": "created",
            "maxRetries": 2,
            "retryTimer": 1
        })
    }

    #[tokio::test]
    async fn alive_returns_200() {
        let app = test_router();
        let (status, json) = send(&app, "GET", "/ric/v1/health/alive", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "alive");
    }

    #[tokio::test]
    async fn ready_reflects_store_connectivity() {
        let backend = InMemoryBackend::new();
        let app = create_router(test_state(backend.clone()), false);

        let (status, _) = send(&app, "GET", "/ric/v1/health/ready", None).await;
        assert_eq!(status, StatusCode::OK);

        backend.set_offline(true);
        let (status, json) = send(&app, "GET", "/ric/v1/health/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["code"], "UNAVAILABLE");
    }

    #[tokio::test]
    async fn subscription_crud() {
        let app = test_router();

        let (status, created) = send(
            &app,
            "POST",
            "/ric/v1/subscriptions",
            Some(subscription_body("http://h/hook")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: SubscriptionResponse = serde_json::from_value(created).unwrap();
        assert_eq!(created.version, 0);

        let (_, again) = send(
            &app,
            "POST",
            "/ric/v1/subscriptions",
            Some(subscription_body("http://h/hook")),
        )
        .await;
        assert_eq!(again["id"], created.id.as_str());

        let uri = format!("/ric/v1/subscriptions/{}", created.id);
        let (status, fetched) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["targetUrl"], "http://h/hook");

        let (status, modified) = send(
            &app,
            "PUT",
            &uri,
            Some(json!({
                "targetUrl": "http://h/other",
                "eventType": "deleted",
                "maxRetries": 1,
                "retryTimer": 0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(modified["id"], created.id.as_str());
        assert_eq!(modified["eventType"], "deleted");

        let (_, all) = send(&app, "GET", "/ric/v1/subscriptions", None).await;
        assert_eq!(all.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn modify_onto_existing_target_is_409() {
        let app = test_router();

        let (_, first) = send(
            &app,
            "POST",
            "/ric/v1/subscriptions",
            Some(subscription_body("http://h/one")),
        )
        .await;
        let (_, second) = send(
            &app,
            "POST",
            "/ric/v1/subscriptions",
            Some(subscription_body("http://h/two")),
        )
        .await;

        let uri = format!("/ric/v1/subscriptions/{}", second["id"].as_str().unwrap());
        let (status, body) = send(&app, "PUT", &uri, Some(subscription_body("http://h/one"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (_, fetched) = send(&app, "GET", &uri, None).await;
        assert_eq!(fetched["targetUrl"], "http://h/two");
        assert_ne!(first["id"], second["id"]);
    }

    #[tokio::test]
    async fn unknown_subscription_is_404() {
        let app = test_router();
        let uri = format!("/ric/v1/subscriptions/{}", SubscriptionId::generate());

        let (status, _) = send(&app, "PUT", &uri, Some(subscription_body("http://h/x"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_subscription_is_400() {
        let app = test_router();

        let (status, body) = send(
            &app,
            "POST",
            "/ric/v1/subscriptions",
            Some(json!({"targetUrl": "http://h/hook"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");

        let (status, body) = send(
            &app,
            "POST",
            "/ric/v1/subscriptions",
            Some(subscription_body("ftp://h/hook")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (_, all) = send(&app, "GET", "/ric/v1/subscriptions", None).await;
        assert!(all.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn app_install_and_delete() {
        let app = test_router();

        let (status, installed) = send(
            &app,
            "POST",
            "/ric/v1/xapps",
            Some(json!({"appName": "dummy-xapp", "version": "1.0.0"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(installed["status"], "deployed");

        let (status, _) = send(
            &app,
            "POST",
            "/ric/v1/xapps",
            Some(json!({"appName": "dummy-xapp"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, fetched) = send(&app, "GET", "/ric/v1/xapps/dummy-xapp", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "dummy-xapp");

        let (status, _) = send(&app, "DELETE", "/ric/v1/xapps/dummy-xapp", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", "/ric/v1/xapps/dummy-xapp", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, all) = send(&app, "GET", "/ric/v1/xapps", None).await;
        assert!(all.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn register_and_deregister() {
        let app = test_router();
        let registration = json!({
            "appName": "dummy-xapp",
            "appVersion": "1.0.0",
            "appInstanceName": "dummy-xapp-0",
            "httpEndpoint": "http://10.0.0.5:8080",
            "rmrEndpoint": "10.0.0.5:4560",
            "config": "{\"debug\": true}"
        });

        let (status, endpoint) = send(&app, "POST", "/ric/v1/register", Some(registration)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(endpoint.get("config").is_none());

        let (_, registered) = send(&app, "GET", "/ric/v1/registered", None).await;
        assert_eq!(registered.as_array().unwrap().len(), 1);

        let deregistration = json!({"appName": "dummy-xapp", "appInstanceName": "dummy-xapp-0"});
        let (status, _) = send(
            &app,
            "POST",
            "/ric/v1/deregister",
            Some(deregistration.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "POST", "/ric/v1/deregister", Some(deregistration)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
