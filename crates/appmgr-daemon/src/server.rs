//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::{DaemonConfig, StoreBackend};
use crate::error::{DaemonError, DaemonResult};
use crate::lifecycle::{AppLifecycle, InMemoryPackageManager};
use crate::registration::AppRegistrations;
use appmgr_hooks::{AppEndpointDirectory, DeliveryConfig, DeliveryEngine, SubscriptionRegistry};
use appmgr_store::{InMemoryBackend, KeyValueBackend, NamespacedStore};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// App Manager daemon server
pub struct Server {
    config: DaemonConfig,
    state: AppState,
}

impl Server {
    /// Connect to the store, restore state and build the API.
    ///
    /// Blocks until the key-value store answers.
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let backend = open_backend(&config.store.backend)?;
        let store = NamespacedStore::new(backend);
        let namespaces = &config.namespaces;

        store
            .wait_until_ready(&namespaces.subscriptions, config.store.probe_interval())
            .await;

        let registry = Arc::new(
            SubscriptionRegistry::restore(store.clone(), namespaces.subscriptions.clone()).await,
        );

        let delivery = Arc::new(DeliveryEngine::new(
            registry.clone(),
            DeliveryConfig {
                request_timeout: Duration::from_secs(config.delivery.request_timeout_secs),
            },
        )?);

        let registrations = Arc::new(AppRegistrations::new(
            AppEndpointDirectory::new(store.clone(), namespaces.endpoints.clone()),
            delivery.clone(),
        ));
        match registrations.load().await {
            Ok(count) => tracing::info!(count, "Registered app instances restored"),
            Err(e) => tracing::error!(error = %e, "Failed to restore registered app instances"),
        }

        let lifecycle = Arc::new(AppLifecycle::new(
            Arc::new(InMemoryPackageManager::new()),
            delivery,
        ));

        let state = AppState::new(
            registry,
            lifecycle,
            registrations,
            store,
            namespaces.subscriptions.clone(),
        );

        Ok(Self { config, state })
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone(), self.config.server.enable_cors)
    }

    /// Run the server until Ctrl+C or SIGTERM
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let app = self.router();

        let listener = TcpListener::bind(addr).await?;

        tracing::info!("App manager listening on {}", addr);
        tracing::info!(
            subscriptions = self.state.registry.len(),
            "Subscription registry ready"
        );

        // In-flight deliveries are not awaited on shutdown.
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("App manager shutting down");
        Ok(())
    }
}

fn open_backend(backend: &StoreBackend) -> DaemonResult<Arc<dyn KeyValueBackend>> {
    match backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; subscriptions will not survive a restart");
            Ok(Arc::new(InMemoryBackend::new()))
        }
        #[cfg(feature = "redis")]
        StoreBackend::Redis { url } => {
            tracing::info!(url = %url, "Using redis store");
            Ok(Arc::new(appmgr_store::RedisBackend::open(url)?))
        }
        #[cfg(not(feature = "redis"))]
        StoreBackend::Redis { .. } => Err(DaemonError::Config(
            "redis store requested but appmgrd was built without the `redis` feature".to_string(),
        )),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
