//! appmgrd - App Manager daemon
//!
//! Serves the app lifecycle, registration and subscription REST API and
//! delivers lifecycle events to webhook subscribers.

use appmgr_daemon::config::StoreBackend;
use appmgr_daemon::{DaemonConfig, DaemonError, DaemonResult, Server};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// App Manager daemon CLI
#[derive(Parser)]
#[command(name = "appmgrd")]
#[command(about = "App Manager - lifecycle events and webhook subscriptions", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "APPMGR_CONFIG")]
    config: Option<String>,

    /// Listen address (overrides the configuration file)
    #[arg(short, long, env = "APPMGR_LISTEN_ADDR")]
    listen: Option<String>,

    /// Redis URL; selects the redis store
    #[arg(long, env = "APPMGR_STORE_URL")]
    store_url: Option<String>,

    /// Log level
    #[arg(long, env = "APPMGR_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "APPMGR_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(url) = cli.store_url {
        config.store.backend = StoreBackend::Redis { url };
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen_addr,
        "Starting app manager"
    );

    let server = Server::new(config).await?;
    server.run().await
}
