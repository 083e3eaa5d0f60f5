mod app;
mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use authbridge_auth::{AuthState, BrokerConfig, LocalBackend};
use authbridge_core::auth::PkceStore;
use clap::Parser;
use listenfd::ListenFd;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::create_app;

/// How often expired in-memory PKCE sessions are purged.
#[cfg(not(feature = "redis"))]
const PKCE_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// AuthBridge - Federate Discord and X logins into a single identity backend
#[derive(Parser, Debug)]
#[command(name = "authbridge")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3000", env = "PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "authbridge=debug,authbridge_auth=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BrokerConfig::from_env().context("Failed to load broker configuration")?;
    if config.providers.is_empty() {
        tracing::warn!("No providers configured; set DISCORD_CLIENT_ID or X_CLIENT_ID");
    }

    let signing_secret = config
        .signing_secret
        .as_deref()
        .context("SIGNING_SECRET must be set")?;
    let backend = Arc::new(LocalBackend::new(
        signing_secret.as_bytes(),
        config.credential_ttl,
    ));

    let (pkce, sweeper) = init_pkce_store(&config).await?;

    let state = AuthState::new(&config, pkce, backend)?;
    tracing::info!(providers = ?state.provider_ids(), "Broker configured");

    // Build the application router
    let app = create_app(state);

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        // If we are given a tcp listener on listen fd 0, use that one
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        // Otherwise fall back to CLI-specified host:port
        None => {
            let addr = format!("{}:{}", cli.host, cli.port);
            TcpListener::bind(&addr).await?
        }
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    // Run the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// In-memory PKCE store plus its background sweeper.
#[cfg(not(feature = "redis"))]
async fn init_pkce_store(
    config: &BrokerConfig,
) -> Result<(Arc<dyn PkceStore>, Option<tokio::task::JoinHandle<()>>)> {
    let store = authbridge_auth::MemoryPkceStore::new(config.pkce_ttl);
    let sweeper = store.spawn_sweeper(PKCE_SWEEP_INTERVAL);

    tracing::info!(ttl_secs = config.pkce_ttl.as_secs(), "Using in-memory PKCE store");
    Ok((Arc::new(store), Some(sweeper)))
}

/// Redis PKCE store; key expiry replaces the sweeper.
#[cfg(feature = "redis")]
async fn init_pkce_store(
    config: &BrokerConfig,
) -> Result<(Arc<dyn PkceStore>, Option<tokio::task::JoinHandle<()>>)> {
    use fred::prelude::{Builder, ClientLike, Config};

    let redis_config = Config::from_url(&config.redis_url)?;
    let pool = Builder::from_config(redis_config).build_pool(4)?;
    pool.init().await.context("Failed to connect to Redis")?;

    tracing::info!(
        ttl_secs = config.pkce_ttl.as_secs(),
        "Using Redis PKCE store"
    );
    let store = authbridge_auth::RedisPkceStore::new(pool, config.pkce_ttl);
    Ok((Arc::new(store), None))
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
