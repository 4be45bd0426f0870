//! github2pubsub - GitHub webhook receiver that republishes to Pub/Sub.
//!
//! This binary:
//! - Receives GitHub webhooks on `POST /`
//! - Verifies the signature and the event type against the allow-list
//! - Publishes `{"event_type", "payload"}` to the configured topic
//! - Returns `200 {}` once Pub/Sub has accepted the message

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use github2pubsub::{router, AppState, Config, PubSubPublisher};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        port = config.port,
        allowed_events = ?config.allowed_events,
        topic = %config.topic.topic_path(),
        create_topic = config.topic.create_topic,
        strict_status_codes = config.strict_status_codes,
        emulator = config.emulator_host.is_some(),
        "config_loaded"
    );

    let publisher =
        PubSubPublisher::from_config(&config).context("Failed to create Pub/Sub publisher")?;

    let port = config.port;
    let state = AppState::new(config, Arc::new(publisher));
    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl_c_handler_failed");
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
                tracing::error!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
