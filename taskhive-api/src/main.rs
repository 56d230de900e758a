//! # Taskhive API Server
//!
//! Multi-tenant task tracker API. Provides:
//! - Login that exchanges an external identity token for a session token
//! - Project CRUD with owner/member authorization
//! - Project invitations (send, accept, decline)
//! - Ordered tasks with status workflow and completion stamping
//! - A WebSocket feed broadcasting task changes per project
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskhive-api
//! ```
//!
//! Configuration comes from the environment (or a `.env` file); see
//! `Config::from_env` for the variable list.

use anyhow::Context as _;
use std::sync::Arc;
use taskhive_api::app::{build_router, AppState};
use taskhive_api::config::Config;
use taskhive_shared::auth::identity::HttpIdentityVerifier;
use taskhive_shared::db::migrations::{ensure_database_exists, run_migrations};
use taskhive_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "Taskhive API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env().context("Failed to load configuration")?;

    ensure_database_exists(&config.database.url)
        .await
        .context("Failed to ensure database exists")?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..DatabaseConfig::default()
    })
    .await
    .context("Failed to create database pool")?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let verifier = HttpIdentityVerifier::new(
        config.identity.verify_url.clone(),
        config.identity.api_key.clone(),
    )
    .context("Failed to build identity verifier client")?;

    let addr = config.bind_address();
    let state = AppState::new(pool.clone(), config, Arc::new(verifier));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    close_pool(pool).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Initializes tracing with an env filter and a fmt layer
///
/// `RUST_LOG` overrides the default filter. `LOG_FORMAT=json` switches the
/// fmt layer to JSON output for log shippers.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "taskhive_api=debug,taskhive_shared=debug,tower_http=debug".into()
    });

    let json_output = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if json_output {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Resolves when the process receives Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
