//! Volunteer platform server.
//!
//! Wires configuration, logging, metrics, storage and the HTTP router
//! together. The binary in `main.rs` is a thin wrapper around [`run`].

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]

pub mod bootstrap;
pub mod config;
pub mod telemetry;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use volunteer_core::{Clock, SystemClock};
use volunteer_postgres::PostgresStore;
use volunteer_web::{AppState, build_router};

use crate::config::Config;

/// Connect, migrate, seed and serve until a shutdown signal arrives.
///
/// # Errors
///
/// Fails when the database is unreachable, a migration or the seeding
/// fails, or a listener cannot be bound.
pub async fn run(config: Config) -> anyhow::Result<()> {
    telemetry::install_metrics(config.server.metrics_addr()?)?;

    tracing::info!(
        max_connections = config.database.max_connections,
        "Connecting to database"
    );
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(config.database.connect_timeout())
        .idle_timeout(config.database.idle_timeout())
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    let store = PostgresStore::from_pool(pool);
    store.migrate().await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let report = bootstrap::seed(
        &store,
        clock.as_ref(),
        config.identity.admin_email.as_deref(),
    )
    .await?;
    tracing::debug!(?report, "Bootstrap finished");

    let state = AppState::new(Arc::new(store), clock)
        .identity_header(config.identity.header.clone());
    let app = build_router(state);

    let addr = config.server.addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "Server listening");

    serve(listener, app, config.server.shutdown_timeout()).await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Serve until a shutdown signal, then allow `grace` for in-flight
/// requests before dropping the remaining connections.
async fn serve(listener: TcpListener, app: axum::Router, grace: Duration) -> std::io::Result<()> {
    let (stopping_tx, mut stopping_rx) = watch::channel(false);

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = stopping_tx.send(true);
    });

    tokio::select! {
        result = std::future::IntoFuture::into_future(server) => result,
        () = async {
            if stopping_rx.wait_for(|stopping| *stopping).await.is_ok() {
                tokio::time::sleep(grace).await;
            } else {
                std::future::pending::<()>().await;
            }
        } => {
            tracing::warn!(?grace, "Shutdown timeout elapsed, dropping open connections");
            Ok(())
        }
    }
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
