// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Mall Directory server
//!
//! Serves the mall directory page and its controls over HTTP, backed by
//! Firestore (or an in-process store) and Firebase Authentication (or
//! in-process accounts).

use mall_directory::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, LogSink, MallStore, MemoryStore},
    services::{AuthProvider, IdentityToolkitClient, LocalAuthProvider},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, store = ?config.store, "Starting Mall Directory");

    let (store, log_sink): (Arc<dyn MallStore>, Arc<dyn LogSink>) = match config.store {
        StoreBackend::Firestore => {
            let db = FirestoreDb::new(&config.gcp_project_id).await?;
            (Arc::new(db.clone()), Arc::new(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            let store = MemoryStore::new();
            (Arc::new(store.clone()), Arc::new(store))
        }
    };

    let auth: Arc<dyn AuthProvider> = match &config.firebase_api_key {
        Some(api_key) => {
            tracing::info!(
                emulator = config.auth_emulator_host.is_some(),
                "Using Firebase Authentication"
            );
            Arc::new(IdentityToolkitClient::new(
                api_key.clone(),
                config.auth_emulator_host.as_deref(),
            ))
        }
        None => {
            tracing::warn!("FIREBASE_API_KEY not set; using local accounts");
            Arc::new(LocalAuthProvider::new())
        }
    };

    // Build shared state
    let state = Arc::new(AppState::compose(config.clone(), store, log_sink, auth));
    state.views.start().await;

    // Build router
    let app = mall_directory::routes::create_router(Arc::clone(&state));

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.logger.flush().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mall_directory=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
