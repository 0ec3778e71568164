// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Drive-Tracker API Server
//!
//! Receives location fixes from the car companion app, detects and scores
//! trips, and serves trip history, user stats and the leaderboard.

use drive_tracker::services::spawn_idle_sweeper;
use drive_tracker::{config::Config, db::FirestoreDb, AppState};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Drive-Tracker API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    let state = Arc::new(AppState::new(config.clone(), db));

    // Sessions whose phone went quiet are closed in the background
    let idle_timeout = state.config.session_idle_timeout;
    let sweeper = spawn_idle_sweeper(
        state.sessions.clone(),
        state.recorder.clone(),
        idle_timeout,
        idle_timeout / 4,
    );

    // Build router
    let app = drive_tracker::routes::create_router(state.clone());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Open drives are stored as unfinished, and finalized trips must not
    // be lost on shutdown
    sweeper.abort();
    for trip in state.sessions.close_all().await {
        let _ = state.recorder.submit(trip);
    }
    let outstanding = state.recorder.drain(SHUTDOWN_DRAIN_TIMEOUT).await;
    if outstanding > 0 {
        tracing::warn!(outstanding, "Shutting down with trip writes still in flight");
    }
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("drive_tracker=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
