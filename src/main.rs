// SPDX-License-Identifier: MIT
// Copyright 2026 Murmur Labs <dev@murmurlabs.dev>

//! Murmur API Server
//!
//! Serves the device, license and feedback endpoints backing the Murmur
//! desktop client and editor extension.

use murmur_api::{config::Config, db::Db, services::LicenseService, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Murmur API");

    // Connect the store: hosted Firestore when a project is configured,
    // in-memory otherwise (local development).
    let db = match &config.gcp_project_id {
        Some(project_id) => Db::new_hosted(project_id)
            .await
            .expect("Failed to connect to Firestore"),
        None => {
            tracing::warn!("GCP_PROJECT_ID not set; using in-memory store (data is not persisted)");
            Db::new_memory()
        }
    };

    let license = LicenseService::new(db.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        license,
    });

    // Build router
    let app = murmur_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
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
                .add_directive("murmur_api=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
