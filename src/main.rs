// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wardwatch API Server
//!
//! Serves citizen waste reports, per-ward collector assignment and daily
//! ward pickup tasks.

use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wardwatch::{
    config::{Config, StorageBackend},
    db::FirestoreDb,
    services::{AssignmentResolver, EmailSender, ResendMailer, WardRegistry},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, backend = ?config.storage_backend, "Starting Wardwatch API");

    let db = match config.storage_backend {
        StorageBackend::Firestore => FirestoreDb::new(&config.gcp_project_id).await?,
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data will not survive a restart");
            FirestoreDb::new_in_memory()
        }
    };

    let wards = match &config.ward_schedule_path {
        Some(path) => {
            tracing::info!(path = %path, "Loading ward schedules");
            WardRegistry::load_from_file(path)?
        }
        None => WardRegistry::builtin(),
    };
    tracing::info!(count = wards.schedules().count(), "Ward schedules loaded");

    if config.resend_api_key.is_none() {
        tracing::warn!("RESEND_API_KEY not set; pickup notifications will be logged only");
    }
    let mailer: Arc<dyn EmailSender> = Arc::new(ResendMailer::new(
        config.resend_api_key.clone(),
        config.email_from.clone(),
    ));

    if config.reconcile_interval_secs > 0 {
        spawn_reconciler(
            AssignmentResolver::new(db.clone()),
            Duration::from_secs(config.reconcile_interval_secs),
        );
    }

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        wards: Arc::new(wards),
        mailer,
    });

    // Build router
    let app = wardwatch::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically backfill collector assignments on unassigned reports.
fn spawn_reconciler(resolver: AssignmentResolver, period: Duration) {
    tracing::info!(period_secs = period.as_secs(), "Starting report reconciler");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = resolver.reconcile_unassigned_reports().await {
                tracing::error!(error = %e, "Report reconciliation failed");
            }
        }
    });
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wardwatch=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
