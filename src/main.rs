// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CPD Tracker report runner
//!
//! Builds the current-period compliance report for one member and lists the
//! recurring activities due today, printing both as JSON for a renderer.

use cpd_tracker::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryDb},
    time_utils::{format_utc_rfc3339, today_utc},
    AppState,
};
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    let member_id = std::env::args()
        .nth(1)
        .ok_or("usage: cpd-tracker <member-id>")?;

    let config = Config::from_env()?;
    tracing::info!(backend = ?config.store_backend, "Starting CPD Tracker");

    let state = match config.store_backend.clone() {
        StoreBackend::Firestore { project_id } => {
            let db = FirestoreDb::new(&project_id).await?;
            AppState::with_store(config, Arc::new(db))
        }
        StoreBackend::Memory { seed_file } => {
            let db = match seed_file {
                Some(path) => {
                    tracing::info!(path = %path.display(), "Loading seed data");
                    MemoryDb::load_from_file(path)?
                }
                None => MemoryDb::new(),
            };
            AppState::with_store(config, Arc::new(db))
        }
    };

    let today = today_utc();
    let report = state.report_builder.current_report(&member_id).await?;
    let due = state.scheduler.due(&member_id, today).await?;

    tracing::info!(
        member_id = %member_id,
        compliant = report.is_compliant(),
        remaining_credit = report.remaining_credit(),
        due_recurring = due.len(),
        "Report complete"
    );

    let credit_by_category = report.credit_by_category();
    let output = json!({
        "generated_at": format_utc_rfc3339(chrono::Utc::now()),
        "report": report,
        "credit_by_category": credit_by_category,
        "due_recurring": due,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cpd_tracker=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
