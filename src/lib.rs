// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! CPD Tracker: continuing professional development evaluation engine
//!
//! This crate aggregates a member's activity ledger into capped, per-period
//! compliance reports and manages recurring activity commitments that are
//! recorded or skipped on a daily, weekly or monthly cadence.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use db::{ActivityLedger, ActivityTypeCatalog, PeriodStore, RecurringStore};
use services::{ActivityLog, RecurrenceScheduler, ReportBuilder};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub report_builder: ReportBuilder,
    pub scheduler: RecurrenceScheduler,
    pub activity_log: ActivityLog,
}

impl AppState {
    /// Wire every service to one backend implementing all store traits.
    pub fn with_store<S>(config: Config, store: Arc<S>) -> Self
    where
        S: ActivityLedger + ActivityTypeCatalog + PeriodStore + RecurringStore + 'static,
    {
        let ledger: Arc<dyn ActivityLedger> = store.clone();
        let catalog: Arc<dyn ActivityTypeCatalog> = store.clone();
        let periods: Arc<dyn PeriodStore> = store.clone();
        let recurring: Arc<dyn RecurringStore> = store;

        let report_builder = ReportBuilder::new(ledger.clone(), catalog.clone(), periods)
            .with_query_concurrency(config.report_query_concurrency);
        let scheduler = RecurrenceScheduler::new(recurring, catalog.clone());
        let activity_log = ActivityLog::new(ledger, catalog);

        Self {
            config,
            report_builder,
            scheduler,
            activity_log,
        }
    }
}
