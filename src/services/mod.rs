// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod ledger;
pub mod recurring;
pub mod report;

pub use ledger::ActivityLog;
pub use recurring::{RecordResult, RecurrenceScheduler};
pub use report::ReportBuilder;
