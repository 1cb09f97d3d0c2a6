// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use cpd_tracker::config::Config;
use cpd_tracker::db::{ActivityLedger, FirestoreDb, MemoryDb};
use cpd_tracker::error::{AppError, Result};
use cpd_tracker::models::{ActivityEntry, ActivityType, EvaluationPeriod};
use cpd_tracker::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Generate a unique ID for test isolation.
#[allow(dead_code)]
pub fn unique_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

#[allow(dead_code)]
pub fn date(s: &str) -> NaiveDate {
    s.parse().expect("valid ISO date")
}

#[allow(dead_code)]
pub fn activity_type(id: &str, category: &str, rate: f64, cap: f64) -> ActivityType {
    ActivityType {
        id: id.to_string(),
        name: format!("Activity {}", id),
        category: category.to_string(),
        credit_per_unit: rate,
        max_credit_per_period: cap,
    }
}

#[allow(dead_code)]
pub fn period(id: &str, member_id: &str, start: &str, end: &str, closed: bool) -> EvaluationPeriod {
    EvaluationPeriod {
        id: id.to_string(),
        member_id: member_id.to_string(),
        start_date: date(start),
        end_date: date(end),
        required_credit: 30.0,
        closed,
    }
}

#[allow(dead_code)]
pub fn entry(id: &str, member_id: &str, type_id: &str, on: &str, quantity: f64) -> ActivityEntry {
    ActivityEntry {
        id: id.to_string(),
        member_id: member_id.to_string(),
        activity_type_id: type_id.to_string(),
        date: date(on),
        quantity,
        unit_credit_value: 1.0,
        description: format!("Entry {}", id),
        evidence: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Build app state over an in-memory store.
#[allow(dead_code)]
pub fn create_test_state(db: &MemoryDb) -> AppState {
    AppState::with_store(Config::default(), Arc::new(db.clone()))
}

/// Ledger that fails queries for one activity type.
///
/// Queries for `stalled_type`, if set, never complete.
#[allow(dead_code)]
pub struct FailingLedger {
    pub inner: MemoryDb,
    pub failing_type: String,
    pub stalled_type: Option<String>,
}

#[async_trait]
impl ActivityLedger for FailingLedger {
    async fn find_entries(
        &self,
        member_id: &str,
        activity_type_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ActivityEntry>> {
        if activity_type_id == self.failing_type {
            return Err(AppError::Database("simulated outage".to_string()));
        }
        if self.stalled_type.as_deref() == Some(activity_type_id) {
            std::future::pending::<()>().await;
        }
        self.inner
            .find_entries(member_id, activity_type_id, from, to)
            .await
    }

    async fn insert_entry(&self, entry: &ActivityEntry) -> Result<String> {
        self.inner.insert_entry(entry).await
    }

    async fn get_entry(&self, entry_id: &str) -> Result<Option<ActivityEntry>> {
        self.inner.get_entry(entry_id).await
    }

    async fn update_entry(&self, entry: &ActivityEntry) -> Result<()> {
        self.inner.update_entry(entry).await
    }

    async fn delete_entry(&self, entry_id: &str) -> Result<()> {
        self.inner.delete_entry(entry_id).await
    }
}
