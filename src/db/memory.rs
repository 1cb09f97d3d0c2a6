// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store backed by concurrent hash maps.
//!
//! Used for tests, benchmarks and local runs without Firestore. Definition
//! saves hold the map entry lock for the whole compare-and-swap, which is what
//! makes record/skip race-free here.

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::db::{next_version, ActivityLedger, ActivityTypeCatalog, PeriodStore, RecurringStore};
use crate::error::{AppError, Result};
use crate::models::{ActivityEntry, ActivityType, EvaluationPeriod, RecurringActivityDefinition};

/// Contents of a JSON seed file for local runs.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub activity_types: Vec<ActivityType>,
    #[serde(default)]
    pub periods: Vec<EvaluationPeriod>,
    #[serde(default)]
    pub entries: Vec<ActivityEntry>,
    #[serde(default)]
    pub recurring: Vec<RecurringActivityDefinition>,
}

#[derive(Default)]
struct Tables {
    entries: DashMap<String, ActivityEntry>,
    activity_types: DashMap<String, ActivityType>,
    periods: DashMap<String, EvaluationPeriod>,
    recurring: DashMap<String, RecurringActivityDefinition>,
}

/// Memory-backed implementation of every store trait.
///
/// Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryDb {
    tables: Arc<Tables>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a JSON seed file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json_data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        Self::load_from_json(&json_data)
    }

    /// Load a store from a JSON seed string.
    pub fn load_from_json(json_data: &str) -> Result<Self> {
        let seed: Seed = serde_json::from_str(json_data).context("Failed to parse seed data")?;
        let db = Self::new();

        for activity_type in seed.activity_types {
            db.upsert_activity_type(activity_type);
        }
        for period in seed.periods {
            db.tables.periods.insert(period.id.clone(), period);
        }
        for entry in seed.entries {
            db.tables.entries.insert(entry.id.clone(), entry);
        }
        for definition in seed.recurring {
            db.tables.recurring.insert(definition.id.clone(), definition);
        }

        tracing::info!(
            activity_types = db.tables.activity_types.len(),
            periods = db.tables.periods.len(),
            entries = db.tables.entries.len(),
            recurring = db.tables.recurring.len(),
            "Loaded seed data"
        );
        Ok(db)
    }

    /// Add or replace an activity type in the catalog.
    pub fn upsert_activity_type(&self, activity_type: ActivityType) {
        self.tables
            .activity_types
            .insert(activity_type.id.clone(), activity_type);
    }

    /// Number of ledger entries across all members.
    pub fn entry_count(&self) -> usize {
        self.tables.entries.len()
    }

    /// Compare-and-swap a definition, running `on_commit` under the entry lock.
    fn swap_definition<F>(
        &self,
        definition: &RecurringActivityDefinition,
        on_commit: F,
    ) -> Result<RecurringActivityDefinition>
    where
        F: FnOnce(),
    {
        match self.tables.recurring.entry(definition.id.clone()) {
            Entry::Occupied(mut slot) => {
                let next = next_version(Some(slot.get()), definition)?;
                on_commit();
                slot.insert(next.clone());
                Ok(next)
            }
            Entry::Vacant(slot) => {
                let next = next_version(None, definition)?;
                on_commit();
                slot.insert(next.clone());
                Ok(next)
            }
        }
    }
}

#[async_trait]
impl ActivityLedger for MemoryDb {
    async fn find_entries(
        &self,
        member_id: &str,
        activity_type_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ActivityEntry>> {
        let mut found: Vec<ActivityEntry> = self
            .tables
            .entries
            .iter()
            .filter(|e| {
                e.member_id == member_id
                    && e.activity_type_id == activity_type_id
                    && from <= e.date
                    && e.date <= to
            })
            .map(|e| e.value().clone())
            .collect();
        found.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(found)
    }

    async fn insert_entry(&self, entry: &ActivityEntry) -> Result<String> {
        self.tables
            .entries
            .insert(entry.id.clone(), entry.clone());
        Ok(entry.id.clone())
    }

    async fn get_entry(&self, entry_id: &str) -> Result<Option<ActivityEntry>> {
        Ok(self.tables.entries.get(entry_id).map(|e| e.value().clone()))
    }

    async fn update_entry(&self, entry: &ActivityEntry) -> Result<()> {
        match self.tables.entries.get_mut(&entry.id) {
            Some(mut stored) => {
                *stored = entry.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("activity entry {}", entry.id))),
        }
    }

    async fn delete_entry(&self, entry_id: &str) -> Result<()> {
        self.tables.entries.remove(entry_id);
        Ok(())
    }
}

#[async_trait]
impl ActivityTypeCatalog for MemoryDb {
    async fn list_activity_types(&self) -> Result<Vec<ActivityType>> {
        let mut types: Vec<ActivityType> = self
            .tables
            .activity_types
            .iter()
            .map(|t| t.value().clone())
            .collect();
        types.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(types)
    }

    async fn get_activity_type(&self, activity_type_id: &str) -> Result<Option<ActivityType>> {
        Ok(self
            .tables
            .activity_types
            .get(activity_type_id)
            .map(|t| t.value().clone()))
    }
}

#[async_trait]
impl PeriodStore for MemoryDb {
    async fn list_periods(&self, member_id: &str) -> Result<Vec<EvaluationPeriod>> {
        let mut periods: Vec<EvaluationPeriod> = self
            .tables
            .periods
            .iter()
            .filter(|p| p.member_id == member_id)
            .map(|p| p.value().clone())
            .collect();
        periods.sort_by(|a, b| a.start_date.cmp(&b.start_date));
        Ok(periods)
    }

    async fn get_period(&self, period_id: &str) -> Result<Option<EvaluationPeriod>> {
        Ok(self.tables.periods.get(period_id).map(|p| p.value().clone()))
    }

    async fn upsert_period(&self, period: &EvaluationPeriod) -> Result<()> {
        self.tables
            .periods
            .insert(period.id.clone(), period.clone());
        Ok(())
    }
}

#[async_trait]
impl RecurringStore for MemoryDb {
    async fn load_by_member(&self, member_id: &str) -> Result<Vec<RecurringActivityDefinition>> {
        let mut definitions: Vec<RecurringActivityDefinition> = self
            .tables
            .recurring
            .iter()
            .filter(|d| d.member_id == member_id)
            .map(|d| d.value().clone())
            .collect();
        definitions.sort_by(|a, b| a.next_due_at.cmp(&b.next_due_at).then(a.id.cmp(&b.id)));
        Ok(definitions)
    }

    async fn get(&self, definition_id: &str) -> Result<Option<RecurringActivityDefinition>> {
        Ok(self
            .tables
            .recurring
            .get(definition_id)
            .map(|d| d.value().clone()))
    }

    async fn save(
        &self,
        definition: &RecurringActivityDefinition,
    ) -> Result<RecurringActivityDefinition> {
        self.swap_definition(definition, || {})
    }

    async fn save_with_entry(
        &self,
        definition: &RecurringActivityDefinition,
        entry: &ActivityEntry,
    ) -> Result<RecurringActivityDefinition> {
        let entries = &self.tables.entries;
        self.swap_definition(definition, || {
            entries.insert(entry.id.clone(), entry.clone());
        })
    }

    async fn delete(&self, definition_id: &str) -> Result<()> {
        self.tables.recurring.remove(definition_id);
        Ok(())
    }
}
