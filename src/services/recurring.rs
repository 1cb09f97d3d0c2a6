// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recurring activity scheduling.
//!
//! Advancement is lazy: a definition only moves forward when a caller records
//! or skips it. Both operations refuse definitions that are not yet due, and
//! both persist through a version-checked save so a retried or racing request
//! cannot log the same cycle twice.

use chrono::{Datelike, NaiveDate, Utc};
use std::sync::Arc;
use validator::Validate;

use crate::db::{ActivityTypeCatalog, RecurringStore};
use crate::error::{AppError, Result};
use crate::models::{ActivityEntry, NewRecurringActivity, RecurringActivityDefinition};

/// Owns the lifecycle of a member's recurring activity definitions.
#[derive(Clone)]
pub struct RecurrenceScheduler {
    store: Arc<dyn RecurringStore>,
    catalog: Arc<dyn ActivityTypeCatalog>,
}

/// Result of recording a due definition.
#[derive(Debug, Clone)]
pub struct RecordResult {
    /// Ledger entry written for the cycle that was due
    pub entry: ActivityEntry,
    /// Definition as persisted after advancing
    pub definition: RecurringActivityDefinition,
}

impl RecurrenceScheduler {
    pub fn new(store: Arc<dyn RecurringStore>, catalog: Arc<dyn ActivityTypeCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Create a recurring commitment for `member_id`.
    pub async fn add(
        &self,
        member_id: &str,
        input: NewRecurringActivity,
        today: NaiveDate,
    ) -> Result<RecurringActivityDefinition> {
        input.validate()?;

        let (Some(quantity), Some(description), Some(cadence)) =
            (input.quantity, input.description, input.cadence)
        else {
            return Err(AppError::Validation(
                "quantity, description and cadence are required".to_string(),
            ));
        };

        if self
            .catalog
            .get_activity_type(&input.activity_type_id)
            .await
            .map_err(|e| {
                e.with_context(format!(
                    "get_activity_type activity_type_id={}",
                    input.activity_type_id
                ))
            })?
            .is_none()
        {
            return Err(AppError::NotFound(format!(
                "activity type {}",
                input.activity_type_id
            )));
        }

        let next_due_at = input.first_due_at.unwrap_or(today);
        let now = Utc::now();
        let definition = RecurringActivityDefinition {
            id: uuid::Uuid::new_v4().to_string(),
            member_id: member_id.to_string(),
            activity_type_id: input.activity_type_id,
            quantity,
            description,
            cadence,
            next_due_at,
            anchor_day: next_due_at.day(),
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let saved = self
            .store
            .save(&definition)
            .await
            .map_err(|e| e.with_context(format!("save member_id={member_id}")))?;

        tracing::info!(
            member_id,
            definition_id = %saved.id,
            cadence = ?saved.cadence,
            next_due_at = %saved.next_due_at,
            "Recurring activity added"
        );

        Ok(saved)
    }

    /// All of the member's definitions, soonest due first.
    pub async fn list(&self, member_id: &str) -> Result<Vec<RecurringActivityDefinition>> {
        self.store
            .load_by_member(member_id)
            .await
            .map_err(|e| e.with_context(format!("load_by_member member_id={member_id}")))
    }

    /// The member's definitions that can be recorded or skipped today.
    pub async fn due(
        &self,
        member_id: &str,
        today: NaiveDate,
    ) -> Result<Vec<RecurringActivityDefinition>> {
        Ok(self
            .list(member_id)
            .await?
            .into_iter()
            .filter(|d| d.is_due(today))
            .collect())
    }

    /// Log the due cycle to the ledger and advance the definition.
    ///
    /// The entry is dated for the cycle that was due, not for `today`, so a
    /// late record still counts towards the right period.
    pub async fn record(
        &self,
        member_id: &str,
        definition_id: &str,
        today: NaiveDate,
    ) -> Result<RecordResult> {
        let mut definition = self.load_due(member_id, definition_id, today).await?;

        let activity_type = self
            .catalog
            .get_activity_type(&definition.activity_type_id)
            .await
            .map_err(|e| {
                e.with_context(format!(
                    "get_activity_type activity_type_id={}",
                    definition.activity_type_id
                ))
            })?
            .ok_or_else(|| {
                AppError::NotFound(format!("activity type {}", definition.activity_type_id))
            })?;

        let now = Utc::now();
        let entry = definition.to_entry(activity_type.credit_per_unit, now);
        definition.advance(now)?;

        let saved = self
            .store
            .save_with_entry(&definition, &entry)
            .await
            .map_err(|e| self.log_save_failure(e, member_id, definition_id, "record"))?;

        tracing::info!(
            member_id,
            definition_id,
            entry_id = %entry.id,
            logged_for = %entry.date,
            next_due_at = %saved.next_due_at,
            "Recurring activity recorded"
        );

        Ok(RecordResult {
            entry,
            definition: saved,
        })
    }

    /// Advance the due definition without logging anything.
    pub async fn skip(
        &self,
        member_id: &str,
        definition_id: &str,
        today: NaiveDate,
    ) -> Result<RecurringActivityDefinition> {
        let mut definition = self.load_due(member_id, definition_id, today).await?;
        let skipped = definition.next_due_at;
        definition.advance(Utc::now())?;

        let saved = self
            .store
            .save(&definition)
            .await
            .map_err(|e| self.log_save_failure(e, member_id, definition_id, "skip"))?;

        tracing::info!(
            member_id,
            definition_id,
            skipped = %skipped,
            next_due_at = %saved.next_due_at,
            "Recurring activity skipped"
        );

        Ok(saved)
    }

    /// Delete a definition from the member's set.
    pub async fn remove(&self, member_id: &str, definition_id: &str) -> Result<()> {
        self.load_owned(member_id, definition_id).await?;
        self.store
            .delete(definition_id)
            .await
            .map_err(|e| e.with_context(format!("delete definition_id={definition_id}")))?;

        tracing::info!(member_id, definition_id, "Recurring activity removed");
        Ok(())
    }

    async fn load_owned(
        &self,
        member_id: &str,
        definition_id: &str,
    ) -> Result<RecurringActivityDefinition> {
        let definition = self
            .store
            .get(definition_id)
            .await
            .map_err(|e| e.with_context(format!("get definition_id={definition_id}")))?
            .ok_or_else(|| AppError::NotFound(format!("recurring activity {}", definition_id)))?;

        if definition.member_id != member_id {
            tracing::warn!(member_id, definition_id, "Recurring activity owned by another member");
            return Err(AppError::Forbidden(format!(
                "recurring activity {} is not owned by member {}",
                definition_id, member_id
            )));
        }

        Ok(definition)
    }

    async fn load_due(
        &self,
        member_id: &str,
        definition_id: &str,
        today: NaiveDate,
    ) -> Result<RecurringActivityDefinition> {
        let definition = self.load_owned(member_id, definition_id).await?;
        if let Err(err) = definition.ensure_due(today) {
            tracing::warn!(
                member_id,
                definition_id,
                next_due_at = %definition.next_due_at,
                "Recurring activity not due yet"
            );
            return Err(err);
        }
        Ok(definition)
    }

    fn log_save_failure(
        &self,
        err: AppError,
        member_id: &str,
        definition_id: &str,
        operation: &str,
    ) -> AppError {
        if matches!(err, AppError::Conflict(_)) {
            tracing::warn!(member_id, definition_id, operation, "Lost race on recurring activity");
        }
        err.with_context(format!(
            "{operation} member_id={member_id} definition_id={definition_id}"
        ))
    }
}
