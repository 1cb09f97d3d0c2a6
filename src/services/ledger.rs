// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Direct activity logging.
//!
//! Entries capture the activity type's credit rate when they are created.
//! Edits re-validate every field but never touch that captured rate.

use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use crate::db::{ActivityLedger, ActivityTypeCatalog};
use crate::error::{AppError, Result};
use crate::models::{ActivityEntry, ActivityType, NewActivityEntry};

/// Logs, edits and deletes a member's ledger entries.
#[derive(Clone)]
pub struct ActivityLog {
    ledger: Arc<dyn ActivityLedger>,
    catalog: Arc<dyn ActivityTypeCatalog>,
}

impl ActivityLog {
    pub fn new(ledger: Arc<dyn ActivityLedger>, catalog: Arc<dyn ActivityTypeCatalog>) -> Self {
        Self { ledger, catalog }
    }

    pub async fn log_activity(
        &self,
        member_id: &str,
        input: NewActivityEntry,
    ) -> Result<ActivityEntry> {
        input.validate()?;
        let activity_type = self.activity_type(&input.activity_type_id).await?;

        let now = Utc::now();
        let entry = ActivityEntry {
            id: uuid::Uuid::new_v4().to_string(),
            member_id: member_id.to_string(),
            activity_type_id: activity_type.id,
            date: input.date,
            quantity: input.quantity,
            unit_credit_value: activity_type.credit_per_unit,
            description: input.description,
            evidence: input.evidence,
            created_at: now,
            updated_at: now,
        };
        entry.validate()?;

        self.ledger
            .insert_entry(&entry)
            .await
            .map_err(|e| e.with_context(format!("insert_entry member_id={member_id}")))?;

        tracing::info!(
            member_id,
            entry_id = %entry.id,
            activity_type_id = %entry.activity_type_id,
            date = %entry.date,
            quantity = entry.quantity,
            "Activity logged"
        );

        Ok(entry)
    }

    /// Replace an entry's editable fields.
    ///
    /// The activity type cannot change: the captured credit rate belongs to
    /// the original type.
    pub async fn update_activity(
        &self,
        member_id: &str,
        entry_id: &str,
        input: NewActivityEntry,
    ) -> Result<ActivityEntry> {
        input.validate()?;
        let existing = self.owned_entry(member_id, entry_id).await?;

        if existing.activity_type_id != input.activity_type_id {
            return Err(AppError::Validation(format!(
                "activity type of entry {} cannot change from {} to {}",
                entry_id, existing.activity_type_id, input.activity_type_id
            )));
        }

        let updated = ActivityEntry {
            date: input.date,
            quantity: input.quantity,
            description: input.description,
            evidence: input.evidence,
            updated_at: Utc::now(),
            ..existing
        };
        updated.validate()?;

        self.ledger
            .update_entry(&updated)
            .await
            .map_err(|e| e.with_context(format!("update_entry entry_id={entry_id}")))?;

        tracing::info!(member_id, entry_id, "Activity updated");
        Ok(updated)
    }

    pub async fn delete_activity(&self, member_id: &str, entry_id: &str) -> Result<()> {
        self.owned_entry(member_id, entry_id).await?;
        self.ledger
            .delete_entry(entry_id)
            .await
            .map_err(|e| e.with_context(format!("delete_entry entry_id={entry_id}")))?;

        tracing::info!(member_id, entry_id, "Activity deleted");
        Ok(())
    }

    async fn activity_type(&self, activity_type_id: &str) -> Result<ActivityType> {
        self.catalog
            .get_activity_type(activity_type_id)
            .await
            .map_err(|e| {
                e.with_context(format!("get_activity_type activity_type_id={activity_type_id}"))
            })?
            .ok_or_else(|| AppError::NotFound(format!("activity type {}", activity_type_id)))
    }

    async fn owned_entry(&self, member_id: &str, entry_id: &str) -> Result<ActivityEntry> {
        let entry = self
            .ledger
            .get_entry(entry_id)
            .await
            .map_err(|e| e.with_context(format!("get_entry entry_id={entry_id}")))?
            .ok_or_else(|| AppError::NotFound(format!("activity entry {}", entry_id)))?;

        if entry.member_id != member_id {
            tracing::warn!(member_id, entry_id, "Activity entry owned by another member");
            return Err(AppError::Forbidden(format!(
                "activity entry {} is not owned by member {}",
                entry_id, member_id
            )));
        }
        Ok(entry)
    }
}
