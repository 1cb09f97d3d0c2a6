// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Recurring activity commitments and their cadence arithmetic.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::ActivityEntry;
use crate::time_utils::add_months_anchored;

/// How often a recurring commitment comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Daily,
    Weekly,
    Monthly,
}

impl Cadence {
    /// Next due date after `from`.
    ///
    /// Monthly steps land on `anchor_day`, clamped to the end of shorter
    /// months, so a commitment created on the 31st stays on month ends.
    pub fn advance(self, from: NaiveDate, anchor_day: u32) -> Option<NaiveDate> {
        match self {
            Cadence::Daily => from.checked_add_signed(Duration::days(1)),
            Cadence::Weekly => from.checked_add_signed(Duration::days(7)),
            Cadence::Monthly => add_months_anchored(from, 1, anchor_day),
        }
    }
}

/// Where a definition sits relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    /// `next_due_at` is strictly in the future
    Scheduled,
    /// `next_due_at` is today or earlier
    Due,
}

/// A member's standing commitment to log an activity on a cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringActivityDefinition {
    /// Definition ID (also used as document ID)
    pub id: String,
    pub member_id: String,
    pub activity_type_id: String,
    pub quantity: f64,
    pub description: String,
    pub cadence: Cadence,
    /// Next date this commitment becomes actionable; only moves forward
    pub next_due_at: NaiveDate,
    /// Day of month monthly cadences return to (0 means use `next_due_at`)
    #[serde(default)]
    pub anchor_day: u32,
    /// Optimistic concurrency token, bumped by the store on every save
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringActivityDefinition {
    pub fn state(&self, today: NaiveDate) -> ScheduleState {
        if self.next_due_at <= today {
            ScheduleState::Due
        } else {
            ScheduleState::Scheduled
        }
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.state(today) == ScheduleState::Due
    }

    /// Fail with `NotDue` unless the definition is actionable today.
    pub fn ensure_due(&self, today: NaiveDate) -> Result<()> {
        match self.state(today) {
            ScheduleState::Due => Ok(()),
            ScheduleState::Scheduled => Err(AppError::NotDue {
                definition_id: self.id.clone(),
                next_due_at: self.next_due_at,
            }),
        }
    }

    /// Move `next_due_at` forward by one cadence step.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<()> {
        let anchor = if self.anchor_day == 0 {
            self.next_due_at.day()
        } else {
            self.anchor_day
        };
        let next = self.cadence.advance(self.next_due_at, anchor).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "cannot advance {} past {}",
                self.id,
                self.next_due_at
            ))
        })?;

        self.next_due_at = next;
        self.updated_at = now;
        Ok(())
    }

    /// Ledger entry for the cycle currently due, dated the day it was due.
    pub fn to_entry(&self, unit_credit_value: f64, now: DateTime<Utc>) -> ActivityEntry {
        ActivityEntry {
            id: uuid::Uuid::new_v4().to_string(),
            member_id: self.member_id.clone(),
            activity_type_id: self.activity_type_id.clone(),
            date: self.next_due_at,
            quantity: self.quantity,
            unit_credit_value,
            description: self.description.clone(),
            evidence: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a recurring commitment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewRecurringActivity {
    #[validate(length(min = 1, message = "activity type is required"))]
    pub activity_type_id: String,
    #[validate(
        required(message = "quantity is required"),
        range(exclusive_min = 0.0, message = "quantity must be greater than zero")
    )]
    pub quantity: Option<f64>,
    #[validate(
        required(message = "description is required"),
        length(min = 1, max = 500, message = "description must be 1-500 characters")
    )]
    pub description: Option<String>,
    #[validate(required(message = "cadence is required"))]
    pub cadence: Option<Cadence>,
    /// First due date; defaults to today
    #[serde(default)]
    pub first_due_at: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn make_definition(cadence: Cadence, due: &str) -> RecurringActivityDefinition {
        RecurringActivityDefinition {
            id: "r1".to_string(),
            member_id: "m1".to_string(),
            activity_type_id: "reading".to_string(),
            quantity: 1.0,
            description: "Journal reading".to_string(),
            cadence,
            next_due_at: d(due),
            anchor_day: d(due).day(),
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_weekly_advance() {
        let mut def = make_definition(Cadence::Weekly, "2024-01-15");
        def.advance(Utc::now()).unwrap();
        assert_eq!(def.next_due_at, d("2024-01-22"));
    }

    #[test]
    fn test_daily_advance_crosses_month() {
        let mut def = make_definition(Cadence::Daily, "2024-02-29");
        def.advance(Utc::now()).unwrap();
        assert_eq!(def.next_due_at, d("2024-03-01"));
    }

    #[test]
    fn test_monthly_end_of_month_clamps_then_recovers() {
        let mut def = make_definition(Cadence::Monthly, "2024-01-31");
        def.advance(Utc::now()).unwrap();
        assert_eq!(def.next_due_at, d("2024-02-29"));
        def.advance(Utc::now()).unwrap();
        assert_eq!(def.next_due_at, d("2024-03-31"));
        def.advance(Utc::now()).unwrap();
        assert_eq!(def.next_due_at, d("2024-04-30"));
    }

    #[test]
    fn test_monthly_without_anchor_uses_current_day() {
        let mut def = make_definition(Cadence::Monthly, "2024-05-10");
        def.anchor_day = 0;
        def.advance(Utc::now()).unwrap();
        assert_eq!(def.next_due_at, d("2024-06-10"));
    }

    #[test]
    fn test_state_boundaries() {
        let def = make_definition(Cadence::Weekly, "2024-03-01");
        assert_eq!(def.state(d("2024-02-29")), ScheduleState::Scheduled);
        assert_eq!(def.state(d("2024-03-01")), ScheduleState::Due);
        assert_eq!(def.state(d("2024-03-05")), ScheduleState::Due);
    }

    #[test]
    fn test_ensure_due_reports_not_due() {
        let def = make_definition(Cadence::Weekly, "2024-03-01");
        let err = def.ensure_due(d("2024-02-01")).unwrap_err();
        assert!(err.is_not_due());
    }

    #[test]
    fn test_entry_is_dated_for_due_cycle() {
        let def = make_definition(Cadence::Weekly, "2024-03-01");
        let entry = def.to_entry(2.5, Utc::now());
        assert_eq!(entry.date, d("2024-03-01"));
        assert_eq!(entry.unit_credit_value, 2.5);
        assert_eq!(entry.quantity, 1.0);
        assert_eq!(entry.member_id, "m1");
    }

    #[test]
    fn test_new_recurring_requires_fields() {
        let missing = NewRecurringActivity {
            activity_type_id: "reading".to_string(),
            ..Default::default()
        };
        let errors = missing.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("quantity"));
        assert!(fields.contains_key("description"));
        assert!(fields.contains_key("cadence"));
    }

    #[test]
    fn test_cadence_serde_lowercase() {
        let json = serde_json::to_string(&Cadence::Monthly).unwrap();
        assert_eq!(json, "\"monthly\"");
        let parsed: Cadence = serde_json::from_str("\"weekly\"").unwrap();
        assert_eq!(parsed, Cadence::Weekly);
    }
}
