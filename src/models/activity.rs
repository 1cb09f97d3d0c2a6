// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity ledger entry model for storage and reporting.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One dated record of CPD activity, stored in the activity ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ActivityEntry {
    /// Entry ID (also used as document ID)
    pub id: String,
    /// Owning member
    pub member_id: String,
    /// Activity type this entry counts towards
    pub activity_type_id: String,
    /// Date the activity was performed
    pub date: NaiveDate,
    /// Units performed (e.g. hours)
    #[validate(range(exclusive_min = 0.0, message = "quantity must be greater than zero"))]
    pub quantity: f64,
    /// Credit per unit captured when the entry was created; never rewritten
    #[validate(range(min = 0.0, message = "unit credit value cannot be negative"))]
    pub unit_credit_value: f64,
    /// Free text description
    #[validate(length(min = 1, max = 500, message = "description must be 1-500 characters"))]
    pub description: String,
    /// Whether supporting evidence is held for this entry
    #[serde(default)]
    pub evidence: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for logging or editing an activity.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewActivityEntry {
    #[validate(length(min = 1, message = "activity type is required"))]
    pub activity_type_id: String,
    pub date: NaiveDate,
    #[validate(range(exclusive_min = 0.0, message = "quantity must be greater than zero"))]
    pub quantity: f64,
    #[validate(length(min = 1, max = 500, message = "description must be 1-500 characters"))]
    pub description: String,
    #[serde(default)]
    pub evidence: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(quantity: f64, description: &str) -> NewActivityEntry {
        NewActivityEntry {
            activity_type_id: "conference".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            quantity,
            description: description.to_string(),
            evidence: false,
        }
    }

    #[test]
    fn test_valid_input() {
        assert!(input(1.5, "Annual conference").validate().is_ok());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        assert!(input(0.0, "Annual conference").validate().is_err());
        assert!(input(-2.0, "Annual conference").validate().is_err());
    }

    #[test]
    fn test_empty_description_rejected() {
        assert!(input(1.0, "").validate().is_err());
    }
}
