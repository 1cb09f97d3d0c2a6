// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Evaluation period model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A window against which a member's capped credit is judged.
///
/// Periods are created and closed by an external process; each member is
/// expected to have exactly one open period at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationPeriod {
    /// Period ID (also used as document ID)
    pub id: String,
    pub member_id: String,
    /// First day of the window (inclusive)
    pub start_date: NaiveDate,
    /// Last day of the window (inclusive)
    pub end_date: NaiveDate,
    /// Credit the member must obtain within the window
    pub required_credit: f64,
    /// Whether the window has elapsed
    #[serde(default)]
    pub closed: bool,
}

impl EvaluationPeriod {
    /// Reject periods whose start falls after their end.
    pub fn validate_bounds(&self) -> Result<()> {
        if self.start_date > self.end_date {
            return Err(AppError::Validation(format!(
                "period {} starts ({}) after it ends ({})",
                self.id, self.start_date, self.end_date
            )));
        }
        Ok(())
    }

    /// Whether `date` falls inside the window, both ends inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}
