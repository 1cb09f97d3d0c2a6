// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Compliance report aggregates.
//!
//! A report is derived on demand from the ledger and the activity type
//! catalog; it is never persisted by the engine. Renderers (PDF, spreadsheet)
//! consume it as a plain value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{ActivityEntry, ActivityType, EvaluationPeriod};

/// Per activity type totals within one evaluation period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityBreakdown {
    pub activity_type_id: String,
    pub name: String,
    pub category: String,
    /// Sum of entry quantities
    pub total_units: f64,
    /// Current catalog rate, not the rate captured on each entry
    pub credit_per_unit: f64,
    /// Cap applied to this row
    pub max_credit_per_period: f64,
    /// `total_units * credit_per_unit`, uncapped
    pub raw_credit_total: f64,
    /// `min(raw_credit_total, max_credit_per_period)`
    pub capped_credit: f64,
    /// Matching ledger entries, newest first
    #[serde(default)]
    pub entries: Vec<ActivityEntry>,
}

impl ActivityBreakdown {
    /// Aggregate the entries logged against one activity type.
    ///
    /// Entries are expected to be pre-filtered to the type and period.
    pub fn from_entries(activity_type: &ActivityType, mut entries: Vec<ActivityEntry>) -> Self {
        entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));

        // `sum()` over no items yields -0.0, which serializes as "-0".
        let total_units = entries.iter().fold(0.0, |acc, e| acc + e.quantity);
        let raw_credit_total = total_units * activity_type.credit_per_unit;
        let capped_credit = raw_credit_total
            .min(activity_type.max_credit_per_period)
            .max(0.0);

        Self {
            activity_type_id: activity_type.id.clone(),
            name: activity_type.name.clone(),
            category: activity_type.category.clone(),
            total_units,
            credit_per_unit: activity_type.credit_per_unit,
            max_credit_per_period: activity_type.max_credit_per_period,
            raw_credit_total,
            capped_credit,
            entries,
        }
    }

    /// Whether the cap cut into this row's raw credit.
    pub fn is_capped(&self) -> bool {
        self.raw_credit_total > self.capped_credit
    }
}

/// Compliance report for one member and one evaluation period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub period_id: String,
    pub member_id: String,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    /// Sum of `capped_credit` over all rows
    pub total_credit_obtained: f64,
    pub required_credit: f64,
    /// One row per catalog activity type, in catalog order
    pub breakdown: Vec<ActivityBreakdown>,
}

impl EvaluationReport {
    /// Assemble a report from finished breakdown rows.
    pub fn assemble(
        member_id: &str,
        period: &EvaluationPeriod,
        breakdown: Vec<ActivityBreakdown>,
    ) -> Self {
        let total_credit_obtained = breakdown
            .iter()
            .fold(0.0, |acc, row| acc + row.capped_credit);
        Self {
            period_id: period.id.clone(),
            member_id: member_id.to_string(),
            start_date: period.start_date,
            end_date: period.end_date,
            total_credit_obtained,
            required_credit: period.required_credit,
            breakdown,
        }
    }

    /// Whether the member has met the period's requirement.
    pub fn is_compliant(&self) -> bool {
        self.total_credit_obtained >= self.required_credit
    }

    /// Credit still needed, never negative.
    pub fn remaining_credit(&self) -> f64 {
        (self.required_credit - self.total_credit_obtained).max(0.0)
    }

    /// Capped credit summed per activity category.
    pub fn credit_by_category(&self) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for row in &self.breakdown {
            *totals.entry(row.category.clone()).or_insert(0.0) += row.capped_credit;
        }
        totals
    }

    /// Look up the row for an activity type.
    pub fn row(&self, activity_type_id: &str) -> Option<&ActivityBreakdown> {
        self.breakdown
            .iter()
            .find(|row| row.activity_type_id == activity_type_id)
    }
}
