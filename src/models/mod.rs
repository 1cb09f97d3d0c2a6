// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the engine.

pub mod activity;
pub mod activity_type;
pub mod period;
pub mod recurring;
pub mod report;

pub use activity::{ActivityEntry, NewActivityEntry};
pub use activity_type::ActivityType;
pub use period::EvaluationPeriod;
pub use recurring::{Cadence, NewRecurringActivity, RecurringActivityDefinition, ScheduleState};
pub use report::{ActivityBreakdown, EvaluationReport};
