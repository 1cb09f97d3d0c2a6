// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and calendar arithmetic.

use chrono::{DateTime, Datelike, Months, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Today's date in UTC.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Number of days in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Move `date` forward by `months` calendar months, landing on `anchor_day`.
///
/// The day is clamped to the last day of the target month when the anchor
/// does not exist there (Jan 31 + 1 month = Feb 28/29). Returns `None` only
/// when the result leaves chrono's representable range.
pub fn add_months_anchored(date: NaiveDate, months: u32, anchor_day: u32) -> Option<NaiveDate> {
    let target_month = date.with_day(1)?.checked_add_months(Months::new(months))?;
    let day = anchor_day.clamp(1, days_in_month(target_month));
    target_month.with_day(day)
}
