// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Evaluation report building.
//!
//! Handles the compliance workflow:
//! 1. Pick the evaluation period (explicit, by id, or the member's open one)
//! 2. Query the ledger once per catalog activity type, concurrently
//! 3. Cap each type's credit and total the capped values
//!
//! Every catalog type yields a row even with no activity, so a report always
//! shows "0 of N" rather than hiding types the member has not touched.
//! Rates and caps come from the catalog as it stands when the report runs.

use futures_util::{stream, StreamExt, TryStreamExt};
use std::sync::Arc;
use validator::Validate;

use crate::config::DEFAULT_REPORT_QUERY_CONCURRENCY;
use crate::db::{ActivityLedger, ActivityTypeCatalog, PeriodStore};
use crate::error::{AppError, Result};
use crate::models::{ActivityBreakdown, EvaluationPeriod, EvaluationReport};

/// Builds capped, per-period compliance reports.
#[derive(Clone)]
pub struct ReportBuilder {
    ledger: Arc<dyn ActivityLedger>,
    catalog: Arc<dyn ActivityTypeCatalog>,
    periods: Arc<dyn PeriodStore>,
    query_concurrency: usize,
}

impl ReportBuilder {
    pub fn new(
        ledger: Arc<dyn ActivityLedger>,
        catalog: Arc<dyn ActivityTypeCatalog>,
        periods: Arc<dyn PeriodStore>,
    ) -> Self {
        Self {
            ledger,
            catalog,
            periods,
            query_concurrency: DEFAULT_REPORT_QUERY_CONCURRENCY,
        }
    }

    /// Limit how many ledger queries run at once.
    pub fn with_query_concurrency(mut self, limit: usize) -> Self {
        self.query_concurrency = limit.max(1);
        self
    }

    /// Build the report for `member_id` over `period`.
    ///
    /// All-or-nothing: the first failed query for any activity type aborts
    /// the build, dropping queries still in flight, and the error names that
    /// type. A catalog type with a negative rate or cap is a data integrity
    /// error.
    pub async fn build_report(
        &self,
        member_id: &str,
        period: &EvaluationPeriod,
    ) -> Result<EvaluationReport> {
        period.validate_bounds()?;

        let activity_types = self
            .catalog
            .list_activity_types()
            .await
            .map_err(|e| e.with_context(format!("list_activity_types member_id={member_id}")))?;

        for activity_type in &activity_types {
            if let Err(errors) = activity_type.validate() {
                tracing::warn!(
                    activity_type_id = %activity_type.id,
                    credit_per_unit = activity_type.credit_per_unit,
                    max_credit_per_period = activity_type.max_credit_per_period,
                    "Invalid activity type in catalog"
                );
                return Err(AppError::DataIntegrity(format!(
                    "activity type {} in catalog is invalid: {}",
                    activity_type.id, errors
                )));
            }
        }

        let mut rows = stream::iter(activity_types.iter().enumerate())
            .map(|(index, activity_type)| async move {
                let entries = self
                    .ledger
                    .find_entries(
                        member_id,
                        &activity_type.id,
                        period.start_date,
                        period.end_date,
                    )
                    .await
                    .map_err(|e| {
                        e.with_context(format!(
                            "find_entries member_id={} activity_type_id={}",
                            member_id, activity_type.id
                        ))
                    })?;

                tracing::debug!(
                    member_id,
                    activity_type_id = %activity_type.id,
                    entries = entries.len(),
                    "Loaded ledger entries"
                );

                Ok::<_, AppError>((index, ActivityBreakdown::from_entries(activity_type, entries)))
            })
            .buffer_unordered(self.query_concurrency)
            .try_collect::<Vec<(usize, ActivityBreakdown)>>()
            .await?;

        rows.sort_by_key(|(index, _)| *index);
        let breakdown = rows.into_iter().map(|(_, row)| row).collect();

        let report = EvaluationReport::assemble(member_id, period, breakdown);

        tracing::info!(
            member_id,
            period_id = %period.id,
            total_credit = report.total_credit_obtained,
            required_credit = report.required_credit,
            "Evaluation report built"
        );

        Ok(report)
    }

    /// Build the report for the member's single open period.
    ///
    /// No open period is `NotFound`; several open periods is a data
    /// integrity error rather than a silent pick.
    pub async fn current_report(&self, member_id: &str) -> Result<EvaluationReport> {
        let periods = self
            .periods
            .list_periods(member_id)
            .await
            .map_err(|e| e.with_context(format!("list_periods member_id={member_id}")))?;

        let open: Vec<&EvaluationPeriod> = periods.iter().filter(|p| !p.closed).collect();

        let period = match open.as_slice() {
            [period] => *period,
            [] => {
                return Err(AppError::NotFound(format!(
                    "open evaluation period for member {}",
                    member_id
                )))
            }
            many => {
                let ids: Vec<&str> = many.iter().map(|p| p.id.as_str()).collect();
                tracing::warn!(member_id, periods = ?ids, "Multiple open evaluation periods");
                return Err(AppError::DataIntegrity(format!(
                    "member {} has {} open evaluation periods: {}",
                    member_id,
                    ids.len(),
                    ids.join(", ")
                )));
            }
        };

        self.build_report(member_id, period).await
    }

    /// Build the report for a specific period, open or closed.
    pub async fn report_for_period(
        &self,
        member_id: &str,
        period_id: &str,
    ) -> Result<EvaluationReport> {
        let period = self
            .periods
            .get_period(period_id)
            .await
            .map_err(|e| e.with_context(format!("get_period period_id={period_id}")))?
            .ok_or_else(|| AppError::NotFound(format!("evaluation period {}", period_id)))?;

        if period.member_id != member_id {
            tracing::warn!(member_id, period_id, "Period belongs to another member");
            return Err(AppError::Forbidden(format!(
                "evaluation period {} is not owned by member {}",
                period_id, member_id
            )));
        }

        self.build_report(member_id, &period).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::MemoryDb;

    fn builder() -> ReportBuilder {
        let db = Arc::new(MemoryDb::new());
        ReportBuilder::new(db.clone(), db.clone(), db)
    }

    #[test]
    fn test_query_concurrency_defaults_match_config() {
        assert_eq!(builder().query_concurrency, DEFAULT_REPORT_QUERY_CONCURRENCY);
        assert_eq!(
            Config::default().report_query_concurrency,
            builder().query_concurrency
        );
        assert_eq!(builder().with_query_concurrency(0).query_concurrency, 1);
    }
}
