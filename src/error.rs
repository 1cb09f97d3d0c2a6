// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared by the evaluation and recurrence engines.

use chrono::NaiveDate;

/// Application error type.
///
/// Caller errors (bad input, not yet due, wrong owner, lost race) are kept
/// apart from datastore faults so callers can tell "nothing to do" from
/// "something broke".
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Recurring activity {definition_id} is not due until {next_due_at}")]
    NotDue {
        definition_id: String,
        next_due_at: NaiveDate,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True when the error was caused by the request rather than the system.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::NotDue { .. }
                | AppError::NotFound(_)
                | AppError::Forbidden(_)
                | AppError::Conflict(_)
        )
    }

    /// True for the idempotency guard on record/skip.
    pub fn is_not_due(&self) -> bool {
        matches!(self, AppError::NotDue { .. })
    }

    /// Prefix datastore and internal errors with diagnostic context.
    ///
    /// Caller errors pass through untouched so their kind stays matchable.
    pub fn with_context(self, context: impl std::fmt::Display) -> Self {
        match self {
            AppError::Database(msg) => AppError::Database(format!("{context}: {msg}")),
            AppError::Internal(err) => AppError::Internal(err.context(context.to_string())),
            other => other,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_context_tags_database_errors() {
        let err = AppError::Database("deadline exceeded".to_string())
            .with_context("activity_type_id=conf");
        assert_eq!(
            err.to_string(),
            "Database error: activity_type_id=conf: deadline exceeded"
        );
    }

    #[test]
    fn test_with_context_leaves_caller_errors_alone() {
        let err = AppError::NotFound("period p1".to_string()).with_context("ignored");
        assert!(matches!(err, AppError::NotFound(ref m) if m == "period p1"));
    }

    #[test]
    fn test_internal_context_is_kept_in_chain() {
        let err = AppError::Internal(anyhow::anyhow!("boom")).with_context("load_by_member");
        let AppError::Internal(inner) = err else {
            panic!("expected internal error");
        };
        assert_eq!(inner.to_string(), "load_by_member");
        assert_eq!(inner.root_cause().to_string(), "boom");
    }
}
