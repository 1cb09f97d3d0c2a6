//! Database layer.
//!
//! The engine only talks to storage through the traits below; backends are
//! injected as `Arc<dyn …>` so tests can run against [`MemoryDb`] and
//! production against [`FirestoreDb`].

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::models::{ActivityEntry, ActivityType, EvaluationPeriod, RecurringActivityDefinition};

/// Collection names as constants.
pub mod collections {
    pub const ACTIVITY_ENTRIES: &str = "activity_entries";
    pub const ACTIVITY_TYPES: &str = "activity_types";
    pub const EVALUATION_PERIODS: &str = "evaluation_periods";
    pub const RECURRING_ACTIVITIES: &str = "recurring_activities";
}

/// Durable store of dated activity entries.
#[async_trait]
pub trait ActivityLedger: Send + Sync {
    /// Entries for one member and activity type, dated within `[from, to]`.
    async fn find_entries(
        &self,
        member_id: &str,
        activity_type_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ActivityEntry>>;
    async fn insert_entry(&self, entry: &ActivityEntry) -> Result<String>;
    async fn get_entry(&self, entry_id: &str) -> Result<Option<ActivityEntry>>;
    async fn update_entry(&self, entry: &ActivityEntry) -> Result<()>;
    async fn delete_entry(&self, entry_id: &str) -> Result<()>;
}

/// Read-only activity type reference data.
#[async_trait]
pub trait ActivityTypeCatalog: Send + Sync {
    /// All activity types, ordered by id.
    async fn list_activity_types(&self) -> Result<Vec<ActivityType>>;
    async fn get_activity_type(&self, activity_type_id: &str) -> Result<Option<ActivityType>>;
}

/// Evaluation periods, maintained by an external period-management process.
#[async_trait]
pub trait PeriodStore: Send + Sync {
    async fn list_periods(&self, member_id: &str) -> Result<Vec<EvaluationPeriod>>;
    async fn get_period(&self, period_id: &str) -> Result<Option<EvaluationPeriod>>;
    async fn upsert_period(&self, period: &EvaluationPeriod) -> Result<()>;
}

/// Recurring activity definitions with optimistic concurrency.
///
/// `save` and `save_with_entry` only succeed when the stored version equals
/// the version on the passed definition (0 for a definition not yet stored).
/// The persisted copy, with its version bumped, is returned.
#[async_trait]
pub trait RecurringStore: Send + Sync {
    async fn load_by_member(&self, member_id: &str) -> Result<Vec<RecurringActivityDefinition>>;
    async fn get(&self, definition_id: &str) -> Result<Option<RecurringActivityDefinition>>;
    async fn save(
        &self,
        definition: &RecurringActivityDefinition,
    ) -> Result<RecurringActivityDefinition>;
    /// Save the definition and insert `entry` into the ledger as one unit.
    async fn save_with_entry(
        &self,
        definition: &RecurringActivityDefinition,
        entry: &ActivityEntry,
    ) -> Result<RecurringActivityDefinition>;
    async fn delete(&self, definition_id: &str) -> Result<()>;
}

/// Version check shared by the backends.
///
/// Returns the copy to persist, with the version bumped.
pub(crate) fn next_version(
    stored: Option<&RecurringActivityDefinition>,
    definition: &RecurringActivityDefinition,
) -> Result<RecurringActivityDefinition> {
    let stored_version = match stored {
        Some(current) => current.version,
        None if definition.version == 0 => 0,
        None => {
            return Err(AppError::NotFound(format!(
                "recurring activity {}",
                definition.id
            )))
        }
    };

    if stored_version != definition.version {
        return Err(AppError::Conflict(format!(
            "recurring activity {} is at version {}, expected {}",
            definition.id, stored_version, definition.version
        )));
    }

    let mut next = definition.clone();
    next.version = stored_version + 1;
    Ok(next)
}
