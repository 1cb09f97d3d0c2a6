// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides the store traits over four collections:
//! - Activity entries (the ledger)
//! - Activity types (catalog reference data)
//! - Evaluation periods
//! - Recurring activity definitions

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::db::{
    collections, next_version, ActivityLedger, ActivityTypeCatalog, PeriodStore, RecurringStore,
};
use crate::error::{AppError, Result};
use crate::models::{ActivityEntry, ActivityType, EvaluationPeriod, RecurringActivityDefinition};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Catalog Maintenance ─────────────────────────────────────

    /// Create or update an activity type.
    pub async fn upsert_activity_type(&self, activity_type: &ActivityType) -> Result<()> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVITY_TYPES)
            .document_id(&activity_type.id)
            .object(activity_type)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Atomic Definition Writes ────────────────────────────────

    /// Version-checked definition write, optionally with a ledger entry.
    ///
    /// The stored definition is read through the transaction so a concurrent
    /// writer makes the commit fail instead of silently overwriting.
    async fn commit_definition(
        &self,
        definition: &RecurringActivityDefinition,
        entry: Option<&ActivityEntry>,
    ) -> Result<RecurringActivityDefinition> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let tx_client = client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );

        let stored: Option<RecurringActivityDefinition> = match tx_client
            .fluent()
            .select()
            .by_id_in(collections::RECURRING_ACTIVITIES)
            .obj()
            .one(&definition.id)
            .await
        {
            Ok(stored) => stored,
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(transaction_error(e, "Failed to read definition in transaction"));
            }
        };

        let next = match next_version(stored.as_ref(), definition) {
            Ok(next) => next,
            Err(err) => {
                let _ = transaction.rollback().await;
                return Err(err);
            }
        };

        if let Some(entry) = entry {
            client
                .fluent()
                .update()
                .in_col(collections::ACTIVITY_ENTRIES)
                .document_id(&entry.id)
                .object(entry)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add entry to transaction: {}", e))
                })?;
        }

        client
            .fluent()
            .update()
            .in_col(collections::RECURRING_ACTIVITIES)
            .document_id(&next.id)
            .object(&next)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add definition to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| transaction_error(e, "Transaction commit failed"))?;

        tracing::debug!(
            definition_id = %next.id,
            version = next.version,
            with_entry = entry.is_some(),
            "Recurring definition committed"
        );

        Ok(next)
    }
}

/// Map a failed transactional read or commit.
///
/// Firestore resolves contention between transactions by aborting one of
/// them; that is a lost race, not a datastore fault.
fn transaction_error(err: firestore::errors::FirestoreError, action: &str) -> AppError {
    if is_contention(&err) {
        tracing::debug!(error = %err, action, "Transaction lost to a concurrent writer");
        AppError::Conflict(format!("{}: concurrent update: {}", action, err))
    } else {
        AppError::Database(format!("{}: {}", action, err))
    }
}

fn is_contention(err: &firestore::errors::FirestoreError) -> bool {
    use firestore::errors::FirestoreError;

    match err {
        FirestoreError::DataConflictError(_) => true,
        FirestoreError::DatabaseError(db_err) => {
            db_err.public.code.eq_ignore_ascii_case("aborted")
                || db_err.details.to_ascii_lowercase().contains("contention")
        }
        _ => false,
    }
}

#[async_trait]
impl ActivityLedger for FirestoreDb {
    async fn find_entries(
        &self,
        member_id: &str,
        activity_type_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ActivityEntry>> {
        // Dates are stored as ISO strings, which sort chronologically.
        let from = from.to_string();
        let to = to.to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITY_ENTRIES)
            .filter(|q| {
                q.for_all([
                    q.field("member_id").eq(member_id),
                    q.field("activity_type_id").eq(activity_type_id),
                    q.field("date").greater_than_or_equal(from.as_str()),
                    q.field("date").less_than_or_equal(to.as_str()),
                ])
            })
            .order_by([("date", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert_entry(&self, entry: &ActivityEntry) -> Result<String> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVITY_ENTRIES)
            .document_id(&entry.id)
            .object(entry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(entry.id.clone())
    }

    async fn get_entry(&self, entry_id: &str) -> Result<Option<ActivityEntry>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITY_ENTRIES)
            .obj()
            .one(entry_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace an existing entry.
    ///
    /// The existence check and the write share a transaction, so a racing
    /// delete either wins outright (`NotFound`) or aborts this update
    /// (`Conflict`) instead of being undone by it.
    async fn update_entry(&self, entry: &ActivityEntry) -> Result<()> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let tx_client = client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );

        let stored: Option<ActivityEntry> = match tx_client
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITY_ENTRIES)
            .obj()
            .one(&entry.id)
            .await
        {
            Ok(stored) => stored,
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(transaction_error(e, "Failed to read entry in transaction"));
            }
        };

        if stored.is_none() {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("activity entry {}", entry.id)));
        }

        client
            .fluent()
            .update()
            .in_col(collections::ACTIVITY_ENTRIES)
            .document_id(&entry.id)
            .object(entry)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add entry to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| transaction_error(e, "Transaction commit failed"))?;
        Ok(())
    }

    async fn delete_entry(&self, entry_id: &str) -> Result<()> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::ACTIVITY_ENTRIES)
            .document_id(entry_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ActivityTypeCatalog for FirestoreDb {
    async fn list_activity_types(&self) -> Result<Vec<ActivityType>> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITY_TYPES)
            .order_by([("id", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_activity_type(&self, activity_type_id: &str) -> Result<Option<ActivityType>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITY_TYPES)
            .obj()
            .one(activity_type_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl PeriodStore for FirestoreDb {
    async fn list_periods(&self, member_id: &str) -> Result<Vec<EvaluationPeriod>> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::EVALUATION_PERIODS)
            .filter(|q| q.for_all([q.field("member_id").eq(member_id)]))
            .order_by([(
                "start_date",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_period(&self, period_id: &str) -> Result<Option<EvaluationPeriod>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::EVALUATION_PERIODS)
            .obj()
            .one(period_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn upsert_period(&self, period: &EvaluationPeriod) -> Result<()> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::EVALUATION_PERIODS)
            .document_id(&period.id)
            .object(period)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl RecurringStore for FirestoreDb {
    async fn load_by_member(&self, member_id: &str) -> Result<Vec<RecurringActivityDefinition>> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::RECURRING_ACTIVITIES)
            .filter(|q| q.for_all([q.field("member_id").eq(member_id)]))
            .order_by([(
                "next_due_at",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get(&self, definition_id: &str) -> Result<Option<RecurringActivityDefinition>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::RECURRING_ACTIVITIES)
            .obj()
            .one(definition_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn save(
        &self,
        definition: &RecurringActivityDefinition,
    ) -> Result<RecurringActivityDefinition> {
        self.commit_definition(definition, None).await
    }

    async fn save_with_entry(
        &self,
        definition: &RecurringActivityDefinition,
        entry: &ActivityEntry,
    ) -> Result<RecurringActivityDefinition> {
        self.commit_definition(definition, Some(entry)).await
    }

    async fn delete(&self, definition_id: &str) -> Result<()> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::RECURRING_ACTIVITIES)
            .document_id(definition_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
