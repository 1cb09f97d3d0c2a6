// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Direct activity logging, editing and deletion.

use cpd_tracker::db::{ActivityLedger, MemoryDb};
use cpd_tracker::error::AppError;
use cpd_tracker::models::NewActivityEntry;
use cpd_tracker::AppState;

mod common;
use common::{activity_type, create_test_state, date};

const MEMBER: &str = "m-1";

fn setup() -> (MemoryDb, AppState) {
    let db = MemoryDb::new();
    db.upsert_activity_type(activity_type("course", "structured", 2.0, 20.0));
    db.upsert_activity_type(activity_type("reading", "self-directed", 0.5, 5.0));
    let state = create_test_state(&db);
    (db, state)
}

fn input(type_id: &str, on: &str, quantity: f64) -> NewActivityEntry {
    NewActivityEntry {
        activity_type_id: type_id.to_string(),
        date: date(on),
        quantity,
        description: "Ethics module".to_string(),
        evidence: true,
    }
}

#[tokio::test]
async fn test_log_captures_catalog_rate() {
    let (db, state) = setup();

    let entry = state
        .activity_log
        .log_activity(MEMBER, input("course", "2024-04-02", 3.0))
        .await
        .unwrap();

    assert_eq!(entry.unit_credit_value, 2.0);
    assert_eq!(entry.member_id, MEMBER);
    assert!(entry.evidence);
    assert_eq!(db.get_entry(&entry.id).await.unwrap(), Some(entry.clone()));

    // Later catalog changes leave the captured rate alone.
    db.upsert_activity_type(activity_type("course", "structured", 3.0, 20.0));
    let stored = db.get_entry(&entry.id).await.unwrap().unwrap();
    assert_eq!(stored.unit_credit_value, 2.0);
}

#[tokio::test]
async fn test_log_rejects_invalid_input() {
    let (db, state) = setup();

    let err = state
        .activity_log
        .log_activity(MEMBER, input("course", "2024-04-02", 0.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = state
        .activity_log
        .log_activity(MEMBER, input("unknown", "2024-04-02", 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    assert_eq!(db.entry_count(), 0);
}

#[tokio::test]
async fn test_update_revalidates_and_keeps_rate() {
    let (db, state) = setup();
    let entry = state
        .activity_log
        .log_activity(MEMBER, input("course", "2024-04-02", 3.0))
        .await
        .unwrap();
    db.upsert_activity_type(activity_type("course", "structured", 5.0, 20.0));

    let mut edit = input("course", "2024-04-03", 4.0);
    edit.description = "Ethics module, corrected".to_string();
    let updated = state
        .activity_log
        .update_activity(MEMBER, &entry.id, edit)
        .await
        .unwrap();

    assert_eq!(updated.date, date("2024-04-03"));
    assert_eq!(updated.quantity, 4.0);
    assert_eq!(updated.unit_credit_value, 2.0);
    assert_eq!(updated.created_at, entry.created_at);

    let err = state
        .activity_log
        .update_activity(MEMBER, &entry.id, input("course", "2024-04-03", -1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = state
        .activity_log
        .update_activity(MEMBER, &entry.id, input("reading", "2024-04-03", 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_entries_are_owner_only() {
    let (db, state) = setup();
    let entry = state
        .activity_log
        .log_activity(MEMBER, input("reading", "2024-04-02", 2.0))
        .await
        .unwrap();

    let err = state
        .activity_log
        .update_activity("m-2", &entry.id, input("reading", "2024-04-02", 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = state
        .activity_log
        .delete_activity("m-2", &entry.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    state
        .activity_log
        .delete_activity(MEMBER, &entry.id)
        .await
        .unwrap();
    assert_eq!(db.entry_count(), 0);

    let err = state
        .activity_log
        .delete_activity(MEMBER, &entry.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
