//! Purge guard
//!
//! A purge is a full local wipe and must never discard rows the remote
//! store has not confirmed.

use liftsync_engine::{EngineError, EngineEvent};
use liftsync_integration_tests::{engine_fixture, seed_account};
use liftsync_store::{ALL_TABLES, Table};
use serde_json::json;

#[tokio::test]
async fn purge_aborts_while_offline_edits_are_pending() {
    let (engine, _remote, _dir) = engine_fixture();
    engine.connectivity().set_online(false);
    engine
        .store()
        .put(
            Table::BodyMetrics,
            &json!({"user_id": "u1", "recorded_on": "2025-03-01", "weight_kg": 81.0}),
        )
        .unwrap();
    engine
        .store()
        .put(
            Table::Exercises,
            &json!({"id": "e1", "user_id": "u1", "name": "squat", "is_synced": 1}),
        )
        .unwrap();

    let err = engine.safe_purge().await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("body_metrics (1)"), "message: {message}");
    assert!(!message.contains("exercises"), "message: {message}");

    // The store was left exactly as it was
    assert_eq!(engine.store().count(Table::BodyMetrics).unwrap(), 1);
    assert_eq!(engine.store().count(Table::Exercises).unwrap(), 1);
}

#[tokio::test]
async fn purge_error_enumerates_every_pending_table() {
    let (engine, _remote, _dir) = engine_fixture();
    engine.connectivity().set_online(false);
    engine
        .store()
        .put(
            Table::BodyMetrics,
            &json!({"user_id": "u1", "recorded_on": "2025-03-01", "weight_kg": 81.0}),
        )
        .unwrap();
    for log in ["l1", "l2"] {
        engine
            .store()
            .put(
                Table::WorkoutLogs,
                &json!({"id": log, "workout_id": "w1", "exercise_id": "e1", "reps": 8}),
            )
            .unwrap();
    }

    match engine.safe_purge().await.unwrap_err() {
        EngineError::PendingRows(pending) => {
            let mut names: Vec<&str> = pending.iter().map(|p| p.table).collect();
            names.sort_unstable();
            assert_eq!(names, vec!["body_metrics", "workout_logs"]);
            let total: usize = pending.iter().map(|p| p.count).sum();
            assert_eq!(total, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn clean_purge_wipes_reference_tables_too() {
    let (engine, remote, _dir) = engine_fixture();
    seed_account(&remote, "u1");
    engine.hydrate("u1").await.unwrap();
    let mut events = engine.events();

    engine.safe_purge().await.unwrap();

    for table in ALL_TABLES {
        assert_eq!(
            engine.store().count(*table).unwrap(),
            0,
            "{} survived the purge",
            table.name()
        );
    }
    assert_eq!(events.recv().await.unwrap(), EngineEvent::CacheCleared);
}

#[tokio::test]
async fn purge_succeeds_after_connectivity_returns() {
    let (engine, remote, _dir) = engine_fixture();
    engine.connectivity().set_online(false);
    engine
        .store()
        .put(
            Table::Exercises,
            &json!({"id": "e1", "user_id": "u1", "name": "squat"}),
        )
        .unwrap();

    // Offline: the guard refuses
    assert!(engine.safe_purge().await.is_err());

    // Back online: the pre-purge reconciliation drains the dirty set
    engine.connectivity().set_online(true);
    engine.safe_purge().await.unwrap();
    assert_eq!(remote.rows("exercises").len(), 1);
    assert_eq!(engine.store().count(Table::Exercises).unwrap(), 0);
}
