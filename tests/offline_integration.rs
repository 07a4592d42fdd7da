//! Offline behavior
//!
//! While offline the engine must touch nothing remote; edits accumulate
//! locally and drain on the next reconciliation.

use liftsync_integration_tests::engine_fixture;
use liftsync_store::{Key, Table};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn offline_reconcile_makes_no_remote_calls() {
    let (engine, remote, _dir) = engine_fixture();
    engine.connectivity().set_online(false);
    engine
        .store()
        .put(
            Table::Exercises,
            &json!({"id": "e1", "user_id": "u1", "name": "squat"}),
        )
        .unwrap();

    engine.reconcile().await.unwrap();

    assert!(remote.fetches().is_empty());
    assert!(remote.upsert_batches().is_empty());
    assert_eq!(engine.store().count_dirty(Table::Exercises).unwrap(), 1);
}

#[tokio::test]
async fn offline_edits_drain_after_reconnect() {
    let (engine, remote, _dir) = engine_fixture();
    engine.connectivity().set_online(false);

    // A week of offline training
    for day in 1..=3 {
        engine
            .store()
            .put(
                Table::BodyMetrics,
                &json!({"user_id": "u1", "recorded_on": format!("2025-03-0{day}"), "weight_kg": 81.0 - day as f64 * 0.2}),
            )
            .unwrap();
    }
    engine.reconcile().await.unwrap();
    assert!(remote.rows("body_metrics").is_empty());

    engine.connectivity().set_online(true);
    engine.reconcile().await.unwrap();

    assert_eq!(remote.rows("body_metrics").len(), 3);
    assert_eq!(remote.upsert_count("body_metrics"), 1);
    assert_eq!(engine.store().count_dirty(Table::BodyMetrics).unwrap(), 0);
}

#[tokio::test]
async fn reconnect_watcher_drains_the_backlog() {
    let (engine, remote, _dir) = engine_fixture();
    engine.connectivity().set_online(false);
    engine
        .store()
        .put(
            Table::Exercises,
            &json!({"id": "e1", "user_id": "u1", "name": "squat"}),
        )
        .unwrap();

    let _watcher = engine.spawn_reconnect_watcher();
    engine.connectivity().set_online(true);

    for _ in 0..50 {
        if remote.upsert_count("exercises") == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(remote.upsert_count("exercises"), 1);
    assert_eq!(engine.store().count_dirty(Table::Exercises).unwrap(), 0);
}

#[tokio::test]
async fn delete_propagates_only_while_online() {
    let (engine, remote, _dir) = engine_fixture();
    remote.seed(
        "exercises",
        vec![
            json!({"id": "e1", "user_id": "u1", "name": "squat"}),
            json!({"id": "e2", "user_id": "u1", "name": "press"}),
        ],
    );
    engine.hydrate("u1").await.unwrap();

    // Online delete reaches the remote store
    engine
        .delete_row(Table::Exercises, &Key::single("e1"))
        .await
        .unwrap();
    assert_eq!(remote.rows("exercises").len(), 1);

    // Offline delete is local-only
    engine.connectivity().set_online(false);
    engine
        .delete_row(Table::Exercises, &Key::single("e2"))
        .await
        .unwrap();
    assert_eq!(engine.store().count(Table::Exercises).unwrap(), 0);
    assert_eq!(remote.rows("exercises").len(), 1);
}
