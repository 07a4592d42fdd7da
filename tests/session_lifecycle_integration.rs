//! End-to-end session lifecycle
//!
//! Covers the full offline-first loop: hydrate a fresh cache, edit locally
//! while the flags track dirtiness, reconcile back to the remote store, and
//! end the session with a clean wipe.

use liftsync_engine::EngineEvent;
use liftsync_integration_tests::{engine_fixture, seed_account};
use liftsync_store::{ALL_TABLES, Key, Table, WRITABLE_TABLES};
use serde_json::json;

#[tokio::test]
async fn hydrate_edit_reconcile_sign_out() {
    let (engine, remote, _dir) = engine_fixture();
    seed_account(&remote, "u1");

    // Hydration fills every table and stamps everything synced
    engine.hydrate("u1").await.unwrap();
    for table in ALL_TABLES {
        assert!(
            engine.store().count(*table).unwrap() > 0,
            "{} not hydrated",
            table.name()
        );
    }
    for table in WRITABLE_TABLES {
        assert_eq!(
            engine.store().count_dirty(*table).unwrap(),
            0,
            "{} hydrated dirty",
            table.name()
        );
    }

    // A workout logged at the gym: parent row plus line items, atomically
    engine
        .store()
        .transaction(|tx| {
            tx.put(
                Table::Workouts,
                &json!({"id": "w-2", "user_id": "u1", "routine_id": "r-push", "started_at": "2025-03-01"}),
            )?;
            tx.put(
                Table::WorkoutLogs,
                &json!({"id": "log-3", "workout_id": "w-2", "exercise_id": "e-bench", "set_number": 1, "reps": 8, "weight_kg": 82.5}),
            )?;
            tx.put(
                Table::WorkoutLogs,
                &json!({"id": "log-4", "workout_id": "w-2", "exercise_id": "e-fly", "set_number": 1, "reps": 12, "weight_kg": 14.0}),
            )?;
            Ok(())
        })
        .unwrap();
    assert_eq!(engine.store().count_dirty(Table::Workouts).unwrap(), 1);
    assert_eq!(engine.store().count_dirty(Table::WorkoutLogs).unwrap(), 2);

    // Reconcile pushes exactly the dirty rows and flips their flags
    engine.reconcile().await.unwrap();
    assert_eq!(remote.rows("workouts").len(), 2);
    assert_eq!(remote.rows("workout_logs").len(), 4);
    let workout = engine
        .store()
        .get(Table::Workouts, &Key::single("w-2"))
        .unwrap()
        .unwrap();
    assert_eq!(workout["is_synced"], 1);
    assert_eq!(engine.store().count_dirty(Table::WorkoutLogs).unwrap(), 0);

    // A second pass with nothing new sends nothing
    let batches_after_push = remote.upsert_batches().len();
    engine.reconcile().await.unwrap();
    assert_eq!(remote.upsert_batches().len(), batches_after_push);

    // Clean sign-out wipes local state and ends the remote session
    let mut events = engine.events();
    engine.sign_out(false).await.unwrap();
    for table in ALL_TABLES {
        assert_eq!(engine.store().count(*table).unwrap(), 0);
    }
    assert!(remote.session_ended());
    assert_eq!(events.recv().await.unwrap(), EngineEvent::SignedOut);
    assert!(!engine.is_hydrated());
}

#[tokio::test]
async fn local_edits_survive_a_second_hydration_attempt() {
    let (engine, remote, _dir) = engine_fixture();
    seed_account(&remote, "u1");
    engine.hydrate("u1").await.unwrap();

    // Offline edit, then something re-triggers hydration in the same session
    engine
        .store()
        .put(
            Table::BodyMetrics,
            &json!({"user_id": "u1", "recorded_on": "2025-03-01", "weight_kg": 80.8}),
        )
        .unwrap();
    engine.hydrate("u1").await.unwrap();

    // The hydration lock held: the dirty row was not clobbered
    let row = engine
        .store()
        .get(
            Table::BodyMetrics,
            &Key::composite(["u1", "2025-03-01"]),
        )
        .unwrap()
        .unwrap();
    assert_eq!(row["is_synced"], 0);
    assert_eq!(row["weight_kg"], 80.8);
}

#[tokio::test]
async fn updating_a_synced_row_makes_it_dirty_again() {
    let (engine, remote, _dir) = engine_fixture();
    seed_account(&remote, "u1");
    engine.hydrate("u1").await.unwrap();

    // Rename a hydrated routine
    let mut routine = engine
        .store()
        .get(Table::Routines, &Key::single("r-push"))
        .unwrap()
        .unwrap();
    routine["name"] = json!("Push Day A");
    routine["is_synced"] = json!(0);
    engine.store().put(Table::Routines, &routine).unwrap();
    assert_eq!(engine.store().count_dirty(Table::Routines).unwrap(), 1);

    engine.reconcile().await.unwrap();

    let remote_rows = remote.rows("routines");
    assert_eq!(remote_rows.len(), 1);
    assert_eq!(remote_rows[0]["name"], "Push Day A");
    assert_eq!(engine.store().count_dirty(Table::Routines).unwrap(), 0);
}
