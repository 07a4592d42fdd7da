//! Push ordering
//!
//! Parent tables must reach the remote store before the relation and log
//! tables that reference them, and the relation tables must never start
//! while a parent push is still outstanding.

use liftsync_integration_tests::engine_fixture;
use liftsync_store::{PUSH_PHASE_ONE, PUSH_PHASE_TWO, Table};
use serde_json::json;

#[tokio::test]
async fn workouts_push_before_their_logs() {
    let (engine, remote, _dir) = engine_fixture();
    engine
        .store()
        .put(
            Table::Workouts,
            &json!({"id": "w1", "user_id": "u1", "started_at": "2025-03-01"}),
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

    engine.reconcile().await.unwrap();

    let batches = remote.upsert_batches();
    let workouts_at = batches.iter().position(|b| b.table == "workouts").unwrap();
    let logs_at = batches
        .iter()
        .position(|b| b.table == "workout_logs")
        .unwrap();
    assert!(
        workouts_at < logs_at,
        "workout_logs pushed before workouts: {batches:?}"
    );
}

#[tokio::test]
async fn phase_one_pushes_in_declared_order_and_fully_precedes_phase_two() {
    let (engine, remote, _dir) = engine_fixture();

    // One dirty row in every writable table
    engine
        .store()
        .put(Table::UserProfiles, &json!({"user_id": "u1", "display_name": "Sam"}))
        .unwrap();
    engine
        .store()
        .put(
            Table::BodyMetrics,
            &json!({"user_id": "u1", "recorded_on": "2025-03-01", "weight_kg": 81.0}),
        )
        .unwrap();
    engine
        .store()
        .put(Table::Muscles, &json!({"id": "m1", "user_id": "u1", "name": "chest"}))
        .unwrap();
    engine
        .store()
        .put(Table::Exercises, &json!({"id": "e1", "user_id": "u1", "name": "bench"}))
        .unwrap();
    engine
        .store()
        .put(Table::Routines, &json!({"id": "r1", "user_id": "u1", "name": "push"}))
        .unwrap();
    engine
        .store()
        .put(
            Table::Workouts,
            &json!({"id": "w1", "user_id": "u1", "routine_id": "r1", "started_at": "2025-03-01"}),
        )
        .unwrap();
    engine
        .store()
        .put(
            Table::ExerciseMuscles,
            &json!({"exercise_id": "e1", "muscle_id": "m1"}),
        )
        .unwrap();
    engine
        .store()
        .put(
            Table::RoutineExercises,
            &json!({"routine_id": "r1", "exercise_id": "e1", "position": 1}),
        )
        .unwrap();
    engine
        .store()
        .put(
            Table::WorkoutLogs,
            &json!({"id": "l1", "workout_id": "w1", "exercise_id": "e1", "reps": 8}),
        )
        .unwrap();

    engine.reconcile().await.unwrap();

    let batches = remote.upsert_batches();
    assert_eq!(batches.len(), PUSH_PHASE_ONE.len() + PUSH_PHASE_TWO.len());

    // Phase 1 batches arrive first, in exactly the declared order
    let phase_one_names: Vec<&str> = PUSH_PHASE_ONE.iter().map(|t| t.name()).collect();
    let observed: Vec<&str> = batches
        .iter()
        .take(phase_one_names.len())
        .map(|b| b.table.as_str())
        .collect();
    assert_eq!(observed, phase_one_names);

    // Phase 2 batches all arrive afterwards, in no particular order
    let mut tail: Vec<&str> = batches
        .iter()
        .skip(phase_one_names.len())
        .map(|b| b.table.as_str())
        .collect();
    tail.sort_unstable();
    let mut phase_two_names: Vec<&str> = PUSH_PHASE_TWO.iter().map(|t| t.name()).collect();
    phase_two_names.sort_unstable();
    assert_eq!(tail, phase_two_names);
}

#[tokio::test]
async fn tables_without_dirty_rows_are_not_pushed() {
    let (engine, remote, _dir) = engine_fixture();
    engine
        .store()
        .put(Table::Exercises, &json!({"id": "e1", "user_id": "u1", "name": "bench"}))
        .unwrap();

    engine.reconcile().await.unwrap();

    let batches = remote.upsert_batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].table, "exercises");
    assert_eq!(batches[0].on_conflict, "id");
}
