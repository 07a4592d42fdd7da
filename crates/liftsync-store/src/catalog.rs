//! Static table catalog.
//!
//! Every cached table is declared here once: its primary-key shape, declared
//! secondary indexes, whether local edits are pushed back to the remote
//! store, how the table is hydrated at session start, and the remote source
//! it mirrors. The rest of the crate (and the sync engine above it) dispatch
//! on [`Table`] variants instead of raw table-name strings.

use crate::key::KeySpec;

/// How a table is populated during session hydration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationClass {
    /// Static reference data, pulled wholesale with no filter.
    Static,
    /// Server-maintained latest-snapshot view, pulled with no filter.
    Snapshot,
    /// User-owned rows, pulled filtered by user id.
    UserOwned,
    /// Relational/log rows, pulled as the full set.
    Relational,
}

/// Identifies one cached table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Equipment,
    LatestBodyMetrics,
    UserProfiles,
    BodyMetrics,
    Muscles,
    Exercises,
    Routines,
    Workouts,
    ExerciseMuscles,
    RoutineExercises,
    WorkoutLogs,
}

/// Schema shape for one cached table.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    /// Local table name, also the SQLite table name.
    pub name: &'static str,
    /// Remote source this table mirrors. Identical to `name` for every
    /// table today; kept separate so a rename on either side stays a
    /// one-line change.
    pub remote_source: &'static str,
    /// Primary-key fields in conflict-target order.
    pub key: KeySpec,
    /// Declared secondary indexes.
    pub indexes: &'static [&'static [&'static str]],
    /// Whether local edits are pushed back to the remote store.
    pub writable: bool,
    /// How the table is pulled at session start.
    pub hydration: HydrationClass,
}

const EQUIPMENT: TableSpec = TableSpec {
    name: "equipment",
    remote_source: "equipment",
    key: KeySpec::new(&["id"]),
    indexes: &[],
    writable: false,
    hydration: HydrationClass::Static,
};

const LATEST_BODY_METRICS: TableSpec = TableSpec {
    name: "latest_body_metrics",
    remote_source: "latest_body_metrics",
    key: KeySpec::new(&["user_id"]),
    indexes: &[],
    writable: false,
    hydration: HydrationClass::Snapshot,
};

const USER_PROFILES: TableSpec = TableSpec {
    name: "user_profiles",
    remote_source: "user_profiles",
    key: KeySpec::new(&["user_id"]),
    indexes: &[],
    writable: true,
    hydration: HydrationClass::UserOwned,
};

const BODY_METRICS: TableSpec = TableSpec {
    name: "body_metrics",
    remote_source: "body_metrics",
    key: KeySpec::new(&["user_id", "recorded_on"]),
    indexes: &[],
    writable: true,
    hydration: HydrationClass::UserOwned,
};

const MUSCLES: TableSpec = TableSpec {
    name: "muscles",
    remote_source: "muscles",
    key: KeySpec::new(&["id"]),
    indexes: &[&["user_id"]],
    writable: true,
    hydration: HydrationClass::UserOwned,
};

const EXERCISES: TableSpec = TableSpec {
    name: "exercises",
    remote_source: "exercises",
    key: KeySpec::new(&["id"]),
    indexes: &[&["user_id"]],
    writable: true,
    hydration: HydrationClass::UserOwned,
};

const ROUTINES: TableSpec = TableSpec {
    name: "routines",
    remote_source: "routines",
    key: KeySpec::new(&["id"]),
    indexes: &[&["user_id"]],
    writable: true,
    hydration: HydrationClass::UserOwned,
};

const WORKOUTS: TableSpec = TableSpec {
    name: "workouts",
    remote_source: "workouts",
    key: KeySpec::new(&["id"]),
    indexes: &[&["user_id", "started_at"]],
    writable: true,
    hydration: HydrationClass::UserOwned,
};

const EXERCISE_MUSCLES: TableSpec = TableSpec {
    name: "exercise_muscles",
    remote_source: "exercise_muscles",
    key: KeySpec::new(&["exercise_id", "muscle_id"]),
    indexes: &[],
    writable: true,
    hydration: HydrationClass::Relational,
};

const ROUTINE_EXERCISES: TableSpec = TableSpec {
    name: "routine_exercises",
    remote_source: "routine_exercises",
    key: KeySpec::new(&["routine_id", "exercise_id"]),
    indexes: &[],
    writable: true,
    hydration: HydrationClass::Relational,
};

const WORKOUT_LOGS: TableSpec = TableSpec {
    name: "workout_logs",
    remote_source: "workout_logs",
    key: KeySpec::new(&["id"]),
    indexes: &[&["workout_id"], &["exercise_id"]],
    writable: true,
    hydration: HydrationClass::Relational,
};

impl Table {
    /// Schema shape for this table.
    pub const fn spec(self) -> &'static TableSpec {
        match self {
            Table::Equipment => &EQUIPMENT,
            Table::LatestBodyMetrics => &LATEST_BODY_METRICS,
            Table::UserProfiles => &USER_PROFILES,
            Table::BodyMetrics => &BODY_METRICS,
            Table::Muscles => &MUSCLES,
            Table::Exercises => &EXERCISES,
            Table::Routines => &ROUTINES,
            Table::Workouts => &WORKOUTS,
            Table::ExerciseMuscles => &EXERCISE_MUSCLES,
            Table::RoutineExercises => &ROUTINE_EXERCISES,
            Table::WorkoutLogs => &WORKOUT_LOGS,
        }
    }

    pub const fn name(self) -> &'static str {
        self.spec().name
    }
}

/// Every cached table.
pub const ALL_TABLES: &[Table] = &[
    Table::Equipment,
    Table::LatestBodyMetrics,
    Table::UserProfiles,
    Table::BodyMetrics,
    Table::Muscles,
    Table::Exercises,
    Table::Routines,
    Table::Workouts,
    Table::ExerciseMuscles,
    Table::RoutineExercises,
    Table::WorkoutLogs,
];

/// Writable tables, the set the purge guard checks for unpushed rows.
pub const WRITABLE_TABLES: &[Table] = &[
    Table::UserProfiles,
    Table::BodyMetrics,
    Table::Muscles,
    Table::Exercises,
    Table::Routines,
    Table::Workouts,
    Table::ExerciseMuscles,
    Table::RoutineExercises,
    Table::WorkoutLogs,
];

/// Parent tables, pushed one at a time in exactly this order so entities
/// land before the relations and logs that reference them.
pub const PUSH_PHASE_ONE: &[Table] = &[
    Table::UserProfiles,
    Table::BodyMetrics,
    Table::Muscles,
    Table::Exercises,
    Table::Routines,
    Table::Workouts,
];

/// Relation and log tables, pushed concurrently once phase one has fully
/// completed.
pub const PUSH_PHASE_TWO: &[Table] = &[
    Table::ExerciseMuscles,
    Table::RoutineExercises,
    Table::WorkoutLogs,
];
