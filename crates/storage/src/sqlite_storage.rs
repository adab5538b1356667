//! SQLite storage backend for gymtrack.
//!
//! Relational tables with foreign keys, so deleting a workout cascades to its
//! exercises, sets and sessions. This is the backend the CLI runs on.

use std::path::Path;
use std::str::FromStr;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use gymtrack_core::{
    Exercise, ExerciseId, ExerciseType, ExerciseTypeId, SessionId, SetId, UserId, Workout,
    WorkoutId, WorkoutSession, WorkoutSet,
};
use tracing::debug;

use super::trait_::{Storage, StorageError, Result};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS workouts (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        started_at TEXT NOT NULL,
        ended_at TEXT,
        completed INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS exercise_types (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        url TEXT NOT NULL DEFAULT '',
        group_code TEXT NOT NULL DEFAULT '',
        rest_in_seconds INTEGER NOT NULL DEFAULT 0,
        accent TEXT NOT NULL DEFAULT '',
        units TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS exercises (
        id INTEGER PRIMARY KEY,
        workout_id INTEGER NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
        exercise_type_id INTEGER NOT NULL,
        exercise_index INTEGER NOT NULL,
        target_sets INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS sets (
        id INTEGER PRIMARY KEY,
        exercise_id INTEGER NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
        set_index INTEGER NOT NULL,
        reps INTEGER NOT NULL DEFAULT 0,
        weight REAL NOT NULL DEFAULT 0,
        minutes INTEGER NOT NULL DEFAULT 0,
        meters INTEGER NOT NULL DEFAULT 0,
        completed INTEGER NOT NULL DEFAULT 0,
        completed_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS workout_sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        workout_id INTEGER NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
        current_exercise_index INTEGER NOT NULL,
        started_at TEXT NOT NULL,
        is_active INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_exercises_workout ON exercises(workout_id, exercise_index)",
    "CREATE INDEX IF NOT EXISTS idx_sets_exercise ON sets(exercise_id, set_index)",
    "CREATE INDEX IF NOT EXISTS idx_sessions_workout ON workout_sessions(workout_id, is_active)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_one_active
        ON workout_sessions(workout_id) WHERE is_active = 1",
];

/// SQLite storage implementation.
#[derive(Clone)]
pub struct SqliteStorage {
    /// Database connection pool
    pool: sqlx::SqlitePool,
}

impl SqliteStorage {
    /// Open (creating if missing) a database file.
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        let storage = Self { pool };
        storage.init_schema().await?;

        Ok(storage)
    }

    /// Create an in-memory SQLite storage for testing.
    ///
    /// A single long-lived connection keeps the database alive.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let storage = Self { pool };
        storage.init_schema().await?;

        Ok(storage)
    }

    /// Initialize the database schema.
    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn to_u32(value: i64, column: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| StorageError::Other(format!("column {} holds out-of-range value {}", column, value)))
}

fn workout_from_row(row: &SqliteRow) -> Result<Workout> {
    Ok(Workout {
        id: WorkoutId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        name: row.try_get("name")?,
        started_at: row.try_get("started_at")?,
        ended_at: row.try_get("ended_at")?,
        completed: row.try_get("completed")?,
    })
}

fn exercise_from_row(row: &SqliteRow) -> Result<Exercise> {
    Ok(Exercise {
        id: ExerciseId(row.try_get("id")?),
        workout_id: WorkoutId(row.try_get("workout_id")?),
        exercise_type_id: ExerciseTypeId(row.try_get("exercise_type_id")?),
        index: row.try_get("exercise_index")?,
        target_sets: to_u32(row.try_get("target_sets")?, "target_sets")?,
    })
}

fn exercise_type_from_row(row: &SqliteRow) -> Result<ExerciseType> {
    Ok(ExerciseType {
        id: ExerciseTypeId(row.try_get("id")?),
        name: row.try_get("name")?,
        url: row.try_get("url")?,
        group_code: row.try_get("group_code")?,
        rest_in_seconds: to_u32(row.try_get("rest_in_seconds")?, "rest_in_seconds")?,
        accent: row.try_get("accent")?,
        units: row.try_get("units")?,
    })
}

fn set_from_row(row: &SqliteRow) -> Result<WorkoutSet> {
    Ok(WorkoutSet {
        id: SetId(row.try_get("id")?),
        exercise_id: ExerciseId(row.try_get("exercise_id")?),
        index: row.try_get("set_index")?,
        reps: to_u32(row.try_get("reps")?, "reps")?,
        weight: row.try_get("weight")?,
        minutes: to_u32(row.try_get("minutes")?, "minutes")?,
        meters: to_u32(row.try_get("meters")?, "meters")?,
        completed: row.try_get("completed")?,
        completed_at: row.try_get("completed_at")?,
    })
}

fn session_from_row(row: &SqliteRow) -> Result<WorkoutSession> {
    Ok(WorkoutSession {
        id: SessionId(row.try_get("id")?),
        workout_id: WorkoutId(row.try_get("workout_id")?),
        current_exercise_index: row.try_get("current_exercise_index")?,
        started_at: row.try_get("started_at")?,
        is_active: row.try_get("is_active")?,
    })
}

#[async_trait]
impl Storage for SqliteStorage {
    // === Workout operations ===

    async fn save_workout(&self, workout: &Workout) -> Result<()> {
        sqlx::query(
            "INSERT INTO workouts (id, user_id, name, started_at, ended_at, completed)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                user_id = excluded.user_id,
                name = excluded.name,
                started_at = excluded.started_at,
                ended_at = excluded.ended_at,
                completed = excluded.completed",
        )
        .bind(workout.id.get())
        .bind(workout.user_id.get())
        .bind(&workout.name)
        .bind(workout.started_at)
        .bind(workout.ended_at)
        .bind(workout.completed)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_workout(&self, id: WorkoutId) -> Result<Option<Workout>> {
        let row = sqlx::query("SELECT * FROM workouts WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(workout_from_row).transpose()
    }

    async fn delete_workout(&self, id: WorkoutId) -> Result<()> {
        let result = sqlx::query("DELETE FROM workouts WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("workout {}", id)));
        }
        debug!("Deleted workout {}", id);
        Ok(())
    }

    // === Exercise operations ===

    async fn save_exercise(&self, exercise: &Exercise) -> Result<()> {
        sqlx::query(
            "INSERT INTO exercises (id, workout_id, exercise_type_id, exercise_index, target_sets)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                workout_id = excluded.workout_id,
                exercise_type_id = excluded.exercise_type_id,
                exercise_index = excluded.exercise_index,
                target_sets = excluded.target_sets",
        )
        .bind(exercise.id.get())
        .bind(exercise.workout_id.get())
        .bind(exercise.exercise_type_id.get())
        .bind(exercise.index)
        .bind(i64::from(exercise.target_sets))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_exercises(&self, workout_id: WorkoutId) -> Result<Vec<Exercise>> {
        let rows = sqlx::query(
            "SELECT * FROM exercises WHERE workout_id = ? ORDER BY exercise_index, id",
        )
        .bind(workout_id.get())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(exercise_from_row).collect()
    }

    async fn save_exercise_type(&self, exercise_type: &ExerciseType) -> Result<()> {
        sqlx::query(
            "INSERT INTO exercise_types (id, name, url, group_code, rest_in_seconds, accent, units)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                url = excluded.url,
                group_code = excluded.group_code,
                rest_in_seconds = excluded.rest_in_seconds,
                accent = excluded.accent,
                units = excluded.units",
        )
        .bind(exercise_type.id.get())
        .bind(&exercise_type.name)
        .bind(&exercise_type.url)
        .bind(&exercise_type.group_code)
        .bind(i64::from(exercise_type.rest_in_seconds))
        .bind(&exercise_type.accent)
        .bind(&exercise_type.units)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_exercise_type(&self, id: ExerciseTypeId) -> Result<Option<ExerciseType>> {
        let row = sqlx::query("SELECT * FROM exercise_types WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(exercise_type_from_row).transpose()
    }

    // === Session operations ===

    async fn load_session(&self, workout_id: WorkoutId) -> Result<Option<WorkoutSession>> {
        let row = sqlx::query(
            "SELECT * FROM workout_sessions
            WHERE workout_id = ? AND is_active = 1
            ORDER BY id DESC LIMIT 1",
        )
        .bind(workout_id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn create_session(&self, session: &WorkoutSession) -> Result<SessionId> {
        let result = sqlx::query(
            "INSERT INTO workout_sessions (workout_id, current_exercise_index, started_at, is_active)
            VALUES (?, ?, ?, ?)",
        )
        .bind(session.workout_id.get())
        .bind(session.current_exercise_index)
        .bind(session.started_at)
        .bind(session.is_active)
        .execute(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict(
                format!("workout {} already has an active session", session.workout_id),
            ),
            other => StorageError::Database(other),
        })?;

        Ok(SessionId(result.last_insert_rowid()))
    }

    async fn save_session(&self, session: &WorkoutSession) -> Result<()> {
        let result = sqlx::query(
            "UPDATE workout_sessions
            SET workout_id = ?, current_exercise_index = ?, started_at = ?, is_active = ?
            WHERE id = ?",
        )
        .bind(session.workout_id.get())
        .bind(session.current_exercise_index)
        .bind(session.started_at)
        .bind(session.is_active)
        .bind(session.id.get())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("session {}", session.id)));
        }
        Ok(())
    }

    // === Set operations ===

    async fn save_set(&self, set: &WorkoutSet) -> Result<()> {
        sqlx::query(
            "INSERT INTO sets (id, exercise_id, set_index, reps, weight, minutes, meters, completed, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                exercise_id = excluded.exercise_id,
                set_index = excluded.set_index,
                reps = excluded.reps,
                weight = excluded.weight,
                minutes = excluded.minutes,
                meters = excluded.meters,
                completed = excluded.completed,
                completed_at = excluded.completed_at",
        )
        .bind(set.id.get())
        .bind(set.exercise_id.get())
        .bind(set.index)
        .bind(i64::from(set.reps))
        .bind(set.weight)
        .bind(i64::from(set.minutes))
        .bind(i64::from(set.meters))
        .bind(set.completed)
        .bind(set.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_set(&self, id: SetId) -> Result<Option<WorkoutSet>> {
        let row = sqlx::query("SELECT * FROM sets WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(set_from_row).transpose()
    }

    async fn list_sets(&self, exercise_id: ExerciseId) -> Result<Vec<WorkoutSet>> {
        let rows = sqlx::query("SELECT * FROM sets WHERE exercise_id = ? ORDER BY set_index, id")
            .bind(exercise_id.get())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(set_from_row).collect()
    }

    async fn count_sets(&self, exercise_id: ExerciseId) -> Result<u32> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sets WHERE exercise_id = ?")
            .bind(exercise_id.get())
            .fetch_one(&self.pool)
            .await?;

        to_u32(count, "count")
    }

    async fn count_completed_sets(&self, exercise_id: ExerciseId) -> Result<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sets WHERE exercise_id = ? AND completed = 1",
        )
        .bind(exercise_id.get())
        .fetch_one(&self.pool)
        .await?;

        to_u32(count, "count")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> SqliteStorage {
        let storage = SqliteStorage::in_memory().await.unwrap();
        storage.save_workout(&Workout::new(WorkoutId(1), UserId(7), "Legs")).await.unwrap();
        storage
            .save_exercise_type(&ExerciseType::new(ExerciseTypeId(3), "Squat").with_rest(120))
            .await
            .unwrap();
        for (id, index) in [(20, 1), (21, 0)] {
            let exercise = Exercise::new(ExerciseId(id), WorkoutId(1), ExerciseTypeId(3), index)
                .with_target_sets(3);
            storage.save_exercise(&exercise).await.unwrap();
        }
        storage
    }

    #[tokio::test]
    async fn test_workout_round_trip() {
        let storage = seeded().await;
        let loaded = storage.load_workout(WorkoutId(1)).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Legs");
        assert_eq!(loaded.user_id, UserId(7));
        assert!(!loaded.is_finished());
        assert!(storage.load_workout(WorkoutId(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exercises_and_types() {
        let storage = seeded().await;
        let exercises = storage.list_exercises(WorkoutId(1)).await.unwrap();
        assert_eq!(exercises.iter().map(|e| e.id.get()).collect::<Vec<_>>(), vec![21, 20]);
        assert_eq!(exercises[0].target_sets, 3);

        let squat = storage.load_exercise_type(ExerciseTypeId(3)).await.unwrap().unwrap();
        assert_eq!(squat.rest_in_seconds, 120);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let storage = seeded().await;
        let id = storage.create_session(&WorkoutSession::start(WorkoutId(1), 1)).await.unwrap();

        let mut session = storage.load_session(WorkoutId(1)).await.unwrap().unwrap();
        assert_eq!(session.id, id);
        assert!(session.is_active);

        session.current_exercise_index = 0;
        storage.save_session(&session).await.unwrap();
        let reloaded = storage.load_session(WorkoutId(1)).await.unwrap().unwrap();
        assert_eq!(reloaded.current_exercise_index, 0);

        let mut ghost = session.clone();
        ghost.id = SessionId(999);
        assert!(matches!(
            storage.save_session(&ghost).await.unwrap_err(),
            StorageError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_one_active_session_per_workout() {
        let storage = seeded().await;
        storage.create_session(&WorkoutSession::start(WorkoutId(1), 0)).await.unwrap();

        let err = storage
            .create_session(&WorkoutSession::start(WorkoutId(1), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        let mut closed = WorkoutSession::start(WorkoutId(1), 1);
        closed.is_active = false;
        storage.create_session(&closed).await.unwrap();
        assert_eq!(storage.load_session(WorkoutId(1)).await.unwrap().unwrap().current_exercise_index, 0);
    }

    #[tokio::test]
    async fn test_negative_count_column_is_rejected() {
        let storage = seeded().await;
        storage.save_set(&WorkoutSet::new(SetId(6), ExerciseId(20), 0)).await.unwrap();
        sqlx::query("UPDATE sets SET reps = -3 WHERE id = 6")
            .execute(&storage.pool)
            .await
            .unwrap();

        let err = storage.load_set(SetId(6)).await.unwrap_err();
        assert!(matches!(err, StorageError::Other(ref msg) if msg.contains("reps")));
    }

    #[tokio::test]
    async fn test_set_completion_persists() {
        let storage = seeded().await;
        let mut set = WorkoutSet::new(SetId(5), ExerciseId(20), 0).with_load(8, 60.0);
        storage.save_set(&set).await.unwrap();
        assert_eq!(storage.count_completed_sets(ExerciseId(20)).await.unwrap(), 0);

        set.toggle_completed(chrono::Utc::now());
        storage.save_set(&set).await.unwrap();

        let loaded = storage.load_set(SetId(5)).await.unwrap().unwrap();
        assert!(loaded.completed);
        assert!(loaded.completed_at.is_some());
        assert_eq!(loaded.reps, 8);
        assert_eq!(storage.count_sets(ExerciseId(20)).await.unwrap(), 1);
        assert_eq!(storage.count_completed_sets(ExerciseId(20)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_workout_cascades() {
        let storage = seeded().await;
        storage.save_set(&WorkoutSet::new(SetId(5), ExerciseId(20), 0)).await.unwrap();
        storage.create_session(&WorkoutSession::start(WorkoutId(1), 0)).await.unwrap();

        storage.delete_workout(WorkoutId(1)).await.unwrap();

        assert!(storage.list_exercises(WorkoutId(1)).await.unwrap().is_empty());
        assert!(storage.load_set(SetId(5)).await.unwrap().is_none());
        assert!(storage.load_session(WorkoutId(1)).await.unwrap().is_none());
        assert!(matches!(
            storage.delete_workout(WorkoutId(1)).await.unwrap_err(),
            StorageError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gymtrack.db");

        {
            let storage = SqliteStorage::new(&path).await.unwrap();
            storage.save_workout(&Workout::new(WorkoutId(4), UserId(1), "Full body")).await.unwrap();
        }

        let reopened = SqliteStorage::new(&path).await.unwrap();
        assert!(reopened.load_workout(WorkoutId(4)).await.unwrap().is_some());
    }
}
