//! Storage trait abstraction.

use async_trait::async_trait;
use gymtrack_core::{
    Exercise, ExerciseId, ExerciseType, ExerciseTypeId, SessionId, SetId, Workout, WorkoutId,
    WorkoutSession, WorkoutSet,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database driver error
    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write would break a uniqueness rule
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl From<StorageError> for gymtrack_core::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => gymtrack_core::Error::NotFound(what),
            other => gymtrack_core::Error::Storage(other.to_string()),
        }
    }
}

/// Repository consumed by the gymtrack services.
///
/// Implementations guarantee single-row atomicity only. Saves are
/// last-writer-wins; there is no version check.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Workout operations ===

    /// Save a workout (create or update).
    async fn save_workout(&self, workout: &Workout) -> Result<()>;

    /// Load a workout by ID.
    async fn load_workout(&self, id: WorkoutId) -> Result<Option<Workout>>;

    /// Delete a workout together with its exercises, sets and sessions.
    async fn delete_workout(&self, id: WorkoutId) -> Result<()>;

    // === Exercise operations ===

    /// Save an exercise (create or update).
    async fn save_exercise(&self, exercise: &Exercise) -> Result<()>;

    /// List a workout's exercises ordered by index.
    async fn list_exercises(&self, workout_id: WorkoutId) -> Result<Vec<Exercise>>;

    /// Save an exercise type (create or update).
    async fn save_exercise_type(&self, exercise_type: &ExerciseType) -> Result<()>;

    /// Load an exercise type by ID.
    async fn load_exercise_type(&self, id: ExerciseTypeId) -> Result<Option<ExerciseType>>;

    // === Session operations ===

    /// Load the active session of a workout.
    async fn load_session(&self, workout_id: WorkoutId) -> Result<Option<WorkoutSession>>;

    /// Insert a new session and return its assigned ID.
    ///
    /// Fails with [`StorageError::Conflict`] when the session is active and
    /// the workout already has an active session.
    async fn create_session(&self, session: &WorkoutSession) -> Result<SessionId>;

    /// Overwrite an existing session.
    async fn save_session(&self, session: &WorkoutSession) -> Result<()>;

    // === Set operations ===

    /// Save a set (create or update).
    async fn save_set(&self, set: &WorkoutSet) -> Result<()>;

    /// Load a set by ID.
    async fn load_set(&self, id: SetId) -> Result<Option<WorkoutSet>>;

    /// List an exercise's sets ordered by index.
    async fn list_sets(&self, exercise_id: ExerciseId) -> Result<Vec<WorkoutSet>>;

    /// Count all sets of an exercise.
    async fn count_sets(&self, exercise_id: ExerciseId) -> Result<u32>;

    /// Count completed sets of an exercise.
    async fn count_completed_sets(&self, exercise_id: ExerciseId) -> Result<u32>;
}
