//! Session navigation service.

use std::sync::Arc;
use async_trait::async_trait;
use gymtrack_core::{
    clamp_index, Error, Exercise, ExerciseType, Result, Workout, WorkoutId, WorkoutSession,
    WorkoutSummary,
};
use gymtrack_storage::{Storage, StorageError};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Step direction for relative moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Towards the last exercise
    Forward,
    /// Towards the first exercise
    Backward,
}

impl Direction {
    /// `true` means forward, as sent by the clients' "next" flag.
    pub fn from_next(next: bool) -> Self {
        if next { Self::Forward } else { Self::Backward }
    }

    fn step(self) -> i64 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

/// Where to put the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationTarget {
    /// Jump to a position (clamped)
    Index(i64),
    /// One exercise forward
    Next,
    /// One exercise back
    Previous,
}

/// The exercise the user is currently on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentExercise {
    /// Position used for this read
    pub exercise_index: usize,
    /// The exercise at that position
    pub exercise: Exercise,
    /// Its catalogue entry
    pub exercise_type: ExerciseType,
    /// Enclosing workout
    pub workout: WorkoutSummary,
}

/// Session navigation service.
#[async_trait]
pub trait SessionNavigator: Send + Sync {
    /// Put the cursor at `target`, clamped to the workout's exercises.
    ///
    /// Creates the session on first use.
    async fn move_to(&self, workout_id: WorkoutId, target: i64) -> Result<WorkoutSession>;

    /// Step the cursor one exercise forward or back, holding at either end.
    async fn move_relative(
        &self,
        workout_id: WorkoutId,
        direction: Direction,
    ) -> Result<WorkoutSession>;

    /// Read the current exercise without changing the session.
    async fn show_current(&self, workout_id: WorkoutId) -> Result<CurrentExercise>;

    /// Dispatch a jump or a step.
    async fn navigate(
        &self,
        workout_id: WorkoutId,
        target: NavigationTarget,
    ) -> Result<WorkoutSession> {
        match target {
            NavigationTarget::Index(index) => self.move_to(workout_id, index).await,
            NavigationTarget::Next => self.move_relative(workout_id, Direction::Forward).await,
            NavigationTarget::Previous => self.move_relative(workout_id, Direction::Backward).await,
        }
    }
}

/// Storage-backed navigator.
///
/// Saves are last-writer-wins: two concurrent moves on one workout both
/// succeed and the later save decides the cursor. Session creation is
/// serialized so a workout never gets two active sessions from this navigator.
pub struct BasicSessionNavigator<S: Storage> {
    storage: Arc<S>,
    create_lock: Mutex<()>,
}

impl<S: Storage> BasicSessionNavigator<S> {
    /// Create a navigator over shared storage.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            create_lock: Mutex::new(()),
        }
    }

    async fn require_workout(&self, workout_id: WorkoutId) -> Result<Workout> {
        self.storage
            .load_workout(workout_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("workout {}", workout_id)))
    }

    /// Write `index` into the workout's session, creating it if needed.
    async fn place_cursor(
        &self,
        workout_id: WorkoutId,
        existing: Option<WorkoutSession>,
        index: i64,
    ) -> Result<WorkoutSession> {
        if let Some(session) = existing {
            return self.save_cursor(session, index).await;
        }

        let _guard = self.create_lock.lock().await;
        // Another caller may have created it while we waited.
        if let Some(session) = self.storage.load_session(workout_id).await? {
            return self.save_cursor(session, index).await;
        }

        let mut session = WorkoutSession::start(workout_id, index);
        match self.storage.create_session(&session).await {
            Ok(id) => {
                session.id = id;
                info!("Created session {} for workout {} at exercise {}", session.id, workout_id, index);
                Ok(session)
            }
            Err(StorageError::Conflict(_)) => {
                // Another navigator or process created it first.
                debug!("Session for workout {} created concurrently, reusing it", workout_id);
                let existing = self
                    .storage
                    .load_session(workout_id)
                    .await?
                    .ok_or_else(|| Error::not_found(format!("session for workout {}", workout_id)))?;
                self.save_cursor(existing, index).await
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn save_cursor(&self, mut session: WorkoutSession, index: i64) -> Result<WorkoutSession> {
        let from = session.current_exercise_index;
        session.current_exercise_index = index;
        self.storage.save_session(&session).await?;
        debug!("Moved workout {} cursor {} -> {}", session.workout_id, from, index);
        Ok(session)
    }
}

#[async_trait]
impl<S: Storage + 'static> SessionNavigator for BasicSessionNavigator<S> {
    async fn move_to(&self, workout_id: WorkoutId, target: i64) -> Result<WorkoutSession> {
        self.require_workout(workout_id).await?;
        let exercises = self.storage.list_exercises(workout_id).await?;
        let index = clamp_index(target, exercises.len());

        let existing = self.storage.load_session(workout_id).await?;
        self.place_cursor(workout_id, existing, index).await
    }

    async fn move_relative(
        &self,
        workout_id: WorkoutId,
        direction: Direction,
    ) -> Result<WorkoutSession> {
        self.require_workout(workout_id).await?;
        let exercises = self.storage.list_exercises(workout_id).await?;

        let existing = self.storage.load_session(workout_id).await?;
        let current = existing.as_ref().map_or(0, |s| s.current_exercise_index);
        let index = clamp_index(current.saturating_add(direction.step()), exercises.len());

        self.place_cursor(workout_id, existing, index).await
    }

    async fn show_current(&self, workout_id: WorkoutId) -> Result<CurrentExercise> {
        let workout = self.require_workout(workout_id).await?;
        let mut exercises = self.storage.list_exercises(workout_id).await?;
        if exercises.is_empty() {
            return Err(Error::NoExercises(workout_id));
        }

        let session = self
            .storage
            .load_session(workout_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("session for workout {}", workout_id)))?;

        let exercise_count = exercises.len();
        let exercise_index = session.effective_index(exercise_count);
        let exercise = exercises.swap_remove(exercise_index);

        let exercise_type = self
            .storage
            .load_exercise_type(exercise.exercise_type_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("exercise type {}", exercise.exercise_type_id)))?;

        Ok(CurrentExercise {
            exercise_index,
            exercise,
            exercise_type,
            workout: workout.summary(exercise_count),
        })
    }
}
