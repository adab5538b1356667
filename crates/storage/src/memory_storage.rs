//! In-memory storage implementation.
//!
//! Keeps every entity in hash maps behind a single async mutex. Used by tests
//! and demos; nothing survives the process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use gymtrack_core::{
    Exercise, ExerciseId, ExerciseType, ExerciseTypeId, SessionId, SetId, Workout, WorkoutId,
    WorkoutSession, WorkoutSet,
};
use super::{Storage, StorageError, Result};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct Tables {
    workouts: HashMap<WorkoutId, Workout>,
    exercises: HashMap<ExerciseId, Exercise>,
    exercise_types: HashMap<ExerciseTypeId, ExerciseType>,
    sets: HashMap<SetId, WorkoutSet>,
    sessions: HashMap<SessionId, WorkoutSession>,
    next_session_id: i64,
}

/// Hash-map backed storage.
///
/// Cloning yields another handle to the same tables.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<Mutex<Tables>>,
    read_only: Arc<AtomicBool>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every write with a storage error while `read_only` is set.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Number of sessions (active or not) recorded for a workout.
    pub async fn session_count(&self, workout_id: WorkoutId) -> usize {
        self.tables
            .lock()
            .await
            .sessions
            .values()
            .filter(|s| s.workout_id == workout_id)
            .count()
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StorageError::Other("storage is read-only".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn save_workout(&self, workout: &Workout) -> Result<()> {
        self.check_writable()?;
        self.tables.lock().await.workouts.insert(workout.id, workout.clone());
        Ok(())
    }

    async fn load_workout(&self, id: WorkoutId) -> Result<Option<Workout>> {
        Ok(self.tables.lock().await.workouts.get(&id).cloned())
    }

    async fn delete_workout(&self, id: WorkoutId) -> Result<()> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        if tables.workouts.remove(&id).is_none() {
            return Err(StorageError::NotFound(format!("workout {}", id)));
        }

        let exercise_ids: Vec<ExerciseId> = tables
            .exercises
            .values()
            .filter(|e| e.workout_id == id)
            .map(|e| e.id)
            .collect();
        tables.sets.retain(|_, s| !exercise_ids.contains(&s.exercise_id));
        tables.exercises.retain(|_, e| e.workout_id != id);
        tables.sessions.retain(|_, s| s.workout_id != id);

        debug!("Deleted workout {} with {} exercises", id, exercise_ids.len());
        Ok(())
    }

    async fn save_exercise(&self, exercise: &Exercise) -> Result<()> {
        self.check_writable()?;
        self.tables.lock().await.exercises.insert(exercise.id, exercise.clone());
        Ok(())
    }

    async fn list_exercises(&self, workout_id: WorkoutId) -> Result<Vec<Exercise>> {
        let tables = self.tables.lock().await;
        let mut exercises: Vec<Exercise> = tables
            .exercises
            .values()
            .filter(|e| e.workout_id == workout_id)
            .cloned()
            .collect();
        exercises.sort_by_key(|e| (e.index, e.id));
        Ok(exercises)
    }

    async fn save_exercise_type(&self, exercise_type: &ExerciseType) -> Result<()> {
        self.check_writable()?;
        self.tables
            .lock()
            .await
            .exercise_types
            .insert(exercise_type.id, exercise_type.clone());
        Ok(())
    }

    async fn load_exercise_type(&self, id: ExerciseTypeId) -> Result<Option<ExerciseType>> {
        Ok(self.tables.lock().await.exercise_types.get(&id).cloned())
    }

    async fn load_session(&self, workout_id: WorkoutId) -> Result<Option<WorkoutSession>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sessions
            .values()
            .filter(|s| s.workout_id == workout_id && s.is_active)
            .max_by_key(|s| s.id)
            .cloned())
    }

    async fn create_session(&self, session: &WorkoutSession) -> Result<SessionId> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        if session.is_active
            && tables
                .sessions
                .values()
                .any(|s| s.workout_id == session.workout_id && s.is_active)
        {
            return Err(StorageError::Conflict(format!(
                "workout {} already has an active session",
                session.workout_id
            )));
        }
        tables.next_session_id += 1;
        let id = SessionId(tables.next_session_id);

        let mut stored = session.clone();
        stored.id = id;
        tables.sessions.insert(id, stored);
        Ok(id)
    }

    async fn save_session(&self, session: &WorkoutSession) -> Result<()> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        match tables.sessions.get_mut(&session.id) {
            Some(stored) => {
                *stored = session.clone();
                Ok(())
            }
            None => Err(StorageError::NotFound(format!("session {}", session.id))),
        }
    }

    async fn save_set(&self, set: &WorkoutSet) -> Result<()> {
        self.check_writable()?;
        self.tables.lock().await.sets.insert(set.id, set.clone());
        Ok(())
    }

    async fn load_set(&self, id: SetId) -> Result<Option<WorkoutSet>> {
        Ok(self.tables.lock().await.sets.get(&id).cloned())
    }

    async fn list_sets(&self, exercise_id: ExerciseId) -> Result<Vec<WorkoutSet>> {
        let tables = self.tables.lock().await;
        let mut sets: Vec<WorkoutSet> = tables
            .sets
            .values()
            .filter(|s| s.exercise_id == exercise_id)
            .cloned()
            .collect();
        sets.sort_by_key(|s| (s.index, s.id));
        Ok(sets)
    }

    async fn count_sets(&self, exercise_id: ExerciseId) -> Result<u32> {
        let tables = self.tables.lock().await;
        Ok(tables.sets.values().filter(|s| s.exercise_id == exercise_id).count() as u32)
    }

    async fn count_completed_sets(&self, exercise_id: ExerciseId) -> Result<u32> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sets
            .values()
            .filter(|s| s.exercise_id == exercise_id && s.completed)
            .count() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gymtrack_core::UserId;

    async fn seeded() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage.save_workout(&Workout::new(WorkoutId(1), UserId(1), "Push")).await.unwrap();
        for (id, index) in [(10, 2), (11, 0), (12, 1)] {
            let exercise = Exercise::new(ExerciseId(id), WorkoutId(1), ExerciseTypeId(1), index);
            storage.save_exercise(&exercise).await.unwrap();
        }
        storage
    }

    #[tokio::test]
    async fn test_exercises_ordered_by_index() {
        let storage = seeded().await;
        let ids: Vec<i64> = storage
            .list_exercises(WorkoutId(1))
            .await
            .unwrap()
            .iter()
            .map(|e| e.id.get())
            .collect();
        assert_eq!(ids, vec![11, 12, 10]);
    }

    #[tokio::test]
    async fn test_session_create_and_save() {
        let storage = seeded().await;
        assert!(storage.load_session(WorkoutId(1)).await.unwrap().is_none());

        let id = storage.create_session(&WorkoutSession::start(WorkoutId(1), 1)).await.unwrap();
        let mut session = storage.load_session(WorkoutId(1)).await.unwrap().unwrap();
        assert_eq!(session.id, id);
        assert_eq!(session.current_exercise_index, 1);

        session.current_exercise_index = 2;
        storage.save_session(&session).await.unwrap();
        let reloaded = storage.load_session(WorkoutId(1)).await.unwrap().unwrap();
        assert_eq!(reloaded.current_exercise_index, 2);
    }

    #[tokio::test]
    async fn test_second_active_session_conflicts() {
        let storage = seeded().await;
        storage.create_session(&WorkoutSession::start(WorkoutId(1), 0)).await.unwrap();

        let err = storage
            .create_session(&WorkoutSession::start(WorkoutId(1), 2))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
        assert_eq!(storage.session_count(WorkoutId(1)).await, 1);

        let mut closed = WorkoutSession::start(WorkoutId(1), 2);
        closed.is_active = false;
        storage.create_session(&closed).await.unwrap();
        assert_eq!(storage.session_count(WorkoutId(1)).await, 2);
    }

    #[tokio::test]
    async fn test_save_unknown_session_fails() {
        let storage = seeded().await;
        let session = WorkoutSession::start(WorkoutId(1), 0);
        let err = storage.save_session(&session).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_inactive_sessions_are_ignored() {
        let storage = seeded().await;
        let mut old = WorkoutSession::start(WorkoutId(1), 2);
        old.is_active = false;
        storage.create_session(&old).await.unwrap();
        assert!(storage.load_session(WorkoutId(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_counts() {
        let storage = seeded().await;
        let mut done = WorkoutSet::new(SetId(1), ExerciseId(10), 0);
        done.toggle_completed(chrono::Utc::now());
        storage.save_set(&done).await.unwrap();
        storage.save_set(&WorkoutSet::new(SetId(2), ExerciseId(10), 1)).await.unwrap();
        storage.save_set(&WorkoutSet::new(SetId(3), ExerciseId(11), 0)).await.unwrap();

        assert_eq!(storage.count_sets(ExerciseId(10)).await.unwrap(), 2);
        assert_eq!(storage.count_completed_sets(ExerciseId(10)).await.unwrap(), 1);
        assert_eq!(storage.count_completed_sets(ExerciseId(11)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_workout_cascades() {
        let storage = seeded().await;
        storage.save_set(&WorkoutSet::new(SetId(1), ExerciseId(10), 0)).await.unwrap();
        storage.create_session(&WorkoutSession::start(WorkoutId(1), 0)).await.unwrap();

        storage.delete_workout(WorkoutId(1)).await.unwrap();

        assert!(storage.load_workout(WorkoutId(1)).await.unwrap().is_none());
        assert!(storage.list_exercises(WorkoutId(1)).await.unwrap().is_empty());
        assert!(storage.load_set(SetId(1)).await.unwrap().is_none());
        assert_eq!(storage.session_count(WorkoutId(1)).await, 0);
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let storage = seeded().await;
        storage.set_read_only(true);
        let err = storage
            .save_workout(&Workout::new(WorkoutId(2), UserId(1), "Pull"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Other(_)));

        // reads keep working
        assert!(storage.load_workout(WorkoutId(1)).await.unwrap().is_some());
    }
}
