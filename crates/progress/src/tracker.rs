//! Progress tracking service.

use std::sync::Arc;
use async_trait::async_trait;
use gymtrack_core::{Error, ExerciseId, Result, Time, WorkoutId};
use gymtrack_storage::Storage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::estimator::CompletionEstimator;

/// Progress tracking service.
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    /// Get workout progress as of now.
    async fn get_progress(&self, workout_id: WorkoutId) -> Result<WorkoutProgress>;
}

/// Where an exercise stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseStatus {
    /// No set completed (or no sets at all)
    NotStarted,
    /// Some sets completed
    InProgress,
    /// Has sets and all are completed
    Done,
}

/// Per-exercise completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseProgress {
    /// Exercise ID
    pub exercise_id: ExerciseId,
    /// Completed sets
    pub completed_sets: u32,
    /// All sets
    pub total_sets: u32,
    /// Derived status
    pub status: ExerciseStatus,
}

impl ExerciseProgress {
    fn new(exercise_id: ExerciseId, completed_sets: u32, total_sets: u32) -> Self {
        let status = if total_sets > 0 && completed_sets >= total_sets {
            ExerciseStatus::Done
        } else if completed_sets > 0 {
            ExerciseStatus::InProgress
        } else {
            ExerciseStatus::NotStarted
        };
        Self {
            exercise_id,
            completed_sets,
            total_sets,
            status,
        }
    }
}

/// Workout completion summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutProgress {
    /// Workout ID
    pub workout_id: WorkoutId,
    /// Exercises in the workout
    pub total_exercises: usize,
    /// Exercises whose sets are all completed
    pub completed_exercises: usize,
    /// Sets across all exercises
    pub total_sets: u32,
    /// Completed sets across all exercises
    pub completed_sets: u32,
    /// `floor(100 * completed_sets / total_sets)`, 0 without sets
    pub percent: u8,
    /// Minutes until done at the current pace
    pub eta_minutes: Option<f64>,
    /// Breakdown in exercise order
    pub exercises: Vec<ExerciseProgress>,
}

impl WorkoutProgress {
    /// Render a bar of `width` cells, `█` for done and `░` for the rest.
    pub fn progress_bar(&self, width: usize) -> String {
        let filled = (self.percent as usize * width / 100).min(width);
        let mut bar = "█".repeat(filled);
        bar.push_str(&"░".repeat(width - filled));
        bar
    }

    /// Whether every set is completed.
    pub fn is_complete(&self) -> bool {
        self.total_sets > 0 && self.completed_sets >= self.total_sets
    }
}

fn percent(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    (u64::from(completed.min(total)) * 100 / u64::from(total)) as u8
}

/// Basic progress tracker implementation.
pub struct BasicProgressTracker<S: Storage> {
    storage: Arc<S>,
    estimator: CompletionEstimator,
}

impl<S: Storage> BasicProgressTracker<S> {
    /// Create a new progress tracker.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            estimator: CompletionEstimator,
        }
    }

    /// Progress as of `now`. Used for the ETA only.
    pub async fn progress_at(&self, workout_id: WorkoutId, now: Time) -> Result<WorkoutProgress> {
        let workout = self
            .storage
            .load_workout(workout_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("workout {}", workout_id)))?;

        let exercises = self.storage.list_exercises(workout_id).await?;
        let mut breakdown = Vec::with_capacity(exercises.len());
        for exercise in &exercises {
            let total = self.storage.count_sets(exercise.id).await?;
            let completed = self.storage.count_completed_sets(exercise.id).await?;
            breakdown.push(ExerciseProgress::new(exercise.id, completed, total));
        }

        let total_sets: u32 = breakdown.iter().map(|e| e.total_sets).sum();
        let completed_sets: u32 = breakdown.iter().map(|e| e.completed_sets).sum();
        let completed_exercises = breakdown
            .iter()
            .filter(|e| e.status == ExerciseStatus::Done)
            .count();

        debug!(
            "Workout {}: {}/{} sets, {}/{} exercises",
            workout_id,
            completed_sets,
            total_sets,
            completed_exercises,
            exercises.len()
        );

        Ok(WorkoutProgress {
            workout_id,
            total_exercises: exercises.len(),
            completed_exercises,
            total_sets,
            completed_sets,
            percent: percent(completed_sets, total_sets),
            eta_minutes: self
                .estimator
                .estimate_minutes(&workout, completed_sets, total_sets, now),
            exercises: breakdown,
        })
    }
}

#[async_trait]
impl<S: Storage + 'static> ProgressTracker for BasicProgressTracker<S> {
    async fn get_progress(&self, workout_id: WorkoutId) -> Result<WorkoutProgress> {
        self.progress_at(workout_id, chrono::Utc::now()).await
    }
}
