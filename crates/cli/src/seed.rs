//! Demo data.

use gymtrack_core::{
    Error, Exercise, ExerciseId, ExerciseType, ExerciseTypeId, Result, SetId, UserId, Workout,
    WorkoutId, WorkoutSet,
};
use gymtrack_storage::Storage;
use tracing::{info, warn};

/// (name, rest seconds, reps, weight)
const CATALOGUE: &[(&str, u32, u32, f32)] = &[
    ("Back squat", 180, 5, 100.0),
    ("Bench press", 120, 8, 70.0),
    ("Walking lunge", 0, 12, 20.0),
    ("Plank", 45, 1, 0.0),
];

const SETS_PER_EXERCISE: u32 = 3;

/// Child ids are `parent * 100 + position`.
fn child_id(parent: i64, position: usize, workout_id: WorkoutId) -> Result<i64> {
    parent
        .checked_mul(100)
        .and_then(|base| base.checked_add(position as i64))
        .ok_or_else(|| Error::InvalidArgument(format!("workout id {} is too large to seed", workout_id)))
}

/// Write a four-exercise workout for `user`, replacing any earlier seed of
/// the same workout. Returns the number of sets written.
///
/// Refuses to overwrite a workout that belongs to someone else.
pub async fn seed_workout<S: Storage>(storage: &S, workout_id: WorkoutId, user: UserId) -> Result<usize> {
    let last_exercise = child_id(workout_id.0, CATALOGUE.len() - 1, workout_id)?;
    child_id(last_exercise, SETS_PER_EXERCISE as usize - 1, workout_id)?;

    if let Some(existing) = storage.load_workout(workout_id).await? {
        if !existing.is_owned_by(user) {
            warn!("User {} tried to reseed workout {} of user {}", user, workout_id, existing.user_id);
            return Err(Error::Forbidden(format!("workout {}", workout_id)));
        }
    }

    for (i, (name, rest, _, _)) in CATALOGUE.iter().enumerate() {
        let exercise_type = ExerciseType::new(ExerciseTypeId(i as i64 + 1), *name).with_rest(*rest);
        storage.save_exercise_type(&exercise_type).await?;
    }

    storage.save_workout(&Workout::new(workout_id, user, "Full body")).await?;

    let mut written = 0;
    for (i, (_, _, reps, weight)) in CATALOGUE.iter().enumerate() {
        let exercise_id = ExerciseId(child_id(workout_id.0, i, workout_id)?);
        let exercise = Exercise::new(exercise_id, workout_id, ExerciseTypeId(i as i64 + 1), i as i32)
            .with_target_sets(SETS_PER_EXERCISE);
        storage.save_exercise(&exercise).await?;

        for s in 0..SETS_PER_EXERCISE {
            let set_id = SetId(child_id(exercise_id.0, s as usize, workout_id)?);
            let set = WorkoutSet::new(set_id, exercise_id, s as i32).with_load(*reps, *weight);
            storage.save_set(&set).await?;
            written += 1;
        }
    }

    info!("Seeded workout {} for user {} with {} sets", workout_id, user, written);
    Ok(written)
}
