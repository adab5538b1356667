//! Caller identity passed into every command.

use gymtrack_core::{Error, Result, UserId, Workout, WorkoutId};
use gymtrack_storage::Storage;
use tracing::warn;

/// Who is making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub caller: UserId,
}

impl RequestContext {
    pub fn new(caller: UserId) -> Self {
        Self { caller }
    }

    /// Load a workout the caller owns.
    pub async fn authorize_workout<S: Storage>(
        &self,
        storage: &S,
        workout_id: WorkoutId,
    ) -> Result<Workout> {
        let workout = storage
            .load_workout(workout_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("workout {}", workout_id)))?;

        if !workout.is_owned_by(self.caller) {
            warn!("User {} denied access to workout {}", self.caller, workout_id);
            return Err(Error::Forbidden(format!("workout {}", workout_id)));
        }
        Ok(workout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gymtrack_storage::MemoryStorage;

    #[tokio::test]
    async fn test_owner_only() {
        let storage = MemoryStorage::new();
        storage
            .save_workout(&Workout::new(WorkoutId(1), UserId(7), "Pull"))
            .await
            .unwrap();

        let owner = RequestContext::new(UserId(7));
        assert_eq!(owner.authorize_workout(&storage, WorkoutId(1)).await.unwrap().name, "Pull");

        let other = RequestContext::new(UserId(8));
        let err = other.authorize_workout(&storage, WorkoutId(1)).await.unwrap_err();
        assert_eq!(err.status_code(), 403);

        let err = owner.authorize_workout(&storage, WorkoutId(2)).await.unwrap_err();
        assert_eq!(err, Error::not_found("workout 2"));
    }
}
