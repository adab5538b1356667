//! Rest duration between sets.

use gymtrack_core::ExerciseType;

/// Rest used when neither the exercise nor the user specify one.
pub const DEFAULT_REST_SECONDS: u32 = 90;

/// Pick the rest duration for the next countdown.
///
/// The exercise type's recommendation wins, then the user's own default,
/// then [`DEFAULT_REST_SECONDS`]. Zero counts as unset.
pub fn rest_seconds(exercise_type: Option<&ExerciseType>, user_default: Option<u32>) -> u32 {
    exercise_type
        .map(|t| t.rest_in_seconds)
        .filter(|s| *s > 0)
        .or(user_default.filter(|s| *s > 0))
        .unwrap_or(DEFAULT_REST_SECONDS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gymtrack_core::ExerciseTypeId;

    #[test]
    fn test_fallback_chain() {
        let deadlift = ExerciseType::new(ExerciseTypeId(1), "Deadlift").with_rest(180);
        let curl = ExerciseType::new(ExerciseTypeId(2), "Curl");

        assert_eq!(rest_seconds(Some(&deadlift), Some(60)), 180);
        assert_eq!(rest_seconds(Some(&curl), Some(60)), 60);
        assert_eq!(rest_seconds(Some(&curl), Some(0)), DEFAULT_REST_SECONDS);
        assert_eq!(rest_seconds(None, None), 90);
    }
}
