//! Completion time estimation.

use gymtrack_core::{Time, Workout};

/// Linear finish-time estimator.
///
/// Extrapolates the pace so far: if `completed` sets took `elapsed` minutes,
/// the `remaining` ones take `remaining / (completed / elapsed)`.
pub struct CompletionEstimator;

impl CompletionEstimator {
    /// Estimated minutes until every set is done, as of `now`.
    ///
    /// `None` when nothing is completed yet, the workout is finished, or no
    /// time has passed since it started.
    pub fn estimate_minutes(
        &self,
        workout: &Workout,
        completed_sets: u32,
        total_sets: u32,
        now: Time,
    ) -> Option<f64> {
        if completed_sets == 0 || workout.is_finished() {
            return None;
        }

        let elapsed_minutes = (now - workout.started_at).num_milliseconds() as f64 / 60_000.0;
        if elapsed_minutes <= 0.0 {
            return None;
        }

        let remaining = total_sets.saturating_sub(completed_sets) as f64;
        let per_minute = completed_sets as f64 / elapsed_minutes;
        Some(remaining / per_minute)
    }
}

impl Default for CompletionEstimator {
    fn default() -> Self {
        Self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use gymtrack_core::{UserId, WorkoutId};

    fn started(minutes_ago: i64, now: Time) -> Workout {
        let mut workout = Workout::new(WorkoutId(1), UserId(1), "Push");
        workout.started_at = now - Duration::minutes(minutes_ago);
        workout
    }

    #[test]
    fn test_linear_pace() {
        let now = chrono::Utc::now();
        let workout = started(20, now);

        // 4 sets in 20 minutes, 6 left at 5 min/set
        let eta = CompletionEstimator.estimate_minutes(&workout, 4, 10, now).unwrap();
        assert!((eta - 30.0).abs() < 1e-9);

        let eta = CompletionEstimator.estimate_minutes(&workout, 10, 10, now).unwrap();
        assert_eq!(eta, 0.0);
    }

    #[test]
    fn test_no_estimate() {
        let now = chrono::Utc::now();
        let estimator = CompletionEstimator::default();

        assert!(estimator.estimate_minutes(&started(20, now), 0, 10, now).is_none());
        assert!(estimator.estimate_minutes(&started(0, now), 2, 10, now).is_none());

        let mut finished = started(20, now);
        finished.ended_at = Some(now);
        assert!(estimator.estimate_minutes(&finished, 4, 10, now).is_none());

        let mut completed = started(20, now);
        completed.completed = true;
        assert!(estimator.estimate_minutes(&completed, 4, 10, now).is_none());
    }
}
