//! Timer notifications.

use gymtrack_core::{Time, UserId, WorkoutId};
use serde::{Deserialize, Serialize};

use crate::manager::{Timer, TimerId};

/// What happened to a timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEventKind {
    /// Countdown registered
    Started,
    /// Progress update
    Tick {
        /// Whole seconds left, rounded up
        remaining_seconds: u64,
    },
    /// Cancelled by its owner
    Cancelled,
    /// Duration elapsed
    Expired,
}

/// A notification about one timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerEvent {
    /// Timer concerned
    pub timer_id: TimerId,
    /// Its owner, for routing push notifications
    pub owner_user_id: UserId,
    /// Its workout
    pub workout_id: WorkoutId,
    /// What happened
    pub kind: TimerEventKind,
    /// When it happened
    pub at: Time,
}

impl TimerEvent {
    pub(crate) fn new(timer: &Timer, kind: TimerEventKind) -> Self {
        Self {
            timer_id: timer.id.clone(),
            owner_user_id: timer.owner_user_id,
            workout_id: timer.workout_id,
            kind,
            at: chrono::Utc::now(),
        }
    }

    /// Whether the timer left the live set with this event.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, TimerEventKind::Cancelled | TimerEventKind::Expired)
    }
}
