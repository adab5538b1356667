//! Rest timers (Layer 2)
//!
//! Ephemeral, cancellable countdowns owned by a user and bound to a workout.

#![warn(missing_docs)]

pub mod config;
pub mod event;
pub mod manager;
pub mod rest;

pub use config::TimerConfig;
pub use event::{TimerEvent, TimerEventKind};
pub use manager::{
    TimerManager, InMemoryTimerManager, TimerId, Timer, TimerHandle, TimerSnapshot,
};
pub use rest::{rest_seconds, DEFAULT_REST_SECONDS};
