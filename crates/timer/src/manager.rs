//! Timer Manager for rest countdowns.
//!
//! Every live timer sits in one mutex-guarded registry. Start, cancel and
//! expiry each change a timer's state while holding that lock, so whichever
//! of a racing cancel and expiry removes the entry first wins and the other
//! finds nothing.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gymtrack_core::{Error, Result, Time, UserId, WorkoutId};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{TimerConfig, MIN_TICK_INTERVAL};
use crate::event::{TimerEvent, TimerEventKind};

/// Timer ID type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct TimerId(pub String);

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TimerId {
    /// Create a new timer ID
    pub fn new() -> Self {
        Self(format!("timer_{}", ulid::Ulid::new()))
    }
}

impl Default for TimerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::str::FromStr for TimerId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

/// A running countdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    /// Unique timer ID
    pub id: TimerId,
    /// Only this user may cancel or inspect it
    pub owner_user_id: UserId,
    /// Workout the rest belongs to
    pub workout_id: WorkoutId,
    /// Countdown length
    pub duration_seconds: u64,
    /// Registration time
    pub started_at: Time,
    /// Set on the final snapshot returned by a successful cancel
    pub cancelled: bool,
}

impl Timer {
    /// When the countdown runs out.
    pub fn expires_at(&self) -> Time {
        self.started_at + chrono::Duration::seconds(self.duration_seconds as i64)
    }
}

/// Returned by [`TimerManager::start`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerHandle {
    /// New timer's ID
    pub timer_id: TimerId,
    /// Its workout
    pub workout_id: WorkoutId,
    /// Registration time
    pub started_at: Time,
    /// Expected expiry
    pub expires_at: Time,
    /// Countdown length
    pub duration_seconds: u64,
}

/// A live timer with its remaining time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    /// The timer
    pub timer: Timer,
    /// Whole seconds left, rounded up
    pub remaining_seconds: u64,
}

/// TimerManager trait - owns every live rest timer
#[async_trait]
pub trait TimerManager: Send + Sync {
    /// Register a countdown of `seconds` and return without waiting for it.
    async fn start(&self, owner: UserId, workout_id: WorkoutId, seconds: i64) -> Result<TimerHandle>;

    /// Cancel a live timer owned by `caller`.
    async fn cancel(&self, timer_id: &TimerId, caller: UserId) -> Result<Timer>;

    /// Inspect a live timer owned by `caller`.
    async fn get(&self, timer_id: &TimerId, caller: UserId) -> Result<TimerSnapshot>;

    /// Live timers of one user, oldest first.
    async fn list_for_user(&self, owner: UserId) -> Vec<TimerSnapshot>;

    /// Cancel every live timer of a workout, returning how many were cancelled.
    async fn cancel_for_workout(&self, workout_id: WorkoutId) -> usize;

    /// Receive timer events from now on.
    fn subscribe(&self) -> broadcast::Receiver<TimerEvent>;
}

struct LiveTimer {
    timer: Timer,
    deadline: Instant,
    task: JoinHandle<()>,
}

impl LiveTimer {
    fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            timer: self.timer.clone(),
            remaining_seconds: remaining_seconds(self.deadline),
        }
    }
}

type Registry = Arc<Mutex<HashMap<TimerId, LiveTimer>>>;

/// In-memory timer manager implementation
pub struct InMemoryTimerManager {
    /// Live timers
    timers: Registry,
    /// Event fan-out
    events: broadcast::Sender<TimerEvent>,
    config: TimerConfig,
}

impl InMemoryTimerManager {
    /// Create a new in-memory timer manager
    pub fn new() -> Self {
        Self::with_config(TimerConfig::default())
    }

    /// Create with custom notification settings
    pub fn with_config(mut config: TimerConfig) -> Self {
        // Same floor as `with_tick_interval`; interval_at rejects zero.
        config.tick_interval = config.tick_interval.max(MIN_TICK_INTERVAL);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            timers: Arc::new(Mutex::new(HashMap::new())),
            events,
            config,
        }
    }

    /// Number of live timers
    pub async fn live_count(&self) -> usize {
        self.timers.lock().await.len()
    }

    /// Abort every countdown without emitting events.
    pub async fn shutdown(&self) {
        let mut timers = self.timers.lock().await;
        for (_, live) in timers.drain() {
            live.task.abort();
        }
        debug!("Timer manager shut down");
    }

    fn emit(&self, timer: &Timer, kind: TimerEventKind) {
        // No subscribers is fine.
        let _ = self.events.send(TimerEvent::new(timer, kind));
    }
}

impl Default for InMemoryTimerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimerManager for InMemoryTimerManager {
    async fn start(&self, owner: UserId, workout_id: WorkoutId, seconds: i64) -> Result<TimerHandle> {
        if seconds <= 0 {
            return Err(Error::InvalidArgument(format!(
                "timer duration must be positive, got {}",
                seconds
            )));
        }
        let duration_seconds = seconds as u64;
        let out_of_range = || Error::InvalidArgument(format!("timer duration {}s is out of range", seconds));

        let deadline = Instant::now()
            .checked_add(Duration::from_secs(duration_seconds))
            .ok_or_else(out_of_range)?;
        let started_at = chrono::Utc::now();
        let span = chrono::Duration::try_seconds(seconds).ok_or_else(out_of_range)?;
        let expires_at = started_at.checked_add_signed(span).ok_or_else(out_of_range)?;

        let timer = Timer {
            id: TimerId::new(),
            owner_user_id: owner,
            workout_id,
            duration_seconds,
            started_at,
            cancelled: false,
        };

        {
            // Holding the lock keeps the countdown from expiring an entry
            // that is not registered yet.
            let mut timers = self.timers.lock().await;
            let task = tokio::spawn(run_countdown(
                timer.clone(),
                deadline,
                self.timers.clone(),
                self.events.clone(),
                self.config,
            ));
            timers.insert(
                timer.id.clone(),
                LiveTimer {
                    timer: timer.clone(),
                    deadline,
                    task,
                },
            );
        }

        info!(
            "Started timer {} for user {} on workout {} ({}s)",
            timer.id, owner, workout_id, duration_seconds
        );
        self.emit(&timer, TimerEventKind::Started);

        Ok(TimerHandle {
            timer_id: timer.id,
            workout_id,
            started_at,
            expires_at,
            duration_seconds,
        })
    }

    async fn cancel(&self, timer_id: &TimerId, caller: UserId) -> Result<Timer> {
        let mut timers = self.timers.lock().await;

        let live = match timers.entry(timer_id.clone()) {
            Entry::Vacant(_) => {
                return Err(Error::not_found(format!("timer {}", timer_id)));
            }
            Entry::Occupied(entry) if entry.get().timer.owner_user_id != caller => {
                warn!("User {} tried to cancel timer {} of user {}", caller, timer_id, entry.get().timer.owner_user_id);
                return Err(Error::Forbidden(format!("timer {}", timer_id)));
            }
            Entry::Occupied(entry) => entry.remove(),
        };
        drop(timers);

        live.task.abort();
        let mut timer = live.timer;
        timer.cancelled = true;

        info!("Timer {} cancelled by user {}", timer_id, caller);
        self.emit(&timer, TimerEventKind::Cancelled);
        Ok(timer)
    }

    async fn get(&self, timer_id: &TimerId, caller: UserId) -> Result<TimerSnapshot> {
        let timers = self.timers.lock().await;
        match timers.get(timer_id) {
            None => Err(Error::not_found(format!("timer {}", timer_id))),
            Some(live) if live.timer.owner_user_id != caller => {
                Err(Error::Forbidden(format!("timer {}", timer_id)))
            }
            Some(live) => Ok(live.snapshot()),
        }
    }

    async fn list_for_user(&self, owner: UserId) -> Vec<TimerSnapshot> {
        let timers = self.timers.lock().await;
        let mut results: Vec<_> = timers
            .values()
            .filter(|live| live.timer.owner_user_id == owner)
            .map(LiveTimer::snapshot)
            .collect();

        results.sort_by_key(|s| s.timer.started_at);
        results
    }

    async fn cancel_for_workout(&self, workout_id: WorkoutId) -> usize {
        let cancelled: Vec<LiveTimer> = {
            let mut timers = self.timers.lock().await;
            let ids: Vec<TimerId> = timers
                .iter()
                .filter(|(_, live)| live.timer.workout_id == workout_id)
                .map(|(id, _)| id.clone())
                .collect();
            ids.iter().filter_map(|id| timers.remove(id)).collect()
        };

        for live in &cancelled {
            live.task.abort();
            let mut timer = live.timer.clone();
            timer.cancelled = true;
            self.emit(&timer, TimerEventKind::Cancelled);
        }

        if !cancelled.is_empty() {
            info!("Cancelled {} timer(s) of workout {}", cancelled.len(), workout_id);
        }
        cancelled.len()
    }

    fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }
}

/// Whole seconds until `deadline`, rounded up.
fn remaining_seconds(deadline: Instant) -> u64 {
    let left = deadline.saturating_duration_since(Instant::now());
    left.as_secs() + u64::from(left.subsec_nanos() > 0)
}

/// Background countdown of one timer.
async fn run_countdown(
    timer: Timer,
    deadline: Instant,
    timers: Registry,
    events: broadcast::Sender<TimerEvent>,
    config: TimerConfig,
) {
    let expiry = tokio::time::sleep_until(deadline);
    tokio::pin!(expiry);

    if config.progress_notifications {
        let mut ticker = tokio::time::interval_at(Instant::now() + config.tick_interval, config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = &mut expiry => break,
                _ = ticker.tick() => {
                    let remaining = remaining_seconds(deadline);
                    if config.should_notify(remaining) {
                        let _ = events.send(TimerEvent::new(&timer, TimerEventKind::Tick {
                            remaining_seconds: remaining,
                        }));
                    }
                }
            }
        }
    } else {
        expiry.await;
    }

    // A cancel that got the lock first already removed the entry.
    let expired = timers.lock().await.remove(&timer.id);
    if expired.is_some() {
        info!("Timer {} expired", timer.id);
        let _ = events.send(TimerEvent::new(&timer, TimerEventKind::Expired));
    }
}
