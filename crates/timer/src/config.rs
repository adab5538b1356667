//! Countdown configuration.

use std::time::Duration;

/// Shortest accepted tick interval.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// How countdowns report progress.
#[derive(Debug, Clone, Copy)]
pub struct TimerConfig {
    /// Interval between progress checks, at least [`MIN_TICK_INTERVAL`]
    pub tick_interval: Duration,
    /// Emit a tick whenever the remaining seconds are a multiple of this (0 disables)
    pub notify_every: u64,
    /// Emit a tick on each of the last this-many seconds
    pub final_countdown: u64,
    /// Emit tick events at all
    pub progress_notifications: bool,
    /// Buffered events per subscriber before lagging
    pub event_capacity: usize,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            notify_every: 10,
            final_countdown: 5,
            progress_notifications: true,
            event_capacity: 256,
        }
    }
}

impl TimerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how often the countdown checks for a tick, raised to
    /// [`MIN_TICK_INTERVAL`] if shorter.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(MIN_TICK_INTERVAL);
        self
    }

    /// Set the periodic notification step.
    pub fn with_notify_every(mut self, seconds: u64) -> Self {
        self.notify_every = seconds;
        self
    }

    /// Set the length of the final per-second countdown.
    pub fn with_final_countdown(mut self, seconds: u64) -> Self {
        self.final_countdown = seconds;
        self
    }

    /// Turn tick events on or off. Expiry is always reported.
    pub fn with_progress_notifications(mut self, enabled: bool) -> Self {
        self.progress_notifications = enabled;
        self
    }

    /// Set the broadcast buffer size.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Whether a tick with `remaining` seconds left should be emitted.
    pub fn should_notify(&self, remaining: u64) -> bool {
        if !self.progress_notifications || remaining == 0 {
            return false;
        }
        remaining <= self.final_countdown
            || (self.notify_every > 0 && remaining % self.notify_every == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let config = TimerConfig::default();
        let notified: Vec<u64> = (0..=30).rev().filter(|r| config.should_notify(*r)).collect();
        assert_eq!(notified, vec![30, 20, 10, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_tick_interval_floor() {
        let config = TimerConfig::new().with_tick_interval(Duration::ZERO);
        assert_eq!(config.tick_interval, MIN_TICK_INTERVAL);
        let config = TimerConfig::new().with_tick_interval(Duration::from_millis(500));
        assert_eq!(config.tick_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_disabled_notifications() {
        let config = TimerConfig::new().with_progress_notifications(false);
        assert!(!(1..=20).any(|r| config.should_notify(r)));
    }

    #[test]
    fn test_zero_step_keeps_final_countdown() {
        let config = TimerConfig::new().with_notify_every(0).with_final_countdown(2);
        let notified: Vec<u64> = (0..=12).rev().filter(|r| config.should_notify(*r)).collect();
        assert_eq!(notified, vec![2, 1]);
    }
}
