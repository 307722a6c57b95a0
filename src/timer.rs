//! Countdown timer driving each timed step and the session clock
//!
//! A `Countdown` is a pure state machine advanced by `tick()`; `run()` feeds
//! it one tick per second from the tokio clock.

use crate::{OratorError, Result};
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

const TICK: Duration = Duration::from_secs(1);

/// Outcome of a single tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Inactive or already finished; nothing changed
    Idle,
    /// One second elapsed, time is still left
    Running { remaining: u32 },
    /// Remaining reached zero on this tick
    Completed,
}

type CompletionCallback = Box<dyn FnMut() + Send>;

pub struct Countdown {
    duration: u32,
    remaining: u32,
    active: bool,
    on_complete: Option<CompletionCallback>,
}

impl std::fmt::Debug for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Countdown")
            .field("duration", &self.duration)
            .field("remaining", &self.remaining)
            .field("active", &self.active)
            .finish()
    }
}

impl Countdown {
    /// Create an inactive countdown of `duration` seconds
    pub fn new(duration: u32) -> Result<Self> {
        if duration == 0 {
            return Err(OratorError::ConfigError(
                "Countdown duration must be positive".into(),
            ));
        }

        Ok(Self {
            duration,
            remaining: duration,
            active: false,
            on_complete: None,
        })
    }

    /// Create a countdown that is already active
    pub fn started(duration: u32) -> Result<Self> {
        let mut countdown = Self::new(duration)?;
        countdown.active = true;
        Ok(countdown)
    }

    /// Register a callback invoked when the countdown reaches zero
    pub fn with_on_complete(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn elapsed(&self) -> u32 {
        self.duration - self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the countdown ran out since it was last configured
    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }

    /// Set the caller-owned active flag
    ///
    /// A finished countdown stays inactive until `set_duration` restarts it.
    pub fn set_active(&mut self, active: bool) {
        self.active = active && self.remaining > 0;
    }

    /// Reconfigure the duration, restarting from the full value
    pub fn set_duration(&mut self, duration: u32) -> Result<()> {
        if duration == 0 {
            return Err(OratorError::ConfigError(
                "Countdown duration must be positive".into(),
            ));
        }
        self.duration = duration;
        self.remaining = duration;
        Ok(())
    }

    /// Advance by one second
    pub fn tick(&mut self) -> Tick {
        if !self.active || self.remaining == 0 {
            return Tick::Idle;
        }

        self.remaining -= 1;
        if self.remaining > 0 {
            return Tick::Running {
                remaining: self.remaining,
            };
        }

        self.active = false;
        if let Some(callback) = self.on_complete.as_mut() {
            callback();
        }
        Tick::Completed
    }

    /// Activate and tick once per second until the countdown completes
    ///
    /// Resolves immediately if the countdown already finished.
    pub async fn run(&mut self) {
        if self.is_finished() {
            return;
        }
        self.active = true;

        let mut ticker = interval_at(Instant::now() + TICK, TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.tick() {
                Tick::Completed => {
                    debug!("Countdown of {}s completed", self.duration);
                    return;
                }
                Tick::Running { .. } => {}
                // Deactivated by the owner while running
                Tick::Idle => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_zero_duration_rejected() {
        assert!(Countdown::new(0).is_err());
        let mut countdown = Countdown::new(3).unwrap();
        assert!(countdown.set_duration(0).is_err());
        assert_eq!(countdown.remaining(), 3);
    }

    #[test]
    fn test_fires_exactly_once_after_duration_ticks() {
        for duration in 1..=12 {
            let fired = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&fired);
            let mut countdown = Countdown::started(duration)
                .unwrap()
                .with_on_complete(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });

            let mut completed_at = None;
            for tick in 1..=(duration + 5) {
                if countdown.tick() == Tick::Completed {
                    completed_at = Some(tick);
                    assert_eq!(countdown.remaining(), 0);
                }
            }

            assert_eq!(completed_at, Some(duration));
            assert_eq!(fired.load(Ordering::SeqCst), 1);
            assert!(!countdown.is_active());
        }
    }

    #[test]
    fn test_inactive_countdown_does_not_move() {
        let mut countdown = Countdown::new(5).unwrap();
        assert_eq!(countdown.tick(), Tick::Idle);
        assert_eq!(countdown.remaining(), 5);

        countdown.set_active(true);
        assert_eq!(countdown.tick(), Tick::Running { remaining: 4 });
        countdown.set_active(false);
        assert_eq!(countdown.tick(), Tick::Idle);
        assert_eq!(countdown.elapsed(), 1);
    }

    #[test]
    fn test_set_duration_restarts_instead_of_resuming() {
        let mut countdown = Countdown::started(5).unwrap();
        countdown.tick();
        countdown.tick();
        assert_eq!(countdown.remaining(), 3);

        countdown.set_duration(8).unwrap();
        assert_eq!(countdown.remaining(), 8);
        assert_eq!(countdown.duration(), 8);
    }

    #[test]
    fn test_finished_countdown_needs_reconfiguration() {
        let mut countdown = Countdown::started(1).unwrap();
        assert_eq!(countdown.tick(), Tick::Completed);

        countdown.set_active(true);
        assert!(!countdown.is_active());
        assert_eq!(countdown.tick(), Tick::Idle);

        countdown.set_duration(2).unwrap();
        countdown.set_active(true);
        assert_eq!(countdown.tick(), Tick::Running { remaining: 1 });
        assert_eq!(countdown.tick(), Tick::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_follows_wall_clock() {
        let started = Instant::now();
        let mut countdown = Countdown::new(5).unwrap();
        countdown.run().await;

        assert_eq!(started.elapsed(), Duration::from_secs(5));
        assert!(countdown.is_finished());
        assert!(!countdown.is_active());

        // A second run does not fire again
        countdown.run().await;
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }
}
