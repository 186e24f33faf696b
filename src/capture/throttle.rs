//! Minimum-interval gate for the frame stream

use std::time::{Duration, Instant};

/// Default spacing between processed frames
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Lets through at most one frame per `min_interval`.
///
/// Frames arriving early are dropped outright: no queueing and no signal
/// back to the producer, so the pipeline always works on the freshest frame.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    min_interval: Duration,
    last_processed_at: Option<Instant>,
}

impl Default for FrameThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

impl FrameThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_processed_at: None,
        }
    }

    pub fn last_processed_at(&self) -> Option<Instant> {
        self.last_processed_at
    }

    /// Returns true and records `now` when enough time has passed since the
    /// last accepted frame. A rejected call leaves the state untouched.
    pub fn should_process(&mut self, now: Instant) -> bool {
        let due = match self.last_processed_at {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.min_interval,
        };
        if due {
            self.last_processed_at = Some(now);
        }
        due
    }
}
