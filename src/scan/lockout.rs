//! Detection lockout window
//!
//! Camera decoders report the same marker many times per second. After a
//! scan is forwarded, every detection within the window is dropped,
//! whatever its value.

use std::time::{Duration, Instant};

/// Rate limiter placed in front of the navigator
#[derive(Debug, Clone)]
pub struct Lockout {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Lockout {
    /// A zero window admits everything
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    /// Whether a detection at `now` may pass; records it if so
    pub fn admit(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.window {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }
}
