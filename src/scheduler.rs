//! Leading/trailing edge scheduling
//!
//! One state machine covers both rate limiters the editor needs:
//! - **throttle** (leading + trailing): the first trigger fires at once and
//!   opens a window; triggers inside the window collapse into one trailing
//!   fire when it closes, which opens a fresh window.
//! - **debounce** (trailing only): every trigger restarts the window; the
//!   scheduler fires once the window closes without another trigger.
//!
//! The scheduler never sleeps itself. The owner polls [`EdgeScheduler::deadline`]
//! in its event loop and calls [`EdgeScheduler::expire`] when it passes.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMode {
    LeadingAndTrailing,
    Trailing,
}

#[derive(Debug, Clone)]
pub struct EdgeScheduler {
    mode: EdgeMode,
    window: Duration,
    deadline: Option<Instant>,
    pending: bool,
}

impl EdgeScheduler {
    pub fn throttle(window: Duration) -> Self {
        Self::new(EdgeMode::LeadingAndTrailing, window)
    }

    pub fn debounce(window: Duration) -> Self {
        Self::new(EdgeMode::Trailing, window)
    }

    pub fn new(mode: EdgeMode, window: Duration) -> Self {
        Self {
            mode,
            window,
            deadline: None,
            pending: false,
        }
    }

    /// Record a trigger. Returns true when the caller should act right now.
    pub fn trigger(&mut self, now: Instant) -> bool {
        match self.mode {
            EdgeMode::LeadingAndTrailing => {
                if self.deadline.is_none() {
                    self.deadline = Some(now + self.window);
                    true
                } else {
                    self.pending = true;
                    false
                }
            }
            EdgeMode::Trailing => {
                self.deadline = Some(now + self.window);
                self.pending = true;
                false
            }
        }
    }

    /// When the current window closes, if one is open
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Close the window. Returns true when a trailing fire is due.
    ///
    /// A throttle that fires on the trailing edge opens a new window starting
    /// at `now`. Calling this before the deadline is a no-op.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {}
            _ => return false,
        }
        self.deadline = None;
        if !self.pending {
            return false;
        }
        self.pending = false;
        if self.mode == EdgeMode::LeadingAndTrailing {
            self.deadline = Some(now + self.window);
        }
        true
    }

    /// Drop any open window and pending fire
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.pending = false;
    }
}

/// Sleep until `deadline`, or forever when there is none. Meant for
/// `tokio::select!` branches.
pub async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
