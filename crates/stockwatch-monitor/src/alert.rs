//! Debounced availability alert.
//!
//! # State Machine
//!
//! ```text
//!               available (notify)
//!  Disarmed ─────────────────────────► Armed(t)
//!     ▲                                 │  │
//!     │        nothing available        │  │ available, now - t >= reset
//!     └─────────────────────────────────┘  │ (notify, re-arm at now)
//!                                          ▼
//!                                       Armed(now)
//! ```
//!
//! Notifications fire on the edge into availability and then at most once
//! per reset window while stores stay available.

use std::time::Duration;

use stockwatch_core::{PollResult, StoreRecord};
use tokio::time::Instant;

/// Whether a notification has already fired for the current episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlertState {
    pub armed: bool,
    pub last_fired_at: Option<Instant>,
}

impl AlertState {
    #[must_use]
    pub fn disarmed() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn armed_at(now: Instant) -> Self {
        Self {
            armed: true,
            last_fired_at: Some(now),
        }
    }

    /// `true` when armed and the reset window since the last fire has passed.
    #[must_use]
    pub fn reset_elapsed(&self, now: Instant, reset: Duration) -> bool {
        match (self.armed, self.last_fired_at) {
            (true, Some(fired)) => now.saturating_duration_since(fired) >= reset,
            // Armed without a timestamp cannot be produced by `classify`;
            // treat it as expired so the next availability notifies.
            (true, None) => true,
            (false, _) => false,
        }
    }

    /// Disarms if the reset window has elapsed; otherwise returns `self`.
    #[must_use]
    pub fn expire(self, now: Instant, reset: Duration) -> Self {
        if self.reset_elapsed(now, reset) {
            Self::disarmed()
        } else {
            self
        }
    }
}

/// Outcome of [`classify`] for one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Buyable stores, in response order.
    pub available: Vec<StoreRecord>,
    pub state: AlertState,
    pub should_notify: bool,
}

/// Decides the next alert state and whether this cycle should notify.
#[must_use]
pub fn classify(
    current: &PollResult,
    state: AlertState,
    now: Instant,
    reset: Duration,
) -> Classification {
    let available: Vec<StoreRecord> = current.available().cloned().collect();

    if available.is_empty() {
        return Classification {
            available,
            state: AlertState::disarmed(),
            should_notify: false,
        };
    }

    if !state.armed || state.reset_elapsed(now, reset) {
        return Classification {
            available,
            state: AlertState::armed_at(now),
            should_notify: true,
        };
    }

    Classification {
        available,
        state,
        should_notify: false,
    }
}
