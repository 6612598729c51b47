use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// A session token and the instant it was last successfully refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub refreshed_at: Instant,
}

/// Thread-safe holder of the current session token.
///
/// Value and timestamp live behind one lock so readers never observe a value
/// from one write paired with the timestamp of another. The lock is never held
/// across an `.await`.
#[derive(Debug, Default)]
pub struct CredentialStore {
    current: Mutex<Option<Token>>,
}

impl CredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the held token and its refresh time.
    pub fn set(&self, value: impl Into<String>, now: Instant) {
        let token = Token {
            value: value.into(),
            refreshed_at: now,
        };
        *self.lock() = Some(token);
    }

    /// Returns the current token, or `None` if no refresh has succeeded yet.
    #[must_use]
    pub fn get(&self) -> Option<Token> {
        self.lock().clone()
    }

    /// Time since the last successful refresh, or `None` if never refreshed.
    #[must_use]
    pub fn last_refresh_age(&self, now: Instant) -> Option<Duration> {
        self.lock()
            .as_ref()
            .map(|t| now.saturating_duration_since(t.refreshed_at))
    }

    // A panic while holding the lock cannot leave a half-written `Option<Token>`,
    // so a poisoned lock is still safe to read.
    fn lock(&self) -> MutexGuard<'_, Option<Token>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
