use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use super::{CredentialStore, TokenProvider};
use crate::error::ProviderError;

/// Result of one [`CredentialRefresher::refresh`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    /// The provider failed; the previous token, if any, is still in place.
    Failed,
    /// Another refresh was already running.
    Skipped,
}

/// Obtains tokens from a [`TokenProvider`] and writes them into the shared
/// [`CredentialStore`].
///
/// Failures are logged and absorbed: callers (the startup path, the scheduled
/// job, on-demand refreshes) never see an error, and a stale token is never
/// cleared. At most one refresh runs at a time, and on-demand refreshes are
/// spaced at least `on_demand_cooldown` after the previous attempt.
pub struct CredentialRefresher {
    provider: Arc<dyn TokenProvider>,
    store: Arc<CredentialStore>,
    /// Ceiling for a single provider invocation.
    timeout: Duration,
    on_demand_cooldown: Duration,
    /// Start of the most recent attempt, successful or not.
    last_attempt: Mutex<Option<Instant>>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when a refresh ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CredentialRefresher {
    #[must_use]
    pub fn new(
        provider: Arc<dyn TokenProvider>,
        store: Arc<CredentialStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            timeout,
            on_demand_cooldown: Duration::ZERO,
            last_attempt: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Minimum time between the previous attempt and an on-demand refresh.
    /// Scheduled and startup refreshes ignore it.
    #[must_use]
    pub fn with_on_demand_cooldown(mut self, cooldown: Duration) -> Self {
        self.on_demand_cooldown = cooldown;
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Obtains a new token and stores it.
    pub async fn refresh(&self) -> RefreshOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("token refresh already in progress; skipping");
            return RefreshOutcome::Skipped;
        }
        let _guard = InFlightGuard(&self.in_flight);
        *self.last_attempt() = Some(Instant::now());

        tracing::info!("refreshing session token");
        match self.obtain().await {
            Ok(token) => {
                self.store.set(token, Instant::now());
                tracing::info!("session token refreshed");
                RefreshOutcome::Refreshed
            }
            Err(e) => {
                let has_token = self.store.get().is_some();
                tracing::warn!(
                    error = %e,
                    keeping_existing_token = has_token,
                    "session token refresh failed"
                );
                RefreshOutcome::Failed
            }
        }
    }

    /// Starts a refresh in the background unless one is already running or
    /// the previous attempt is younger than the on-demand cooldown.
    ///
    /// Used when the storefront rejects the current token; the caller does not
    /// wait for the result. Returns whether a refresh was started.
    pub fn spawn_refresh(self: &Arc<Self>) -> bool {
        if self.in_flight.load(Ordering::Acquire) {
            tracing::debug!("token refresh already in progress; not spawning another");
            return false;
        }

        let now = Instant::now();
        {
            let mut last_attempt = self.last_attempt();
            if let Some(at) = *last_attempt {
                let since = now.saturating_duration_since(at);
                if since < self.on_demand_cooldown {
                    tracing::debug!(
                        since_last_attempt_ms = since.as_millis(),
                        cooldown_ms = self.on_demand_cooldown.as_millis(),
                        "token refreshed recently; not refreshing again yet"
                    );
                    return false;
                }
            }
            *last_attempt = Some(now);
        }

        let token_age_secs = self.store.last_refresh_age(now).map(|age| age.as_secs());
        tracing::info!(?token_age_secs, "starting on-demand token refresh");
        let refresher = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = refresher.refresh().await;
            tracing::debug!(?outcome, "on-demand token refresh finished");
        });
        true
    }

    fn last_attempt(&self) -> MutexGuard<'_, Option<Instant>> {
        self.last_attempt
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs the provider on its own task so a panic surfaces as a
    /// [`ProviderError`] instead of unwinding into the caller, and bounds it by
    /// the timeout ceiling.
    async fn obtain(&self) -> Result<String, ProviderError> {
        let provider = Arc::clone(&self.provider);
        let mut handle = tokio::spawn(async move { provider.obtain().await });

        let token = match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_error)) => return Err(ProviderError::Panicked(join_error.to_string())),
            Err(_) => {
                handle.abort();
                return Err(ProviderError::Timeout {
                    secs: self.timeout.as_secs(),
                });
            }
        };

        let token = token.trim();
        if token.is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(token.to_owned())
    }
}

#[cfg(test)]
#[path = "refresher_test.rs"]
mod tests;
