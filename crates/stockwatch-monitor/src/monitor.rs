//! The poll loop.
//!
//! Each cycle fetches availability, runs the alert state machine, notifies on
//! transitions, and picks the next sleep: fast while an alert is armed, slow
//! otherwise or after a failed fetch. No error ends the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::alert::{classify, AlertState};
use crate::availability::AvailabilityClient;
use crate::credentials::CredentialRefresher;
use crate::notify::Notifier;

/// Poll cadence and alert debounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Sleep between polls while nothing is available (or after an error).
    pub check_interval: Duration,
    /// Sleep between polls while an alert is armed.
    pub alert_check_interval: Duration,
    /// Minimum time between repeat notifications for sustained availability.
    pub alert_reset: Duration,
}

impl MonitorSettings {
    /// Sleep before the next cycle.
    #[must_use]
    pub fn next_interval(&self, state: AlertState, outcome: CycleOutcome) -> Duration {
        match outcome {
            CycleOutcome::Failed => self.check_interval,
            CycleOutcome::Checked { .. } if state.armed => self.alert_check_interval,
            CycleOutcome::Checked { .. } => self.check_interval,
        }
    }
}

/// What one cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Checked { available: usize, notified: bool },
    Failed,
}

pub struct Monitor {
    client: AvailabilityClient,
    notifier: Notifier,
    /// Asked for an immediate refresh when the storefront rejects the token.
    refresher: Option<Arc<CredentialRefresher>>,
    settings: MonitorSettings,
    state: AlertState,
    attempt: u64,
}

impl Monitor {
    #[must_use]
    pub fn new(
        client: AvailabilityClient,
        notifier: Notifier,
        refresher: Option<Arc<CredentialRefresher>>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            client,
            notifier,
            refresher,
            settings,
            state: AlertState::disarmed(),
            attempt: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> AlertState {
        self.state
    }

    /// Polls forever. Only process termination stops it.
    pub async fn run(mut self) {
        tracing::info!(
            part = %self.client.product_id(),
            check_interval_ms = self.settings.check_interval.as_millis(),
            alert_check_interval_ms = self.settings.alert_check_interval.as_millis(),
            "starting inventory monitor"
        );
        loop {
            let sleep_for = self.run_cycle().await;
            tokio::time::sleep(sleep_for).await;
        }
    }

    /// Runs one poll cycle and returns how long to sleep before the next.
    pub async fn run_cycle(&mut self) -> Duration {
        self.attempt += 1;
        self.state = self.state.expire(Instant::now(), self.settings.alert_reset);

        let outcome = match self.client.fetch().await {
            Ok(result) => {
                for record in &result.records {
                    tracing::info!(
                        store = %record.name,
                        inventory = %record.inventory_label,
                        buyable = record.is_buyable,
                        "store status"
                    );
                }

                let classification = classify(
                    &result,
                    self.state,
                    Instant::now(),
                    self.settings.alert_reset,
                );
                if classification.should_notify {
                    let names: Vec<&str> = classification
                        .available
                        .iter()
                        .map(|r| r.name.as_str())
                        .collect();
                    tracing::info!(stores = %names.join(", "), "in stock");
                    let _ = self
                        .notifier
                        .notify_available(&classification.available)
                        .await;
                }
                self.state = classification.state;
                CycleOutcome::Checked {
                    available: classification.available.len(),
                    notified: classification.should_notify,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "availability check failed");
                if e.is_credential_rejection() {
                    if let Some(refresher) = &self.refresher {
                        tracing::info!("storefront rejected session token; requesting refresh");
                        refresher.spawn_refresh();
                    }
                }
                let _ = self.notifier.notify_error(&e).await;
                CycleOutcome::Failed
            }
        };

        let sleep_for = self.settings.next_interval(self.state, outcome);
        match outcome {
            CycleOutcome::Failed => tracing::info!(
                retry_in_ms = sleep_for.as_millis(),
                attempt = self.attempt + 1,
                "retrying after failed check"
            ),
            CycleOutcome::Checked { .. } if !self.state.armed => tracing::info!(
                retry_in_ms = sleep_for.as_millis(),
                attempt = self.attempt + 1,
                "no stock yet; retrying"
            ),
            CycleOutcome::Checked { .. } => {}
        }
        sleep_for
    }
}

#[cfg(test)]
#[path = "monitor_test.rs"]
mod tests;
