//! Availability queries: the [`Fetcher`] capability, the HTTP implementation,
//! and [`AvailabilityClient`], which turns raw payloads into a [`PollResult`].

mod http;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stockwatch_core::PollResult;

use crate::credentials::CredentialStore;
use crate::error::FetchError;
use crate::retry::retry_with_backoff;
use types::FulfillmentResponse;

pub use http::{HttpFetcher, HttpFetcherConfig};

/// Retrieves the raw availability payload for one product and location.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch current availability. `token` is `None` when no session token
    /// has been obtained yet; the request then goes out anonymously.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failures or non-success statuses.
    async fn fetch(
        &self,
        token: Option<&str>,
        product_id: &str,
        location: &str,
    ) -> Result<serde_json::Value, FetchError>;
}

/// Retry and timeout policy applied around each [`Fetcher`] call.
#[derive(Debug, Clone, Copy)]
pub struct FetchPolicy {
    /// Ceiling for a single fetch attempt.
    pub request_timeout: Duration,
    /// Additional attempts after the first for transient errors.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

/// Fetches and normalizes availability for a fixed product and location.
pub struct AvailabilityClient {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<CredentialStore>,
    product_id: String,
    location: String,
    policy: FetchPolicy,
}

impl AvailabilityClient {
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<CredentialStore>,
        product_id: impl Into<String>,
        location: impl Into<String>,
        policy: FetchPolicy,
    ) -> Self {
        Self {
            fetcher,
            store,
            product_id: product_id.into(),
            location: location.into(),
            policy,
        }
    }

    #[must_use]
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// Fetches current availability, retrying transient failures in-cycle.
    ///
    /// The token is read once per attempt, so a retry picks up a token that
    /// was refreshed in the meantime.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Timeout`] if an attempt exceeds the request timeout.
    /// - [`FetchError::Deserialize`] if the payload lacks the store list.
    /// - Any error returned by the [`Fetcher`].
    pub async fn fetch(&self) -> Result<PollResult, FetchError> {
        let payload = retry_with_backoff(
            self.policy.max_retries,
            self.policy.backoff_base_ms,
            || self.fetch_once(),
        )
        .await?;
        self.parse(payload)
    }

    async fn fetch_once(&self) -> Result<serde_json::Value, FetchError> {
        let token = self.store.get().map(|t| t.value);
        if token.is_none() {
            tracing::debug!("no session token available; fetching anonymously");
        }

        let call = self
            .fetcher
            .fetch(token.as_deref(), &self.product_id, &self.location);
        tokio::time::timeout(self.policy.request_timeout, call)
            .await
            .map_err(|_| FetchError::Timeout {
                secs: self.policy.request_timeout.as_secs(),
            })?
    }

    fn parse(&self, payload: serde_json::Value) -> Result<PollResult, FetchError> {
        let response: FulfillmentResponse =
            serde_json::from_value(payload).map_err(|e| FetchError::Deserialize {
                context: format!(
                    "fulfillment response (part={}, location={})",
                    self.product_id, self.location
                ),
                source: e,
            })?;

        let records = response
            .body
            .content
            .pickup_message
            .stores
            .iter()
            .map(|store| store.to_record(&self.product_id))
            .collect();
        Ok(PollResult::new(records))
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
