//! Session token handling.
//!
//! A [`CredentialStore`] holds the current token and is shared by `Arc`
//! between the [`CredentialRefresher`] (the only writer) and the availability
//! client (a reader). How a token is produced is hidden behind
//! [`TokenProvider`].

mod provider;
mod refresher;
mod store;

use async_trait::async_trait;

use crate::error::ProviderError;

pub use provider::{CommandTokenProvider, FileTokenProvider};
pub use refresher::{CredentialRefresher, RefreshOutcome};
pub use store::{CredentialStore, Token};

/// Produces a fresh session token, e.g. a `Cookie` header captured from a
/// browser session.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain a new token.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when no usable token could be produced.
    async fn obtain(&self) -> Result<String, ProviderError>;
}
