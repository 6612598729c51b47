pub mod alert;
pub mod availability;
pub mod credentials;
pub mod error;
pub mod monitor;
pub mod notify;
pub(crate) mod retry;
pub mod scheduler;

pub use alert::{classify, AlertState, Classification};
pub use availability::{AvailabilityClient, FetchPolicy, Fetcher, HttpFetcher, HttpFetcherConfig};
pub use credentials::{
    CommandTokenProvider, CredentialRefresher, CredentialStore, FileTokenProvider, RefreshOutcome,
    Token, TokenProvider,
};
pub use error::{FetchError, ProviderError, SendError};
pub use monitor::{CycleOutcome, Monitor, MonitorSettings};
pub use notify::{
    LogSender, MessageSender, NotificationOutcome, Notifier, TelegramSender, TelegramSenderConfig,
};
pub use scheduler::start_refresh_scheduler;
