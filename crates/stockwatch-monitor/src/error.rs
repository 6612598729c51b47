use thiserror::Error;

/// HTTP statuses the storefront uses to reject stale or missing credentials.
///
/// 541 is Apple's bot-protection response.
const CREDENTIAL_REJECTION_STATUSES: [u16; 3] = [401, 403, 541];

/// The token provider could not produce a usable session token.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to run token command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("token command exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    #[error("failed to read token file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("token source produced an empty token")]
    Empty,

    #[error("token provider timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("token provider panicked: {0}")]
    Panicked(String),
}

/// The availability query failed; every variant is recoverable by the loop.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("availability request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("invalid availability URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FetchError {
    /// Short machine-friendly name of the error kind, used in error notifications.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Http(_) => "http",
            FetchError::RateLimited { .. } => "rate_limited",
            FetchError::UnexpectedStatus { .. } => "unexpected_status",
            FetchError::Deserialize { .. } => "malformed_response",
            FetchError::Timeout { .. } => "timeout",
            FetchError::InvalidUrl { .. } => "invalid_url",
        }
    }

    /// Returns `true` when the storefront refused the request because of its
    /// credentials, meaning a token refresh is worth attempting right away.
    #[must_use]
    pub fn is_credential_rejection(&self) -> bool {
        match self {
            FetchError::UnexpectedStatus { status, .. } => {
                CREDENTIAL_REJECTION_STATUSES.contains(status)
            }
            _ => false,
        }
    }
}

/// A notification could not be delivered. Logged, never escalated.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from message API: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("message delivery timed out after {secs}s")]
    Timeout { secs: u64 },
}
