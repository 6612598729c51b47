//! In-cycle retry with exponential back-off and jitter for availability fetches.
//!
//! The poll loop already runs every few seconds, so retries here are short and
//! capped: they only smooth over a dropped connection or a single 5xx before
//! the cycle gives up and reports the error.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Upper bound for a single back-off sleep.
const MAX_DELAY_MS: u64 = 5_000;

/// Returns `true` for errors that are worth retrying within the same cycle.
///
/// **Retriable:** network timeouts and connection failures, the request
/// timeout ceiling, HTTP 429 and HTTP 5xx.
///
/// **Not retriable:** credential rejections and other 4xx, malformed
/// payloads, invalid URLs.
pub(crate) fn is_retriable(err: &FetchError) -> bool {
    match err {
        FetchError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        FetchError::RateLimited { .. } | FetchError::Timeout { .. } => true,
        FetchError::UnexpectedStatus { status, .. } => {
            *status >= 500 && !err.is_credential_rejection()
        }
        FetchError::Deserialize { .. } | FetchError::InvalidUrl { .. } => false,
    }
}

/// Back-off before retry number `attempt` (1-based), before jitter.
///
/// A rate-limited response asks for at least its `Retry-After`, still capped
/// at [`MAX_DELAY_MS`].
fn base_delay_ms(backoff_base_ms: u64, attempt: u32, err: &FetchError) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
    let requested = match err {
        FetchError::RateLimited { retry_after_secs } => retry_after_secs.saturating_mul(1_000),
        _ => 0,
    };
    computed.max(requested).min(MAX_DELAY_MS)
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 250`:
///
/// | Retry | Sleep before it                |
/// |-------|--------------------------------|
/// | 1     | 250 ms × 2⁰ ± 25 % jitter      |
/// | 2     | 250 ms × 2¹ ± 25 % jitter      |
/// | 3     | 250 ms × 2² ± 25 % jitter      |
///
/// Each sleep, jitter included, is capped at 5 s. Non-retriable errors are
/// returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let capped = base_delay_ms(backoff_base_ms, attempt, &err);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = ((capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64)
                    .min(MAX_DELAY_MS);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient availability error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
