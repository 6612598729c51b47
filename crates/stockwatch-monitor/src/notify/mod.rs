//! Best-effort notifications.
//!
//! [`Notifier`] formats plain-text messages and hands them to a
//! [`MessageSender`]. Delivery failures are logged and reported as a
//! [`NotificationOutcome`]; they never become errors for the caller.

mod log_sender;
mod telegram;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use stockwatch_core::StoreRecord;

use crate::error::{FetchError, SendError};

pub use log_sender::LogSender;
pub use telegram::{TelegramSender, TelegramSenderConfig};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Delivers a formatted text message somewhere a human will see it.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SendError`] on transport failures or non-success statuses.
    async fn send(&self, text: &str) -> Result<(), SendError>;
}

/// What happened to one notification. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent,
    Failed,
}

pub struct Notifier {
    sender: Arc<dyn MessageSender>,
    model_code: String,
    /// Ceiling for a single send.
    send_timeout: Duration,
}

impl Notifier {
    #[must_use]
    pub fn new(
        sender: Arc<dyn MessageSender>,
        model_code: impl Into<String>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            sender,
            model_code: model_code.into(),
            send_timeout,
        }
    }

    /// Announces that `records` can be bought.
    pub async fn notify_available(&self, records: &[StoreRecord]) -> NotificationOutcome {
        let text = build_availability_message(&self.model_code, records, now_local());
        self.deliver(&text).await
    }

    /// Reports a failed availability check.
    pub async fn notify_error(&self, err: &FetchError) -> NotificationOutcome {
        let text = build_error_message(err, now_local());
        self.deliver(&text).await
    }

    /// Sends `text` exactly once, logging any failure.
    pub async fn deliver(&self, text: &str) -> NotificationOutcome {
        let result = match tokio::time::timeout(self.send_timeout, self.sender.send(text)).await {
            Ok(result) => result,
            Err(_) => Err(SendError::Timeout {
                secs: self.send_timeout.as_secs(),
            }),
        };

        match result {
            Ok(()) => NotificationOutcome::Sent,
            Err(e) => {
                tracing::warn!(error = %e, "notification delivery failed");
                NotificationOutcome::Failed
            }
        }
    }
}

fn now_local() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Formats the "in stock" message.
#[must_use]
pub fn build_availability_message(
    model_code: &str,
    records: &[StoreRecord],
    at: NaiveDateTime,
) -> String {
    let stores_block = if records.is_empty() {
        "- No store data available".to_owned()
    } else {
        records
            .iter()
            .map(|r| format!("- {} (inventory {})", r.name, r.inventory_label))
            .collect::<Vec<_>>()
            .join("\n")
    };

    [
        "Apple Store Inventory Alert".to_owned(),
        format!("Model: {model_code}"),
        format!("Updated At: {}", at.format(TIMESTAMP_FORMAT)),
        "Available Stores:".to_owned(),
        stores_block,
    ]
    .join("\n")
}

/// Formats the message sent when an availability check fails.
#[must_use]
pub fn build_error_message(err: &FetchError, at: NaiveDateTime) -> String {
    let details = err.to_string();
    let details = if details.is_empty() {
        "Unknown error".to_owned()
    } else {
        details
    };

    [
        "Apple Store Monitor Error".to_owned(),
        format!("Timestamp: {}", at.format(TIMESTAMP_FORMAT)),
        format!("Error Kind: {}", err.kind()),
        format!("Error Details: {details}"),
    ]
    .join("\n")
}

#[cfg(test)]
#[path = "notify_test.rs"]
mod tests;
