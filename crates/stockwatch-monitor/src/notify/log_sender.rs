use async_trait::async_trait;

use super::MessageSender;
use crate::error::SendError;

/// Fallback sender used when no messaging destination is configured.
///
/// Logs the message instead of delivering it, so alerts still show up in the
/// monitor's output.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSender;

#[async_trait]
impl MessageSender for LogSender {
    async fn send(&self, text: &str) -> Result<(), SendError> {
        tracing::warn!("notification destination not configured; skipping delivery");
        tracing::info!(message = %text, "undelivered notification");
        Ok(())
    }
}
