use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::MessageSender;
use crate::error::SendError;

/// Longest response body excerpt kept in a [`SendError::UnexpectedStatus`].
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Clone)]
pub struct TelegramSenderConfig {
    pub api_base_url: String,
    pub bot_token: String,
    pub chat_id: String,
    /// Forum topic (`message_thread_id`) to post into, if any.
    pub topic_id: Option<i64>,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
}

/// Sends notifications through the Telegram Bot API `sendMessage` method.
///
/// Messages are sent as plain text, so store names need no escaping.
pub struct TelegramSender {
    client: Client,
    endpoint: String,
    chat_id: String,
    topic_id: Option<i64>,
}

impl TelegramSender {
    /// # Errors
    ///
    /// Returns [`SendError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(config: &TelegramSenderConfig) -> Result<Self, SendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let endpoint = format!(
            "{}/bot{}/sendMessage",
            config.api_base_url.trim_end_matches('/'),
            config.bot_token
        );
        Ok(Self {
            client,
            endpoint,
            chat_id: config.chat_id.clone(),
            topic_id: config.topic_id,
        })
    }
}

#[async_trait]
impl MessageSender for TelegramSender {
    async fn send(&self, text: &str) -> Result<(), SendError> {
        let payload = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            disable_web_page_preview: true,
            message_thread_id: self.topic_id,
        };

        let response = self.client.post(&self.endpoint).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SendError::UnexpectedStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        tracing::info!(
            chat_id = %self.chat_id,
            topic_id = ?self.topic_id,
            "telegram notification sent"
        );
        Ok(())
    }
}
