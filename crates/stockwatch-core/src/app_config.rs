use std::path::PathBuf;

/// Where the monitor obtains its session token from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Shell command whose trimmed stdout is the token.
    Command(String),
    /// File whose trimmed contents are the token, re-read on every refresh.
    File(PathBuf),
}

/// Telegram Bot API destination for notifications.
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub topic_id: Option<i64>,
    pub api_base_url: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[redacted]")
            .field("chat_id", &self.chat_id)
            .field("topic_id", &self.topic_id)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub store_base_url: String,
    /// Locale path segment such as `hk-zh`; empty for the US storefront.
    pub store_locale: String,
    pub product_path: String,
    pub model_code: String,
    pub location: String,
    pub check_interval_ms: u64,
    pub alert_check_interval_ms: u64,
    pub alert_reset_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub fetch_max_retries: u32,
    pub fetch_retry_backoff_ms: u64,
    pub token_refresh_interval_secs: u64,
    pub token_timeout_secs: u64,
    /// Minimum spacing of token refreshes triggered by rejected requests.
    pub token_refresh_cooldown_secs: u64,
    pub token_source: Option<TokenSource>,
    pub telegram: Option<TelegramConfig>,
}

impl AppConfig {
    /// Storefront root including the locale prefix, without a trailing slash.
    ///
    /// `https://www.apple.com` + `hk-zh` gives `https://www.apple.com/hk-zh`.
    #[must_use]
    pub fn storefront_url(&self) -> String {
        let base = self.store_base_url.trim_end_matches('/');
        let locale = self.store_locale.trim_matches('/');
        if locale.is_empty() {
            base.to_owned()
        } else {
            format!("{base}/{locale}")
        }
    }

    /// Product page URL, sent as the `Referer` of availability requests.
    #[must_use]
    pub fn product_page_url(&self) -> String {
        format!(
            "{}/{}",
            self.storefront_url(),
            self.product_path.trim_start_matches('/')
        )
    }
}
