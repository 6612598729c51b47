use std::path::PathBuf;

use crate::app_config::{AppConfig, TelegramConfig, TokenSource};
use crate::ConfigError;

const DEFAULT_PRODUCT_PATH: &str = "shop/buy-iphone/iphone-17-pro/6.3-%E5%90%8B%E9%A1%AF%E7%A4%BA%E5%99%A8-256gb-%E9%8A%80%E8%89%B2";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    // Empty values count as unset so `.env` templates with blank entries work.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_positive_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let value = parse_u64(var, default)?;
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(value)
    };

    let log_level = or_default("STOCKWATCH_LOG_LEVEL", "info");
    let store_base_url = or_default("STOCKWATCH_STORE_BASE_URL", "https://www.apple.com");
    let store_locale = or_default("STOCKWATCH_STORE_LOCALE", "hk-zh");
    let product_path = or_default("STOCKWATCH_PRODUCT_PATH", DEFAULT_PRODUCT_PATH);
    let model_code = or_default("STOCKWATCH_MODEL_CODE", "MG8G4ZA/A");
    let location = or_default("STOCKWATCH_LOCATION", "Hong Kong");

    let check_interval_ms = parse_positive_u64("STOCKWATCH_CHECK_INTERVAL_MS", "3000")?;
    let alert_check_interval_ms =
        parse_positive_u64("STOCKWATCH_ALERT_CHECK_INTERVAL_MS", "1500")?;
    let alert_reset_secs = parse_u64("STOCKWATCH_ALERT_RESET_SECS", "5")?;
    let request_timeout_secs = parse_positive_u64("STOCKWATCH_REQUEST_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("STOCKWATCH_USER_AGENT", DEFAULT_USER_AGENT);
    let fetch_max_retries = parse_u32("STOCKWATCH_FETCH_MAX_RETRIES", "1")?;
    let fetch_retry_backoff_ms = parse_u64("STOCKWATCH_FETCH_RETRY_BACKOFF_MS", "250")?;

    let token_refresh_interval_secs =
        parse_positive_u64("STOCKWATCH_TOKEN_REFRESH_INTERVAL_SECS", "1800")?;
    let token_timeout_secs = parse_positive_u64("STOCKWATCH_TOKEN_TIMEOUT_SECS", "60")?;
    let token_refresh_cooldown_secs =
        parse_u64("STOCKWATCH_TOKEN_REFRESH_COOLDOWN_SECS", "60")?;
    let token_source = match (
        optional("STOCKWATCH_TOKEN_COMMAND"),
        optional("STOCKWATCH_TOKEN_FILE"),
    ) {
        (Some(command), _) => Some(TokenSource::Command(command)),
        (None, Some(path)) => Some(TokenSource::File(PathBuf::from(path))),
        (None, None) => None,
    };

    let telegram = match (optional("TELEGRAM_BOT_TOKEN"), optional("TELEGRAM_CHAT_ID")) {
        (Some(bot_token), Some(chat_id)) => {
            let topic_id = optional("TELEGRAM_TOPIC_ID")
                .map(|raw| {
                    raw.parse::<i64>().map_err(|e| ConfigError::InvalidEnvVar {
                        var: "TELEGRAM_TOPIC_ID".to_string(),
                        reason: e.to_string(),
                    })
                })
                .transpose()?;
            Some(TelegramConfig {
                bot_token,
                chat_id,
                topic_id,
                api_base_url: or_default("TELEGRAM_API_BASE_URL", "https://api.telegram.org"),
            })
        }
        _ => None,
    };

    Ok(AppConfig {
        log_level,
        store_base_url,
        store_locale,
        product_path,
        model_code,
        location,
        check_interval_ms,
        alert_check_interval_ms,
        alert_reset_secs,
        request_timeout_secs,
        user_agent,
        fetch_max_retries,
        fetch_retry_backoff_ms,
        token_refresh_interval_secs,
        token_timeout_secs,
        token_refresh_cooldown_secs,
        token_source,
        telegram,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
