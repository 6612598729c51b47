use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.store_base_url, "https://www.apple.com");
    assert_eq!(cfg.store_locale, "hk-zh");
    assert_eq!(cfg.model_code, "MG8G4ZA/A");
    assert_eq!(cfg.location, "Hong Kong");
    assert_eq!(cfg.check_interval_ms, 3000);
    assert_eq!(cfg.alert_check_interval_ms, 1500);
    assert_eq!(cfg.alert_reset_secs, 5);
    assert_eq!(cfg.request_timeout_secs, 10);
    assert_eq!(cfg.fetch_max_retries, 1);
    assert_eq!(cfg.fetch_retry_backoff_ms, 250);
    assert_eq!(cfg.token_refresh_interval_secs, 1800);
    assert_eq!(cfg.token_timeout_secs, 60);
    assert_eq!(cfg.token_refresh_cooldown_secs, 60);
    assert!(cfg.token_source.is_none());
    assert!(cfg.telegram.is_none());
}

#[test]
fn storefront_url_includes_locale() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.storefront_url(), "https://www.apple.com/hk-zh");
    assert!(cfg
        .product_page_url()
        .starts_with("https://www.apple.com/hk-zh/shop/buy-iphone/"));
}

#[test]
fn storefront_url_without_locale() {
    let mut map = HashMap::new();
    map.insert("STOCKWATCH_STORE_BASE_URL", "https://www.apple.com/");
    map.insert("STOCKWATCH_STORE_LOCALE", "");
    map.insert("STOCKWATCH_PRODUCT_PATH", "/shop/buy-iphone");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.storefront_url(), "https://www.apple.com");
    assert_eq!(
        cfg.product_page_url(),
        "https://www.apple.com/shop/buy-iphone"
    );
}

#[test]
fn check_interval_override() {
    let mut map = HashMap::new();
    map.insert("STOCKWATCH_CHECK_INTERVAL_MS", "5000");
    map.insert("STOCKWATCH_ALERT_CHECK_INTERVAL_MS", "750");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.check_interval_ms, 5000);
    assert_eq!(cfg.alert_check_interval_ms, 750);
}

#[test]
fn check_interval_invalid() {
    let mut map = HashMap::new();
    map.insert("STOCKWATCH_CHECK_INTERVAL_MS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "STOCKWATCH_CHECK_INTERVAL_MS"),
        "expected InvalidEnvVar(STOCKWATCH_CHECK_INTERVAL_MS), got: {result:?}"
    );
}

#[test]
fn zero_check_interval_is_rejected() {
    let mut map = HashMap::new();
    map.insert("STOCKWATCH_ALERT_CHECK_INTERVAL_MS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "STOCKWATCH_ALERT_CHECK_INTERVAL_MS"),
        "expected InvalidEnvVar(STOCKWATCH_ALERT_CHECK_INTERVAL_MS), got: {result:?}"
    );
}

#[test]
fn zero_alert_reset_is_allowed() {
    let mut map = HashMap::new();
    map.insert("STOCKWATCH_ALERT_RESET_SECS", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.alert_reset_secs, 0);
}

#[test]
fn token_refresh_cooldown_override() {
    let mut map = HashMap::new();
    map.insert("STOCKWATCH_TOKEN_REFRESH_COOLDOWN_SECS", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.token_refresh_cooldown_secs, 0);
}

#[test]
fn fetch_max_retries_invalid() {
    let mut map = HashMap::new();
    map.insert("STOCKWATCH_FETCH_MAX_RETRIES", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "STOCKWATCH_FETCH_MAX_RETRIES"),
        "expected InvalidEnvVar(STOCKWATCH_FETCH_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn token_command_takes_precedence_over_file() {
    let mut map = HashMap::new();
    map.insert("STOCKWATCH_TOKEN_COMMAND", "node capture-cookies.js");
    map.insert("STOCKWATCH_TOKEN_FILE", "/tmp/cookies.txt");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.token_source,
        Some(TokenSource::Command("node capture-cookies.js".to_string()))
    );
}

#[test]
fn token_file_source() {
    let mut map = HashMap::new();
    map.insert("STOCKWATCH_TOKEN_FILE", "/tmp/cookies.txt");
    map.insert("STOCKWATCH_TOKEN_COMMAND", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.token_source,
        Some(TokenSource::File(PathBuf::from("/tmp/cookies.txt")))
    );
}

#[test]
fn telegram_requires_token_and_chat_id() {
    let mut map = HashMap::new();
    map.insert("TELEGRAM_BOT_TOKEN", "123:abc");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.telegram.is_none());
}

#[test]
fn telegram_config_with_topic() {
    let mut map = HashMap::new();
    map.insert("TELEGRAM_BOT_TOKEN", "123:abc");
    map.insert("TELEGRAM_CHAT_ID", "-100200300");
    map.insert("TELEGRAM_TOPIC_ID", "42");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let telegram = cfg.telegram.expect("telegram should be configured");
    assert_eq!(telegram.chat_id, "-100200300");
    assert_eq!(telegram.topic_id, Some(42));
    assert_eq!(telegram.api_base_url, "https://api.telegram.org");
}

#[test]
fn telegram_topic_id_invalid() {
    let mut map = HashMap::new();
    map.insert("TELEGRAM_BOT_TOKEN", "123:abc");
    map.insert("TELEGRAM_CHAT_ID", "-100200300");
    map.insert("TELEGRAM_TOPIC_ID", "general");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TELEGRAM_TOPIC_ID"),
        "expected InvalidEnvVar(TELEGRAM_TOPIC_ID), got: {result:?}"
    );
}

#[test]
fn telegram_debug_redacts_bot_token() {
    let mut map = HashMap::new();
    map.insert("TELEGRAM_BOT_TOKEN", "123:super-secret");
    map.insert("TELEGRAM_CHAT_ID", "-100200300");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret"), "{rendered}");
    assert!(rendered.contains("[redacted]"));
}
