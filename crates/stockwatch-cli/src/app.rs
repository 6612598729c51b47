//! Wires configuration into the monitor's components and runs the
//! subcommands.

use std::sync::Arc;
use std::time::Duration;

use stockwatch_core::{AppConfig, TokenSource};
use stockwatch_monitor::{
    start_refresh_scheduler, AvailabilityClient, CommandTokenProvider, CredentialRefresher,
    CredentialStore, FetchPolicy, FileTokenProvider, HttpFetcher, HttpFetcherConfig, LogSender,
    MessageSender, Monitor, MonitorSettings, NotificationOutcome, Notifier, RefreshOutcome,
    TelegramSender, TelegramSenderConfig, TokenProvider,
};

pub(crate) fn token_provider(source: &TokenSource) -> Arc<dyn TokenProvider> {
    match source {
        TokenSource::Command(command) => Arc::new(CommandTokenProvider::new(command.clone())),
        TokenSource::File(path) => Arc::new(FileTokenProvider::new(path.clone())),
    }
}

/// Telegram when configured, otherwise messages only go to the log.
pub(crate) fn message_sender(config: &AppConfig) -> anyhow::Result<Arc<dyn MessageSender>> {
    let Some(telegram) = &config.telegram else {
        tracing::warn!("TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID not set; alerts will only be logged");
        return Ok(Arc::new(LogSender));
    };
    let sender = TelegramSender::new(&TelegramSenderConfig {
        api_base_url: telegram.api_base_url.clone(),
        bot_token: telegram.bot_token.clone(),
        chat_id: telegram.chat_id.clone(),
        topic_id: telegram.topic_id,
        timeout_secs: config.request_timeout_secs,
    })?;
    Ok(Arc::new(sender))
}

pub(crate) fn monitor_settings(config: &AppConfig) -> MonitorSettings {
    MonitorSettings {
        check_interval: Duration::from_millis(config.check_interval_ms),
        alert_check_interval: Duration::from_millis(config.alert_check_interval_ms),
        alert_reset: Duration::from_secs(config.alert_reset_secs),
    }
}

pub(crate) fn fetch_policy(config: &AppConfig) -> FetchPolicy {
    FetchPolicy {
        request_timeout: Duration::from_secs(config.request_timeout_secs),
        max_retries: config.fetch_max_retries,
        backoff_base_ms: config.fetch_retry_backoff_ms,
    }
}

fn availability_client(
    config: &AppConfig,
    store: Arc<CredentialStore>,
) -> anyhow::Result<AvailabilityClient> {
    let fetcher = HttpFetcher::new(&HttpFetcherConfig {
        storefront_url: config.storefront_url(),
        referer: config.product_page_url(),
        user_agent: config.user_agent.clone(),
        timeout_secs: config.request_timeout_secs,
    })?;
    Ok(AvailabilityClient::new(
        Arc::new(fetcher),
        store,
        config.model_code.clone(),
        config.location.clone(),
        fetch_policy(config),
    ))
}

/// Builds the refresher and performs the startup refresh. A failed startup
/// refresh is logged and the monitor carries on anonymously.
async fn credentials(
    config: &AppConfig,
    store: &Arc<CredentialStore>,
) -> Option<Arc<CredentialRefresher>> {
    let Some(source) = &config.token_source else {
        tracing::warn!("no token source configured; requests will be sent without a session");
        return None;
    };
    let refresher = Arc::new(
        CredentialRefresher::new(
            token_provider(source),
            Arc::clone(store),
            Duration::from_secs(config.token_timeout_secs),
        )
        .with_on_demand_cooldown(Duration::from_secs(config.token_refresh_cooldown_secs)),
    );
    if refresher.refresh().await != RefreshOutcome::Refreshed {
        tracing::warn!("startup token refresh failed; continuing without a session token");
    }
    Some(refresher)
}

pub(crate) async fn run_monitor(config: &AppConfig) -> anyhow::Result<()> {
    let store = Arc::new(CredentialStore::new());
    let refresher = credentials(config, &store).await;

    // Dropping the scheduler handle stops the schedule.
    let _scheduler = match &refresher {
        Some(refresher) => Some(
            start_refresh_scheduler(
                Arc::clone(refresher),
                Duration::from_secs(config.token_refresh_interval_secs),
            )
            .await?,
        ),
        None => None,
    };

    let client = availability_client(config, store)?;
    let notifier = Notifier::new(
        message_sender(config)?,
        config.model_code.clone(),
        Duration::from_secs(config.request_timeout_secs),
    );

    tracing::info!(
        model = %config.model_code,
        location = %config.location,
        url = %config.product_page_url(),
        "monitor configured"
    );
    Monitor::new(client, notifier, refresher, monitor_settings(config))
        .run()
        .await;
    Ok(())
}

pub(crate) async fn run_check(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let store = Arc::new(CredentialStore::new());
    let _refresher = credentials(config, &store).await;
    let result = availability_client(config, store)?.fetch().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result.records)?);
        return Ok(());
    }

    if result.is_empty() {
        println!("no stores returned for {}", config.model_code);
        return Ok(());
    }
    let width = result
        .records
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0);
    for record in &result.records {
        let status = if record.is_buyable { "AVAILABLE" } else { "-" };
        println!(
            "{:<width$}  {:<9}  {}",
            record.name, status, record.inventory_label
        );
    }
    println!(
        "{} of {} stores available",
        result.available().count(),
        result.records.len()
    );
    Ok(())
}

pub(crate) async fn run_notify_test(config: &AppConfig) -> anyhow::Result<()> {
    let notifier = Notifier::new(
        message_sender(config)?,
        config.model_code.clone(),
        Duration::from_secs(config.request_timeout_secs),
    );
    let text = format!(
        "Apple Store Monitor Test\nModel: {}\nLocation: {}",
        config.model_code, config.location
    );
    match notifier.deliver(&text).await {
        NotificationOutcome::Sent => {
            println!("test notification sent");
            Ok(())
        }
        NotificationOutcome::Failed => anyhow::bail!("test notification failed; see log"),
    }
}
