use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE, REFERER};
use reqwest::Client;

use super::Fetcher;
use crate::error::FetchError;

/// Settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Storefront root including locale, e.g. `https://www.apple.com/hk-zh`.
    pub storefront_url: String,
    /// Product page, sent as `Referer`.
    pub referer: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

/// HTTP client for the storefront's `fulfillment-messages` endpoint.
///
/// Sends the same headers a browser on the product page would, plus the
/// session token as the `Cookie` header when one is available. 429 responses
/// become [`FetchError::RateLimited`]; any other non-2xx status becomes
/// [`FetchError::UnexpectedStatus`].
pub struct HttpFetcher {
    client: Client,
    storefront_url: String,
}

impl HttpFetcher {
    /// Creates an `HttpFetcher` with the configured timeout, `User-Agent`,
    /// and browser-like default headers.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`FetchError::InvalidUrl`] if the referer is
    /// not a valid header value.
    pub fn new(config: &HttpFetcherConfig) -> Result<Self, FetchError> {
        let referer =
            HeaderValue::from_str(&config.referer).map_err(|e| FetchError::InvalidUrl {
                url: config.referer.clone(),
                reason: e.to_string(),
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, referer);
        headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));
        headers.insert("x-skip-redirect", HeaderValue::from_static("true"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            storefront_url: config.storefront_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Builds the pickup availability URL for one part and location.
    ///
    /// Query values are encoded by `reqwest::Url`, so locations with spaces
    /// and part numbers with `/` are safe.
    fn availability_url(&self, product_id: &str, location: &str) -> Result<String, FetchError> {
        let base = format!("{}/shop/fulfillment-messages", self.storefront_url);
        let mut url = reqwest::Url::parse(&base).map_err(|e| FetchError::InvalidUrl {
            url: base.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("fae", "true")
            .append_pair("pl", "true")
            .append_pair("mts.0", "regular")
            .append_pair("parts.0", product_id)
            .append_pair("location", location);
        Ok(url.to_string())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        token: Option<&str>,
        product_id: &str,
        location: &str,
    ) -> Result<serde_json::Value, FetchError> {
        let url = self.availability_url(product_id, location)?;

        let mut request = self.client.get(&url);
        if let Some(token) = token {
            request = request.header(COOKIE, token);
        }
        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(5);
            return Err(FetchError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<serde_json::Value>(&body).map_err(|e| FetchError::Deserialize {
            context: format!("fulfillment response from {url}"),
            source: e,
        })
    }
}
