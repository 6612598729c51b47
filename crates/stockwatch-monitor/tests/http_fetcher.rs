//! Integration tests for `HttpFetcher` and `AvailabilityClient` against a
//! local `wiremock` server standing in for the storefront.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stockwatch_core::StoreRecord;
use stockwatch_monitor::{
    AvailabilityClient, CredentialStore, FetchError, FetchPolicy, Fetcher, HttpFetcher,
    HttpFetcherConfig,
};

const PART: &str = "MG8G4ZA/A";
const FULFILLMENT_PATH: &str = "/hk-zh/shop/fulfillment-messages";

fn test_fetcher(server: &MockServer) -> HttpFetcher {
    let storefront_url = format!("{}/hk-zh", server.uri());
    HttpFetcher::new(&HttpFetcherConfig {
        referer: format!("{storefront_url}/shop/buy-iphone/iphone-17-pro"),
        storefront_url,
        user_agent: "stockwatch-test/0.1".to_owned(),
        timeout_secs: 5,
    })
    .expect("failed to build test HttpFetcher")
}

fn test_client(server: &MockServer, store: Arc<CredentialStore>) -> AvailabilityClient {
    AvailabilityClient::new(
        Arc::new(test_fetcher(server)),
        store,
        PART,
        "Hong Kong",
        FetchPolicy {
            request_timeout: Duration::from_secs(5),
            max_retries: 0,
            backoff_base_ms: 0,
        },
    )
}

fn pickup_json() -> serde_json::Value {
    json!({
        "head": { "status": "200", "data": {} },
        "body": {
            "content": {
                "pickupMessage": {
                    "stores": [
                        {
                            "storeName": "Causeway Bay",
                            "storeNumber": "R409",
                            "partsAvailability": {
                                PART: {
                                    "pickupDisplay": "available",
                                    "buyability": { "isBuyable": true, "reason": "", "inventory": 5 }
                                }
                            }
                        },
                        {
                            "storeName": "ifc mall",
                            "storeNumber": "R428",
                            "partsAvailability": {
                                PART: {
                                    "pickupDisplay": "ineligible",
                                    "buyability": { "isBuyable": false, "inventory": 0 }
                                }
                            }
                        }
                    ]
                }
            }
        }
    })
}

#[tokio::test]
async fn fetch_sends_query_and_cookie_and_parses_stores() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FULFILLMENT_PATH))
        .and(query_param("fae", "true"))
        .and(query_param("pl", "true"))
        .and(query_param("mts.0", "regular"))
        .and(query_param("parts.0", PART))
        .and(query_param("location", "Hong Kong"))
        .and(header("cookie", "dssid2=abc; as_sfa=xyz"))
        .and(header("x-skip-redirect", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pickup_json()))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(CredentialStore::new());
    store.set("dssid2=abc; as_sfa=xyz", tokio::time::Instant::now());
    let result = test_client(&server, store).fetch().await;

    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    assert_eq!(
        result.unwrap().records,
        vec![
            StoreRecord::new("Causeway Bay", true, "5"),
            StoreRecord::new("ifc mall", false, "0"),
        ]
    );
}

#[tokio::test]
async fn fetch_without_token_sends_no_cookie() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FULFILLMENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(pickup_json()))
        .mount(&server)
        .await;

    let result = test_fetcher(&server).fetch(None, PART, "Hong Kong").await;
    assert!(result.is_ok(), "expected Ok, got: {result:?}");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(
        requests[0].headers.get("cookie").is_none(),
        "anonymous fetch must not send a Cookie header"
    );
    assert!(requests[0].headers.get("referer").is_some());
}

#[tokio::test]
async fn bot_protection_status_is_credential_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FULFILLMENT_PATH))
        .respond_with(ResponseTemplate::new(541))
        .mount(&server)
        .await;

    let err = test_fetcher(&server)
        .fetch(Some("dssid2=stale"), PART, "Hong Kong")
        .await
        .unwrap_err();

    match &err {
        FetchError::UnexpectedStatus { status, url } => {
            assert_eq!(*status, 541);
            assert!(url.contains("/shop/fulfillment-messages?"), "{url}");
        }
        other => panic!("expected FetchError::UnexpectedStatus, got: {other:?}"),
    }
    assert!(err.is_credential_rejection());
}

#[tokio::test]
async fn rate_limit_reads_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FULFILLMENT_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "3"))
        .mount(&server)
        .await;

    let err = test_fetcher(&server)
        .fetch(None, PART, "Hong Kong")
        .await
        .unwrap_err();

    assert!(
        matches!(err, FetchError::RateLimited { retry_after_secs: 3 }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn non_json_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FULFILLMENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
        .mount(&server)
        .await;

    let result = test_client(&server, Arc::new(CredentialStore::new()))
        .fetch()
        .await;

    assert!(
        matches!(result, Err(FetchError::Deserialize { .. })),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn server_error_is_retried_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FULFILLMENT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(FULFILLMENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(pickup_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = AvailabilityClient::new(
        Arc::new(test_fetcher(&server)),
        Arc::new(CredentialStore::new()),
        PART,
        "Hong Kong",
        FetchPolicy {
            request_timeout: Duration::from_secs(5),
            max_retries: 1,
            backoff_base_ms: 0,
        },
    );

    let result = client.fetch().await;
    assert!(result.is_ok(), "expected Ok after retry, got: {result:?}");
}
