//! CoinGecko client against the local stub.

use arb_monitor::config::PriceSourceConfig;
use arb_monitor::prices::coingecko::CoinGeckoClient;
use arb_monitor::prices::PriceSource;
use arb_monitor::types::MonitorError;
use rust_decimal_macros::dec;
use secrecy::SecretString;

use crate::stub_server::{price_body, StubServer};

fn client(server: &StubServer, key: Option<&str>) -> CoinGeckoClient {
    let cfg = PriceSourceConfig {
        base_url: server.base_url.clone(),
        timeout_secs: 5,
        ..PriceSourceConfig::default()
    };
    CoinGeckoClient::from_config(&cfg, key.map(|k| SecretString::new(k.to_string()))).unwrap()
}

#[tokio::test]
async fn test_fetch_quote_sends_expected_request() {
    let server = StubServer::start(vec![(200, price_body("50000", "3000.25"))]).await;
    let quote = client(&server, Some("secret-key")).fetch_quote().await.unwrap();

    assert_eq!(quote.prices.btc, dec!(50000));
    assert_eq!(quote.prices.eth, dec!(3000.25));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.headers.get("accept").unwrap(), "application/json");
    assert_eq!(req.headers.get("x_cg_pro_api_key").unwrap(), "secret-key");
    assert_eq!(req.query.get("ids").map(String::as_str), Some("bitcoin,ethereum"));
    assert_eq!(req.query.get("vs_currencies").map(String::as_str), Some("usd"));
}

#[tokio::test]
async fn test_no_key_no_header() {
    let server = StubServer::start(vec![(200, price_body("1", "2"))]).await;
    client(&server, None).fetch_quote().await.unwrap();

    let requests = server.requests();
    assert!(requests[0].headers.get("x_cg_pro_api_key").is_none());
}

#[tokio::test]
async fn test_custom_key_header() {
    let server = StubServer::start(vec![(200, price_body("1", "2"))]).await;
    let cfg = PriceSourceConfig {
        base_url: server.base_url.clone(),
        api_key_header: "x-cg-demo-api-key".into(),
        ..PriceSourceConfig::default()
    };
    let client =
        CoinGeckoClient::from_config(&cfg, Some(SecretString::new("demo".into()))).unwrap();
    client.fetch_quote().await.unwrap();

    assert_eq!(server.requests()[0].headers.get("x-cg-demo-api-key").unwrap(), "demo");
}

#[tokio::test]
async fn test_error_status_fails() {
    let server = StubServer::start(vec![(429, "rate limited".to_string())]).await;
    let err = client(&server, None).fetch_quote().await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("429"), "{msg}");
    assert!(msg.contains("rate limited"), "{msg}");
}

#[tokio::test]
async fn test_malformed_body_fails() {
    let server = StubServer::start(vec![(200, r#"{"bitcoin":{"usd":50000}}"#.to_string())]).await;
    let err = client(&server, None).fetch_quote().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MonitorError>(),
        Some(MonitorError::MalformedQuote(_))
    ));
}

#[tokio::test]
async fn test_unreachable_host_fails() {
    let cfg = PriceSourceConfig {
        base_url: "http://127.0.0.1:1/api/v3".into(),
        timeout_secs: 2,
        ..PriceSourceConfig::default()
    };
    let client = CoinGeckoClient::from_config(&cfg, None).unwrap();
    assert!(client.fetch_quote().await.is_err());
}
