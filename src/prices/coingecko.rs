//! CoinGecko price feed.
//!
//! API: `https://api.coingecko.com/api/v3/simple/price`
//! Auth: optional key header (`x_cg_pro_api_key` by default). Works
//! unauthenticated on the public tier, with tighter rate limits.
//!
//! Response shape: `{"bitcoin":{"usd":67123.4},"ethereum":{"usd":3456.7}}`

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, ACCEPT};
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::PriceSource;
use crate::config::PriceSourceConfig;
use crate::types::{MonitorError, PriceQuote};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const SOURCE_NAME: &str = "coingecko";
const COIN_IDS: &str = "bitcoin,ethereum";
const VS_CURRENCY: &str = "usd";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct UsdPrice {
    usd: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    bitcoin: Option<UsdPrice>,
    ethereum: Option<UsdPrice>,
}

/// Parse a `simple/price` body into a quote.
pub fn parse_quote(body: &str) -> Result<PriceQuote> {
    let resp: SimplePriceResponse = serde_json::from_str(body)
        .map_err(|e| MonitorError::MalformedQuote(e.to_string()))?;

    let btc = usd_of(resp.bitcoin, "bitcoin")?;
    let eth = usd_of(resp.ethereum, "ethereum")?;
    Ok(PriceQuote::new(btc, eth))
}

fn usd_of(entry: Option<UsdPrice>, coin: &str) -> Result<Decimal, MonitorError> {
    entry
        .and_then(|p| p.usd)
        .ok_or_else(|| MonitorError::MalformedQuote(format!("missing {coin}.usd")))
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
    api_key_header: HeaderName,
}

impl CoinGeckoClient {
    /// Client against the public endpoint with default settings.
    pub fn new(api_key: Option<SecretString>) -> Result<Self> {
        Self::from_config(&PriceSourceConfig::default(), api_key)
    }

    pub fn from_config(cfg: &PriceSourceConfig, api_key: Option<SecretString>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent("ARB-MONITOR/0.1.0")
            .build()
            .context("Failed to build CoinGecko HTTP client")?;

        let api_key_header = HeaderName::from_bytes(cfg.api_key_header.as_bytes())
            .with_context(|| format!("Invalid API key header name: {}", cfg.api_key_header))?;

        // An empty key behaves like no key at all
        let api_key = api_key.filter(|k| !k.expose_secret().is_empty());

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            api_key_header,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn price_url(&self) -> String {
        format!("{}/simple/price", self.base_url)
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn fetch_quote(&self) -> Result<PriceQuote> {
        let mut req = self
            .http
            .get(self.price_url())
            .query(&[("ids", COIN_IDS), ("vs_currencies", VS_CURRENCY)])
            .header(ACCEPT, "application/json");

        if let Some(key) = &self.api_key {
            let mut value = HeaderValue::from_str(key.expose_secret())
                .context("API key is not a valid header value")?;
            value.set_sensitive(true);
            req = req.header(self.api_key_header.clone(), value);
        }

        let resp = req.send().await.context("CoinGecko request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!(
                "CoinGecko API error: {status} {}",
                body.chars().take(200).collect::<String>()
            );
        }

        let body = resp
            .text()
            .await
            .context("Failed to read CoinGecko response body")?;
        let quote = parse_quote(&body)?;

        debug!(btc = %quote.prices.btc, eth = %quote.prices.eth, "CoinGecko quote");
        Ok(quote)
    }

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
