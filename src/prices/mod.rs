//! Price sources.
//!
//! Defines the `PriceSource` trait and the CoinGecko implementation used
//! by the monitor loop.

pub mod coingecko;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::PriceQuote;

/// Abstraction over an external BTC/ETH USD price feed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the current BTC and ETH prices.
    ///
    /// Transport failures, non-success statuses and payloads missing
    /// either price are all errors.
    async fn fetch_quote(&self) -> Result<PriceQuote>;

    /// Source name for logging and identification.
    fn name(&self) -> &'static str;
}
