use crate::error::FeedError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Call or put.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Call,
    Put,
}

/// Listed option contract on the reference volatility venue.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OptionInstrument {
    /// Venue instrument name (eg/ "BTC-27DEC24-100000-C")
    pub name: SmolStr,
    pub strike: f64,
    pub expiry: DateTime<Utc>,
    pub kind: OptionKind,
}

/// Latest volatility quote for an [`OptionInstrument`].
///
/// Implied volatilities are in percentage units (eg/ 55.2 == 55.2%), as quoted by the venue.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct OptionTicker {
    pub name: SmolStr,
    pub mark_iv: Option<f64>,
    pub bid_iv: Option<f64>,
    pub ask_iv: Option<f64>,
    pub underlying_price: Option<f64>,
}

/// Raw instrument list and tickers fetched in one refresh.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct OptionChain {
    pub instruments: Vec<OptionInstrument>,
    pub tickers: Vec<OptionTicker>,
    /// When the chain was fetched.
    pub fetched_at: DateTime<Utc>,
}

/// Source of option chains for a currency (eg/ "BTC").
#[async_trait]
pub trait OptionChainSource: Send + Sync {
    async fn fetch_chain(&self, currency: &str) -> Result<OptionChain, FeedError>;
}
