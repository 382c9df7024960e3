//! Kalshi Trade API v2 public market models.

use crate::catalog::MarketListing;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Response from GET /markets.
///
/// ### Raw Payload
/// ```json
/// {
///   "markets": [
///     {
///       "ticker": "KXBTCD-25JAN1517-T97499.99",
///       "title": "Bitcoin price on Jan 15, 2025?",
///       "yes_sub_title": "$97,500 or above",
///       "status": "active",
///       "close_time": "2025-01-15T22:00:00Z"
///     }
///   ],
///   "cursor": "CgwI..."
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct KalshiMarketsResponse {
    #[serde(default)]
    pub markets: Vec<KalshiMarketData>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Response from GET /markets/{ticker}.
#[derive(Debug, Clone, Deserialize)]
pub struct KalshiMarketResponse {
    pub market: KalshiMarketData,
}

/// A Kalshi market listing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct KalshiMarketData {
    pub ticker: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub yes_sub_title: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub close_time: Option<DateTime<Utc>>,
}

impl KalshiMarketData {
    /// Kalshi reports tradable markets as "active" (or "open" on older API versions).
    pub fn is_active(&self) -> bool {
        matches!(self.status.as_str(), "active" | "open")
    }
}

impl From<KalshiMarketData> for MarketListing {
    fn from(market: KalshiMarketData) -> Self {
        let active = market.is_active();
        Self {
            market_id: SmolStr::new(market.ticker),
            title: market.title,
            subtitle: market.yes_sub_title,
            active,
            close_time: market.close_time,
        }
    }
}

/// Response from GET /markets/{ticker}/orderbook.
///
/// ### Raw Payload
/// ```json
/// { "orderbook": { "yes": [[40, 100], [42, 25]], "no": [[55, 150]] } }
/// ```
///
/// Only bids are published per leg: levels are `(price_cents, quantity)`.
#[derive(Debug, Clone, Deserialize)]
pub struct KalshiOrderbookResponse {
    pub orderbook: KalshiOrderbookData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KalshiOrderbookData {
    #[serde(default, deserialize_with = "de_levels")]
    pub yes: Vec<(u32, u32)>,
    #[serde(default, deserialize_with = "de_levels")]
    pub no: Vec<(u32, u32)>,
}

/// Kalshi returns `null` instead of `[]` for an empty leg.
fn de_levels<'de, D>(deserializer: D) -> Result<Vec<(u32, u32)>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Vec<(u32, u32)>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
