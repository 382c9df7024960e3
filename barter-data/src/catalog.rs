use crate::{books::OutcomeBooks, error::FeedError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A market listed on the prediction venue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MarketListing {
    /// Venue market identifier (eg/ Kalshi ticker "KXBTCD-25JAN1517-T97499.99").
    pub market_id: SmolStr,
    /// Human readable title, the strike and settlement date are parsed from this.
    pub title: String,
    /// Optional subtitle (Kalshi `yes_sub_title`), often carries the strike.
    pub subtitle: Option<String>,
    /// Whether the market currently accepts orders.
    pub active: bool,
    pub close_time: Option<DateTime<Utc>>,
}

impl MarketListing {
    /// Title and subtitle joined, used for pattern matching and parsing.
    pub fn full_text(&self) -> String {
        match &self.subtitle {
            Some(subtitle) if !subtitle.is_empty() => format!("{} {}", self.title, subtitle),
            _ => self.title.clone(),
        }
    }
}

/// Market listing and top-of-book access for the prediction venue.
#[async_trait]
pub trait MarketCatalog: Send + Sync {
    /// List active markets, optionally restricted to a venue series.
    async fn active_markets(&self, series: Option<&str>) -> Result<Vec<MarketListing>, FeedError>;

    /// Look up a single market by identifier.
    async fn market(&self, market_id: &str) -> Result<MarketListing, FeedError>;

    /// Fetch top-of-book for both legs of a market.
    async fn order_book(&self, market_id: &str) -> Result<OutcomeBooks, FeedError>;
}
