//! Kalshi public market data REST client.
//!
//! Prices are decimal 0-1 internally, Kalshi quotes cents (1-99).

use self::{
    book::KalshiOrderBook,
    model::{KalshiMarketResponse, KalshiMarketsResponse, KalshiOrderbookResponse},
};
use crate::{
    books::OutcomeBooks,
    catalog::{MarketCatalog, MarketListing},
    error::FeedError,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

/// Normalised Kalshi orderbook with derived asks.
pub mod book;

/// Kalshi API request/response models.
pub mod model;

/// [`Kalshi`](KalshiMarketsClient) production REST base URL.
///
/// See docs: <https://trading-api.readme.io/reference/getmarkets>
pub const BASE_URL_KALSHI: &str = "https://api.elections.kalshi.com/trade-api/v2";

/// [`Kalshi`](KalshiMarketsClient) demo REST base URL.
pub const BASE_URL_KALSHI_DEMO: &str = "https://demo-api.kalshi.co/trade-api/v2";

/// Maximum page size accepted by GET /markets.
const MARKETS_PAGE_LIMIT: &str = "1000";

/// Upper bound on pages followed when listing markets.
const MAX_PAGES: usize = 20;

/// Kalshi REST client for unauthenticated market data.
#[derive(Debug, Clone)]
pub struct KalshiMarketsClient {
    client: Client,
    base_url: String,
}

impl Default for KalshiMarketsClient {
    fn default() -> Self {
        Self::new(false)
    }
}

impl KalshiMarketsClient {
    /// Create a new Kalshi market data client.
    pub fn new(demo: bool) -> Self {
        let base_url = if demo {
            BASE_URL_KALSHI_DEMO
        } else {
            BASE_URL_KALSHI
        };

        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FeedError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, ?query, "Kalshi request");

        let resp = self.client.get(&url).query(query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(status = %status, body = %body, path, "Kalshi request failed");
            return Err(FeedError::Api {
                status: status.as_u16(),
                body,
            });
        }

        resp.json()
            .await
            .map_err(|e| FeedError::Parse(e.to_string()))
    }
}

#[async_trait]
impl MarketCatalog for KalshiMarketsClient {
    async fn active_markets(&self, series: Option<&str>) -> Result<Vec<MarketListing>, FeedError> {
        let mut listings = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut query = vec![("status", "open"), ("limit", MARKETS_PAGE_LIMIT)];
            if let Some(series) = series {
                query.push(("series_ticker", series));
            }
            if let Some(cursor) = cursor.as_deref() {
                query.push(("cursor", cursor));
            }

            let page: KalshiMarketsResponse = self.get("/markets", &query).await?;
            listings.extend(
                page.markets
                    .into_iter()
                    .map(MarketListing::from)
                    .filter(|listing| listing.active),
            );

            match page.cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        debug!(count = listings.len(), ?series, "Listed active Kalshi markets");
        Ok(listings)
    }

    async fn market(&self, market_id: &str) -> Result<MarketListing, FeedError> {
        let response: KalshiMarketResponse =
            self.get(&format!("/markets/{market_id}"), &[]).await?;
        Ok(response.market.into())
    }

    async fn order_book(&self, market_id: &str) -> Result<OutcomeBooks, FeedError> {
        let response: KalshiOrderbookResponse = self
            .get(&format!("/markets/{market_id}/orderbook"), &[])
            .await?;
        Ok(KalshiOrderBook::from_data(&response.orderbook).to_outcome_books())
    }
}
