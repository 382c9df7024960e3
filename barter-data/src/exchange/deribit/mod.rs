//! Deribit public REST client.
//!
//! Only unauthenticated market data endpoints are used, so no credentials are required.

use self::model::{DeribitInstrument, DeribitResponse, DeribitTicker};
use crate::{
    error::FeedError,
    options::{OptionChain, OptionChainSource, OptionTicker},
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

/// Deribit API request/response models.
pub mod model;

/// [`Deribit`](DeribitHttpClient) production REST base URL.
///
/// See docs: <https://docs.deribit.com/#market-data>
pub const BASE_URL_DERIBIT: &str = "https://www.deribit.com/api/v2";

/// [`Deribit`](DeribitHttpClient) testnet REST base URL.
pub const BASE_URL_DERIBIT_TESTNET: &str = "https://test.deribit.com/api/v2";

/// Deribit REST client for option instruments and implied volatility.
#[derive(Debug, Clone)]
pub struct DeribitHttpClient {
    client: Client,
    base_url: String,
}

impl Default for DeribitHttpClient {
    fn default() -> Self {
        Self::new(BASE_URL_DERIBIT)
    }
}

impl DeribitHttpClient {
    /// Create a new Deribit HTTP client against the provided base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Send a GET request and unwrap the JSON-RPC envelope.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FeedError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, ?query, "Deribit request");

        let resp = self.client.get(&url).query(query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(status = %status, body = %body, path, "Deribit request failed");
            return Err(FeedError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response: DeribitResponse<T> = resp
            .json()
            .await
            .map_err(|e| FeedError::Parse(e.to_string()))?;

        match (response.result, response.error) {
            (Some(result), _) => Ok(result),
            (None, Some(error)) => Err(FeedError::Api {
                status: status.as_u16(),
                body: format!("{}: {}", error.code, error.message),
            }),
            (None, None) => Err(FeedError::Parse(format!("empty result for {path}"))),
        }
    }

    /// Fetch active option instruments for a currency.
    pub async fn fetch_instruments(
        &self,
        currency: &str,
    ) -> Result<Vec<DeribitInstrument>, FeedError> {
        self.get(
            "/public/get_instruments",
            &[("currency", currency), ("kind", "option"), ("expired", "false")],
        )
        .await
    }

    /// Fetch mark IV and underlying price for every option of a currency in one request.
    pub async fn fetch_book_summaries(
        &self,
        currency: &str,
    ) -> Result<Vec<DeribitTicker>, FeedError> {
        self.get(
            "/public/get_book_summary_by_currency",
            &[("currency", currency), ("kind", "option")],
        )
        .await
    }
}

#[async_trait]
impl OptionChainSource for DeribitHttpClient {
    async fn fetch_chain(&self, currency: &str) -> Result<OptionChain, FeedError> {
        let instruments: Vec<_> = self
            .fetch_instruments(currency)
            .await?
            .iter()
            .filter_map(DeribitInstrument::to_option_instrument)
            .collect();

        if instruments.is_empty() {
            return Err(FeedError::Empty(format!("no {currency} options listed")));
        }

        let tickers: Vec<OptionTicker> = self
            .fetch_book_summaries(currency)
            .await?
            .into_iter()
            .map(OptionTicker::from)
            .collect();

        debug!(
            currency,
            instruments = instruments.len(),
            tickers = tickers.len(),
            "Fetched Deribit option chain"
        );

        Ok(OptionChain {
            instruments,
            tickers,
            fetched_at: Utc::now(),
        })
    }
}
