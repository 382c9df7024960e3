//! Discovery of the prediction markets to trade for one settlement date.
//!
//! Either auto-scans the venue's active listings for titles matching a
//! pattern and settling on the target date, or resolves a fixed list of
//! market ids.

use super::settlement::{eastern_date, parse_settlement_date, strip_dates};
use crate::config::ConfigError;
use barter_data::{
    catalog::{MarketCatalog, MarketListing},
    error::FeedError,
};
use chrono::{DateTime, NaiveDate, Utc};
use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use smol_str::SmolStr;
use std::{str::FromStr, sync::LazyLock};
use tracing::{debug, info, warn};

static DOLLAR_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s*(\d{1,3}(?:,\d{3})+|\d+)(\.\d+)?").expect("valid dollar amount regex")
});

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid number regex"));

/// How markets are selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryMode {
    /// Scan active listings whose text matches `pattern` (case-insensitive)
    /// and settles on `settlement_date`.
    AutoScan {
        pattern: String,
        series: Option<String>,
        settlement_date: NaiveDate,
    },
    /// Trade exactly these markets, assumed to settle on `settlement_date`.
    Manual {
        market_ids: Vec<SmolStr>,
        settlement_date: NaiveDate,
    },
}

impl DiscoveryMode {
    pub fn settlement_date(&self) -> NaiveDate {
        match self {
            DiscoveryMode::AutoScan { settlement_date, .. } | DiscoveryMode::Manual { settlement_date, .. } => {
                *settlement_date
            }
        }
    }
}

/// A tradeable market with its parsed strike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredMarket {
    pub market_id: SmolStr,
    pub strike: Decimal,
    pub settlement_date: NaiveDate,
    pub title: String,
}

/// Compile a market pattern the way discovery matches it.
pub fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|error| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: error.to_string(),
        })
}

/// Strike price quoted in market text.
///
/// Prefers the first `$` amount (thousands separators allowed). Otherwise
/// takes the largest number left once dates are removed.
pub fn extract_strike(text: &str) -> Option<Decimal> {
    if let Some(captures) = DOLLAR_AMOUNT.captures(text) {
        let whole = captures[1].replace(',', "");
        let fraction = captures.get(2).map_or("", |fraction| fraction.as_str());
        if let Ok(strike) = Decimal::from_str(&format!("{whole}{fraction}")) {
            if strike > Decimal::ZERO {
                return Some(strike);
            }
        }
    }

    let stripped = strip_dates(text);
    NUMBER
        .find_iter(&stripped)
        .filter_map(|number| Decimal::from_str(&number.as_str().replace(',', "")).ok())
        .filter(|number| *number > Decimal::ZERO)
        .max()
}

/// Discovery mode plus the cached result of the last successful refresh.
#[derive(Debug, Clone)]
pub struct MarketDiscovery {
    mode: DiscoveryMode,
    pattern: Option<Regex>,
    refresh_interval: chrono::Duration,
    markets: Vec<DiscoveredMarket>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl MarketDiscovery {
    pub fn new(mode: DiscoveryMode, refresh_interval: chrono::Duration) -> Result<Self, ConfigError> {
        let pattern = match &mode {
            DiscoveryMode::AutoScan { pattern, .. } => Some(compile_pattern(pattern)?),
            DiscoveryMode::Manual { .. } => None,
        };

        Ok(Self {
            mode,
            pattern,
            refresh_interval,
            markets: Vec::new(),
            refreshed_at: None,
        })
    }

    pub fn mode(&self) -> &DiscoveryMode {
        &self.mode
    }

    /// Markets from the last successful refresh, sorted by strike.
    pub fn markets(&self) -> &[DiscoveredMarket] {
        &self.markets
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn set_refresh_interval(&mut self, refresh_interval: chrono::Duration) {
        self.refresh_interval = refresh_interval;
    }

    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.refreshed_at
            .map_or(true, |refreshed_at| now - refreshed_at >= self.refresh_interval)
    }

    /// Replace the cached markets with a fresh discovery result.
    pub fn update(&mut self, mut markets: Vec<DiscoveredMarket>, now: DateTime<Utc>) {
        markets.sort_by(|a, b| a.strike.cmp(&b.strike));
        self.markets = markets;
        self.refreshed_at = Some(now);
    }

    /// Query `catalog` for the current set of markets without touching the
    /// cache.
    pub async fn discover<C>(&self, catalog: &C, now: DateTime<Utc>) -> Result<Vec<DiscoveredMarket>, FeedError>
    where
        C: MarketCatalog + ?Sized,
    {
        match &self.mode {
            DiscoveryMode::AutoScan {
                series,
                settlement_date,
                ..
            } => {
                let listings = catalog.active_markets(series.as_deref()).await?;
                let total = listings.len();

                let markets: Vec<_> = listings
                    .iter()
                    .filter(|listing| listing.active)
                    .filter(|listing| {
                        self.pattern
                            .as_ref()
                            .map_or(true, |pattern| pattern.is_match(&listing.full_text()))
                    })
                    .filter_map(|listing| resolve_listing(listing, Some(*settlement_date), now))
                    .collect();

                info!(
                    total,
                    matched = markets.len(),
                    %settlement_date,
                    "Auto-scan discovery complete"
                );
                Ok(markets)
            }
            DiscoveryMode::Manual {
                market_ids,
                settlement_date,
            } => {
                let mut markets = Vec::with_capacity(market_ids.len());
                let mut last_error = None;

                for market_id in market_ids {
                    match catalog.market(market_id).await {
                        Ok(listing) => {
                            if let Some(mut market) = resolve_listing(&listing, None, now) {
                                market.settlement_date = *settlement_date;
                                markets.push(market);
                            }
                        }
                        Err(error) => {
                            warn!(%market_id, %error, "Failed to resolve configured market");
                            last_error = Some(error);
                        }
                    }
                }

                match last_error {
                    Some(error) if markets.is_empty() => Err(error),
                    _ => {
                        info!(resolved = markets.len(), configured = market_ids.len(), "Manual discovery complete");
                        Ok(markets)
                    }
                }
            }
        }
    }
}

/// Turn a listing into a [`DiscoveredMarket`], requiring a parseable strike
/// and, if `target_date` is given, a matching settlement date.
///
/// The settlement date comes from the listing text, falling back to the
/// Eastern date of its close time.
pub fn resolve_listing(
    listing: &MarketListing,
    target_date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> Option<DiscoveredMarket> {
    let text = listing.full_text();

    let Some(strike) = extract_strike(&text) else {
        debug!(market_id = %listing.market_id, %text, "No strike in market text");
        return None;
    };

    let settlement_date = parse_settlement_date(&text, now)
        .or_else(|| listing.close_time.map(eastern_date));

    let settlement_date = match (settlement_date, target_date) {
        (Some(date), Some(target)) if date != target => return None,
        (Some(date), _) => date,
        (None, Some(_)) => {
            debug!(market_id = %listing.market_id, "No settlement date for market");
            return None;
        }
        (None, None) => NaiveDate::default(),
    };

    Some(DiscoveredMarket {
        market_id: listing.market_id.clone(),
        strike,
        settlement_date,
        title: listing.title.clone(),
    })
}
