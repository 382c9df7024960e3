//! Configuration types for the volatility-smile arbitrage strategy.

use super::{
    discovery::{compile_pattern, DiscoveryMode},
    settlement::parse_settlement_date,
};
use crate::{
    config::{ConfigError, ParamReader},
    context::Params,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::time::Duration;

/// Configuration for the smile arbitrage strategy.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SmileArbConfig {
    /// Options currency on the volatility venue (e.g., "BTC")
    pub currency: String,
    /// Calendar date the target markets settle on (noon Eastern Time)
    pub settlement_date: NaiveDate,
    /// Case-insensitive regex applied to market text when auto-scanning
    pub market_pattern: String,
    /// Venue series to restrict auto-scan listings to
    pub series_ticker: Option<String>,
    /// Fixed market ids, non-empty selects manual mode
    pub market_ids: Vec<SmolStr>,
    /// Minimum edge over theoretical value, in dollars per contract
    pub edge_buffer: f64,
    /// Minimum resting quantity on the side being traded
    pub min_depth: Decimal,
    /// Contracts per order
    pub order_size: Decimal,
    pub max_notional_per_strike: Decimal,
    pub max_notional_per_expiry: Decimal,
    pub iv_refresh_secs: u64,
    pub discovery_refresh_secs: u64,
    /// Stop trading this many minutes before settlement
    pub cutoff_minutes: u64,
    /// Timeout for each external fetch
    pub fetch_timeout_secs: u64,
}

impl Default for SmileArbConfig {
    fn default() -> Self {
        Self {
            currency: "BTC".to_string(),
            settlement_date: NaiveDate::default(),
            market_pattern: String::new(),
            series_ticker: None,
            market_ids: Vec::new(),
            edge_buffer: 0.02,
            min_depth: Decimal::new(10, 0),
            order_size: Decimal::new(10, 0),
            max_notional_per_strike: Decimal::new(100, 0), // $100
            max_notional_per_expiry: Decimal::new(500, 0), // $500
            iv_refresh_secs: 60,
            discovery_refresh_secs: 300,
            cutoff_minutes: 30,
            fetch_timeout_secs: 10,
        }
    }
}

impl SmileArbConfig {
    /// Parse the host parameter map. `settlementDate` is required and may be
    /// ISO (`2025-01-15`) or free text (`Jan 15, 2025`).
    pub fn from_params(params: &Params, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        let reader = ParamReader::new(params);
        let defaults = Self::default();

        let settlement_text = reader
            .string("settlementDate")
            .ok_or(ConfigError::Missing { key: "settlementDate" })?;
        let settlement_date = parse_settlement_date(&settlement_text, now)
            .ok_or(ConfigError::InvalidDate { value: settlement_text })?;

        let market_pattern = reader.string("marketPattern").unwrap_or_default();
        compile_pattern(&market_pattern)?;

        Ok(Self {
            currency: reader.string("currency").unwrap_or(defaults.currency),
            settlement_date,
            market_pattern,
            series_ticker: reader.string("seriesTicker"),
            market_ids: reader
                .string_list("marketIds")
                .into_iter()
                .map(SmolStr::from)
                .collect(),
            edge_buffer: reader.f64("edgeBuffer", defaults.edge_buffer)?,
            min_depth: reader.decimal("minDepth", defaults.min_depth)?,
            order_size: reader.decimal("orderSize", defaults.order_size)?,
            max_notional_per_strike: reader.decimal("maxNotionalPerStrike", defaults.max_notional_per_strike)?,
            max_notional_per_expiry: reader.decimal("maxNotionalPerExpiry", defaults.max_notional_per_expiry)?,
            iv_refresh_secs: reader.u64("ivRefreshSecs", defaults.iv_refresh_secs)?,
            discovery_refresh_secs: reader.u64("discoveryRefreshSecs", defaults.discovery_refresh_secs)?,
            cutoff_minutes: reader.u64("cutoffMinutes", defaults.cutoff_minutes)?,
            fetch_timeout_secs: reader.u64("fetchTimeoutSecs", defaults.fetch_timeout_secs)?,
        })
    }

    pub fn discovery_mode(&self) -> DiscoveryMode {
        if self.market_ids.is_empty() {
            DiscoveryMode::AutoScan {
                pattern: self.market_pattern.clone(),
                series: self.series_ticker.clone(),
                settlement_date: self.settlement_date,
            }
        } else {
            DiscoveryMode::Manual {
                market_ids: self.market_ids.clone(),
                settlement_date: self.settlement_date,
            }
        }
    }

    pub fn iv_refresh_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(saturating_i64(self.iv_refresh_secs))
    }

    pub fn discovery_refresh_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(saturating_i64(self.discovery_refresh_secs))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn saturating_i64(value: u64) -> i64 {
    // TimeDelta caps at i64::MAX milliseconds
    i64::try_from(value).unwrap_or(i64::MAX).min(i64::MAX / 1_000)
}
