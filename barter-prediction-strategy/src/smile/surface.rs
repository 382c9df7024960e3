//! Implied volatility snapshot built from an option chain.

use super::pricing::{years_between, PricingError};
use barter_data::options::{OptionChain, OptionKind, OptionTicker};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// Implied volatilities quoted at one strike, as decimals (0.55 = 55%).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StrikeIv {
    pub strike: f64,
    /// Bid/ask mid IV, falling back to the mark when either side is missing
    pub call_iv: Option<f64>,
    pub put_iv: Option<f64>,
    pub call_mark_iv: Option<f64>,
    pub put_mark_iv: Option<f64>,
}

impl StrikeIv {
    /// Mark IV used for pricing: call first, put as fallback.
    pub fn mark_iv(&self) -> Option<f64> {
        self.call_mark_iv.or(self.put_mark_iv)
    }
}

/// All strikes quoted for a single expiry, sorted by strike.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiryData {
    pub expiry: DateTime<Utc>,
    /// Years from snapshot build time to expiry (365-day year)
    pub time_to_expiry: f64,
    pub strikes: Vec<StrikeIv>,
}

impl ExpiryData {
    pub fn strike_values(&self) -> Vec<f64> {
        self.strikes.iter().map(|strike| strike.strike).collect()
    }
}

/// Point-in-time volatility surface, expiries sorted ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct IvSnapshot {
    pub underlying_price: f64,
    pub expiries: Vec<ExpiryData>,
    pub built_at: DateTime<Utc>,
}

impl IvSnapshot {
    pub fn new(
        underlying_price: f64,
        mut expiries: Vec<ExpiryData>,
        built_at: DateTime<Utc>,
    ) -> Result<Self, PricingError> {
        if !(underlying_price.is_finite() && underlying_price > 0.0) {
            return Err(PricingError::NoUnderlying);
        }

        expiries.retain(|expiry| !expiry.strikes.is_empty());
        if expiries.is_empty() {
            return Err(PricingError::EmptyExpiries);
        }

        expiries.sort_by_key(|expiry| expiry.expiry);
        for expiry in &mut expiries {
            expiry
                .strikes
                .sort_by(|a, b| a.strike.total_cmp(&b.strike));
        }

        Ok(Self {
            underlying_price,
            expiries,
            built_at,
        })
    }

    /// Build a snapshot from a fetched chain, dropping expiries at or before
    /// `now` and strikes without a mark IV.
    pub fn from_chain(chain: &OptionChain, now: DateTime<Utc>) -> Result<Self, PricingError> {
        let tickers: HashMap<&str, &OptionTicker> = chain
            .tickers
            .iter()
            .map(|ticker| (ticker.name.as_str(), ticker))
            .collect();

        let mut by_expiry: BTreeMap<DateTime<Utc>, Vec<StrikeIv>> = BTreeMap::new();
        let mut underlying: Option<(DateTime<Utc>, f64)> = None;

        for instrument in &chain.instruments {
            if instrument.expiry <= now {
                continue;
            }
            let Some(ticker) = tickers.get(instrument.name.as_str()) else {
                continue;
            };

            // Nearest expiry's underlying approximates spot
            if let Some(price) = ticker.underlying_price.filter(|price| *price > 0.0) {
                if underlying.map_or(true, |(expiry, _)| instrument.expiry < expiry) {
                    underlying = Some((instrument.expiry, price));
                }
            }

            let mark = ticker.mark_iv.map(percent);
            let mid = match (ticker.bid_iv, ticker.ask_iv) {
                (Some(bid), Some(ask)) => Some(percent((bid + ask) / 2.0)),
                _ => mark,
            };

            let strikes = by_expiry.entry(instrument.expiry).or_default();
            let index = match strikes
                .iter()
                .position(|existing| existing.strike == instrument.strike)
            {
                Some(index) => index,
                None => {
                    strikes.push(StrikeIv {
                        strike: instrument.strike,
                        ..StrikeIv::default()
                    });
                    strikes.len() - 1
                }
            };

            let entry = &mut strikes[index];
            match instrument.kind {
                OptionKind::Call => {
                    entry.call_iv = mid;
                    entry.call_mark_iv = mark;
                }
                OptionKind::Put => {
                    entry.put_iv = mid;
                    entry.put_mark_iv = mark;
                }
            }
        }

        let (_, underlying_price) = underlying.ok_or(PricingError::NoUnderlying)?;

        let expiries = by_expiry
            .into_iter()
            .map(|(expiry, mut strikes)| {
                strikes.retain(|strike| strike.mark_iv().is_some());
                ExpiryData {
                    expiry,
                    time_to_expiry: years_between(now, expiry),
                    strikes,
                }
            })
            .collect();

        Self::new(underlying_price, expiries, now)
    }

    pub fn first_expiry(&self) -> Option<&ExpiryData> {
        self.expiries.first()
    }

    pub fn last_expiry(&self) -> Option<&ExpiryData> {
        self.expiries.last()
    }

    /// Every strike across every expiry.
    pub fn all_strikes(&self) -> impl Iterator<Item = f64> + '_ {
        self.expiries
            .iter()
            .flat_map(|expiry| expiry.strikes.iter().map(|strike| strike.strike))
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.built_at
    }
}

fn percent(value: f64) -> f64 {
    value / 100.0
}
