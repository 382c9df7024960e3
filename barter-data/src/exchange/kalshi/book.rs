use super::model::KalshiOrderbookData;
use crate::books::{Level, OutcomeBooks, TopOfBook};
use rust_decimal::Decimal;
use std::{collections::BTreeMap, ops::RangeInclusive};

/// Quotable contract prices in cents.
const VALID_PRICE_CENTS: RangeInclusive<u32> = 1..=99;

/// Kalshi orderbook for a single market, bids only per leg (price_cents -> quantity).
///
/// A YES ask is the complement of the best NO bid and vice versa, since buying YES at
/// `p` is equivalent to selling NO at `100 - p`.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct KalshiOrderBook {
    pub yes: BTreeMap<u32, u32>,
    pub no: BTreeMap<u32, u32>,
}

impl KalshiOrderBook {
    /// Empty and out-of-range levels are dropped.
    pub fn from_data(data: &KalshiOrderbookData) -> Self {
        let collect = |levels: &[(u32, u32)]| {
            levels
                .iter()
                .filter(|(price, amount)| VALID_PRICE_CENTS.contains(price) && *amount > 0)
                .copied()
                .collect::<BTreeMap<_, _>>()
        };

        Self {
            yes: collect(&data.yes),
            no: collect(&data.no),
        }
    }

    /// Best YES bid (highest price with quantity).
    pub fn best_yes_bid(&self) -> Option<Level> {
        self.yes
            .iter()
            .next_back()
            .map(|(&price, &amount)| level(price, amount))
    }

    /// Best YES ask (100 - best NO bid).
    pub fn best_yes_ask(&self) -> Option<Level> {
        self.no
            .iter()
            .next_back()
            .map(|(&no_bid, &amount)| level(100 - no_bid, amount))
    }

    /// Best NO bid (highest NO price with quantity).
    pub fn best_no_bid(&self) -> Option<Level> {
        self.no
            .iter()
            .next_back()
            .map(|(&price, &amount)| level(price, amount))
    }

    /// Best NO ask (100 - best YES bid).
    pub fn best_no_ask(&self) -> Option<Level> {
        self.yes
            .iter()
            .next_back()
            .map(|(&yes_bid, &amount)| level(100 - yes_bid, amount))
    }

    /// Normalise to dollar-priced top-of-book for both legs.
    pub fn to_outcome_books(&self) -> OutcomeBooks {
        OutcomeBooks {
            yes: TopOfBook::new(self.best_yes_bid(), self.best_yes_ask()),
            no: TopOfBook::new(self.best_no_bid(), self.best_no_ask()),
        }
    }
}

/// Convert a cents level to a dollar [`Level`].
fn level(price_cents: u32, amount: u32) -> Level {
    Level::new(Decimal::new(price_cents as i64, 2), Decimal::from(amount))
}
