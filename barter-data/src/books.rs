use barter_instrument::Outcome;
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Single price level: price in dollars (0-1) and resting quantity in contracts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize, Serialize, Constructor)]
pub struct Level {
    pub price: Decimal,
    pub amount: Decimal,
}

/// Best bid and best ask for one outcome leg.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize, Serialize, Constructor)]
pub struct TopOfBook {
    pub best_bid: Option<Level>,
    pub best_ask: Option<Level>,
}

impl TopOfBook {
    pub fn bid_price(&self) -> Option<Decimal> {
        self.best_bid.map(|level| level.price)
    }

    pub fn ask_price(&self) -> Option<Decimal> {
        self.best_ask.map(|level| level.price)
    }

    /// Quantity resting at the best bid, zero if there is no bid.
    pub fn bid_depth(&self) -> Decimal {
        self.best_bid.map(|level| level.amount).unwrap_or(Decimal::ZERO)
    }

    /// Quantity resting at the best ask, zero if there is no ask.
    pub fn ask_depth(&self) -> Decimal {
        self.best_ask.map(|level| level.amount).unwrap_or(Decimal::ZERO)
    }

    /// Mid price, only when both sides are present.
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.bid_price(), self.ask_price()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::TWO),
            _ => None,
        }
    }
}

/// Top-of-book for both legs of a binary market.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize, Serialize, Constructor)]
pub struct OutcomeBooks {
    pub yes: TopOfBook,
    pub no: TopOfBook,
}

impl OutcomeBooks {
    /// Get the book for the provided leg.
    pub fn book(&self, outcome: Outcome) -> &TopOfBook {
        match outcome {
            Outcome::Yes => &self.yes,
            Outcome::No => &self.no,
        }
    }
}
