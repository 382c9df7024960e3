//! Per-cycle input handed to a strategy by the host runtime.

use barter_data::books::OutcomeBooks;
use barter_instrument::Outcome;
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;

/// Identifier of a bot instance. Strategy state is keyed by it.
pub type BotId = SmolStr;

/// Raw configuration map as supplied by the host (numbers may arrive as strings).
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Filled position on one leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct LegPosition {
    pub size: Decimal,
    pub avg_price: Decimal,
    pub realized_pnl: Decimal,
}

impl LegPosition {
    pub fn new(size: Decimal, avg_price: Decimal) -> Self {
        Self {
            size,
            avg_price,
            realized_pnl: Decimal::ZERO,
        }
    }
}

/// Resting, not yet filled, buy orders on one leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, Constructor)]
pub struct PendingOrders {
    pub quantity: Decimal,
    pub avg_price: Decimal,
}

/// Everything a strategy sees during one decision cycle.
///
/// A leg missing from `positions` or `pending` is treated as size zero at
/// average price zero. `now` is supplied by the host so that cooldowns and
/// settlement cutoffs are deterministic under replay.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyContext {
    pub bot_id: BotId,
    pub params: Params,
    pub positions: HashMap<Outcome, LegPosition>,
    pub pending: HashMap<Outcome, PendingOrders>,
    pub market: OutcomeBooks,
    pub tick_size: Decimal,
    /// Fraction of the market's lifetime already elapsed, in `[0, 1]`.
    pub time_progress: f64,
    pub now: DateTime<Utc>,
}

impl StrategyContext {
    pub fn new<Id>(bot_id: Id, params: Params, market: OutcomeBooks, tick_size: Decimal) -> Self
    where
        Id: Into<BotId>,
    {
        Self {
            bot_id: bot_id.into(),
            params,
            positions: HashMap::new(),
            pending: HashMap::new(),
            market,
            tick_size,
            time_progress: 0.0,
            now: Utc::now(),
        }
    }

    pub fn with_position(mut self, leg: Outcome, position: LegPosition) -> Self {
        self.positions.insert(leg, position);
        self
    }

    pub fn with_pending(mut self, leg: Outcome, pending: PendingOrders) -> Self {
        self.pending.insert(leg, pending);
        self
    }

    pub fn with_time_progress(mut self, time_progress: f64) -> Self {
        self.time_progress = time_progress;
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Filled position for `leg`, zeroed when the host reported none.
    pub fn position(&self, leg: Outcome) -> LegPosition {
        self.positions.get(&leg).copied().unwrap_or_default()
    }

    /// Pending buy orders for `leg`, zeroed when the host reported none.
    pub fn pending(&self, leg: Outcome) -> PendingOrders {
        self.pending.get(&leg).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_missing_leg_defaults_to_zero() {
        let ctx = StrategyContext::new("bot", Params::new(), OutcomeBooks::default(), dec!(0.01))
            .with_position(Outcome::Yes, LegPosition::new(dec!(10), dec!(0.45)));

        assert_eq!(ctx.position(Outcome::Yes).size, dec!(10));
        assert_eq!(ctx.position(Outcome::No), LegPosition::default());
        assert_eq!(ctx.pending(Outcome::No), PendingOrders::default());
    }
}
