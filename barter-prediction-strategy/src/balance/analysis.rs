//! Snapshot of both legs' filled and effective (filled + pending) exposure.

use super::validator::projected_average;
use crate::context::StrategyContext;
use barter_instrument::Outcome;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Derived view of the YES/NO position pair used by the decision engine.
///
/// "Effective" sizes and averages include pending buy orders. Filled values
/// only count executed contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PositionAnalysis {
    pub yes_filled_size: Decimal,
    pub yes_filled_avg: Decimal,
    pub no_filled_size: Decimal,
    pub no_filled_avg: Decimal,
    pub yes_size: Decimal,
    pub yes_avg: Decimal,
    pub no_size: Decimal,
    pub no_avg: Decimal,
    pub total_size: Decimal,
    /// Absolute effective size difference between the legs
    pub size_diff: Decimal,
    /// Absolute filled size difference between the legs
    pub filled_diff: Decimal,
    /// `size_diff / max(yes_size, no_size, 1)`
    pub imbalance: Decimal,
    pub is_large_imbalance: bool,
    /// Leg with the smaller effective size (YES on a tie)
    pub lagging_leg: Outcome,
    pub yes_is_lagging: bool,
    pub new_diff_if_buy_yes: Decimal,
    pub new_diff_if_buy_no: Decimal,
}

impl PositionAnalysis {
    /// Effective size of `leg`.
    pub fn size(&self, leg: Outcome) -> Decimal {
        match leg {
            Outcome::Yes => self.yes_size,
            Outcome::No => self.no_size,
        }
    }

    /// Effective average price of `leg`.
    pub fn avg(&self, leg: Outcome) -> Decimal {
        match leg {
            Outcome::Yes => self.yes_avg,
            Outcome::No => self.no_avg,
        }
    }

    pub fn filled_size(&self, leg: Outcome) -> Decimal {
        match leg {
            Outcome::Yes => self.yes_filled_size,
            Outcome::No => self.no_filled_size,
        }
    }

    pub fn filled_avg(&self, leg: Outcome) -> Decimal {
        match leg {
            Outcome::Yes => self.yes_filled_avg,
            Outcome::No => self.no_filled_avg,
        }
    }

    pub fn leading_leg(&self) -> Outcome {
        self.lagging_leg.inverse()
    }

    /// Effective size difference after buying `size` more of `leg`.
    pub fn diff_after_buy(&self, leg: Outcome, size: Decimal) -> Decimal {
        match leg {
            Outcome::Yes => (self.yes_size + size - self.no_size).abs(),
            Outcome::No => (self.yes_size - (self.no_size + size)).abs(),
        }
    }

    /// Filled size difference if `size` more of `leg` were filled.
    pub fn filled_diff_after_buy(&self, leg: Outcome, size: Decimal) -> Decimal {
        match leg {
            Outcome::Yes => (self.yes_filled_size + size - self.no_filled_size).abs(),
            Outcome::No => (self.yes_filled_size - (self.no_filled_size + size)).abs(),
        }
    }
}

/// Build the [`PositionAnalysis`] for the context's positions and pending
/// orders.
pub fn analyze(ctx: &StrategyContext, imbalance_threshold: Decimal, order_size: Decimal) -> PositionAnalysis {
    let yes_filled = ctx.position(Outcome::Yes);
    let no_filled = ctx.position(Outcome::No);
    let yes_pending = ctx.pending(Outcome::Yes);
    let no_pending = ctx.pending(Outcome::No);

    let yes_size = yes_filled.size + yes_pending.quantity;
    let no_size = no_filled.size + no_pending.quantity;
    let yes_avg = projected_average(
        yes_filled.size,
        yes_filled.avg_price,
        yes_pending.quantity,
        yes_pending.avg_price,
    );
    let no_avg = projected_average(
        no_filled.size,
        no_filled.avg_price,
        no_pending.quantity,
        no_pending.avg_price,
    );

    let size_diff = (yes_size - no_size).abs();
    let imbalance = size_diff / yes_size.max(no_size).max(Decimal::ONE);
    let lagging_leg = if yes_size <= no_size {
        Outcome::Yes
    } else {
        Outcome::No
    };

    PositionAnalysis {
        yes_filled_size: yes_filled.size,
        yes_filled_avg: yes_filled.avg_price,
        no_filled_size: no_filled.size,
        no_filled_avg: no_filled.avg_price,
        yes_size,
        yes_avg,
        no_size,
        no_avg,
        total_size: yes_size + no_size,
        size_diff,
        filled_diff: (yes_filled.size - no_filled.size).abs(),
        imbalance,
        is_large_imbalance: imbalance > imbalance_threshold,
        lagging_leg,
        yes_is_lagging: lagging_leg.is_yes(),
        new_diff_if_buy_yes: (yes_size + order_size - no_size).abs(),
        new_diff_if_buy_no: (yes_size - (no_size + order_size)).abs(),
    }
}
