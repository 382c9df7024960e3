//! Priority cascade selecting at most one action per cycle.
//!
//! In order: close-out hedge, profit-take on the leading leg, balance the
//! lagging leg, round-robin entry. The first step that yields a decision
//! wins and the chosen leg's cooldown timestamp is recorded.

use super::{
    analysis::PositionAnalysis,
    config::ArbitrageConfig,
    state::ArbitrageState,
    validator::PriceValidator,
};
use crate::event::{EventSink, StrategyEvent};
use barter_data::books::OutcomeBooks;
use barter_instrument::{Outcome, Side};
use chrono::{DateTime, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use tracing::debug;

/// Which cascade step produced a [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DecisionKind {
    #[display("close_out_hedge")]
    CloseOutHedge,
    #[display("profit_take")]
    ProfitTake,
    #[display("balance")]
    Balance,
    #[display("entry")]
    Entry,
}

impl DecisionKind {
    pub fn confidence(&self) -> f64 {
        match self {
            DecisionKind::CloseOutHedge => 0.9,
            DecisionKind::ProfitTake => 0.8,
            DecisionKind::Balance => 0.7,
            DecisionKind::Entry => 0.5,
        }
    }
}

/// Action selected by the [`DecisionEngine`], priced against the book.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub kind: DecisionKind,
    pub leg: Outcome,
    pub action: Side,
    pub quantity: Decimal,
    /// Book price the decision was validated against
    pub price: Decimal,
    /// Cross the spread (buy at the ask) rather than post at the bid
    pub aggressive: bool,
    pub reason: String,
}

/// Cycle-scoped evaluator borrowing the bot's config and shared leg state.
#[derive(Debug)]
pub struct DecisionEngine<'a> {
    config: &'a ArbitrageConfig,
    state: &'a ArbitrageState,
    validator: PriceValidator,
    events: &'a EventSink,
}

struct CycleParams {
    close_out: bool,
    cooldown: chrono::Duration,
    order_size: Decimal,
}

impl<'a> DecisionEngine<'a> {
    pub fn new(config: &'a ArbitrageConfig, state: &'a ArbitrageState, events: &'a EventSink) -> Self {
        Self {
            config,
            state,
            validator: PriceValidator::from_config(config),
            events,
        }
    }

    /// Run the cascade for `bot_id`.
    pub fn decide(
        &self,
        bot_id: &str,
        analysis: &PositionAnalysis,
        market: &OutcomeBooks,
        time_progress: f64,
        scaled_max_position: Decimal,
        now: DateTime<Utc>,
    ) -> Option<Decision> {
        let cycle = match self.config.active_close_out(time_progress) {
            Some(close_out) => CycleParams {
                close_out: true,
                cooldown: close_out.cooldown(),
                order_size: self.config.order_size * close_out.order_multiplier,
            },
            None => CycleParams {
                close_out: false,
                cooldown: self.config.cooldown(),
                order_size: self.config.order_size,
            },
        };

        if !cycle.close_out && self.state.are_both_on_cooldown(bot_id, cycle.cooldown, now) {
            debug!(bot_id, "Both legs on cooldown, skipping cycle");
            self.events.send(StrategyEvent::CooldownSkip {
                bot_id: bot_id.into(),
            });
            return None;
        }

        let hedge = if cycle.close_out {
            self.close_out_hedge(bot_id, analysis, market, cycle.order_size)
        } else {
            None
        };

        let decision = hedge
            .or_else(|| self.profit_take(bot_id, analysis, market, &cycle, now))
            .or_else(|| self.balance(bot_id, analysis, market, &cycle, now))
            .or_else(|| self.entry(bot_id, analysis, market, &cycle, scaled_max_position, now))?;

        self.state.record_order(bot_id, decision.leg, now);
        Some(decision)
    }

    /// Forced hedge of the lagging leg at the ask, ignoring cooldowns and the
    /// pair cost check.
    fn close_out_hedge(
        &self,
        bot_id: &str,
        analysis: &PositionAnalysis,
        market: &OutcomeBooks,
        max_size: Decimal,
    ) -> Option<Decision> {
        if analysis.size_diff <= Decimal::ZERO {
            return None;
        }

        let leg = analysis.lagging_leg;
        let ask = market.book(leg).ask_price()?;
        if !self
            .validator
            .is_leg_price_acceptable(leg, ask, analysis.avg(leg.inverse()))
        {
            self.blocked(bot_id, leg, format!("Close-out hedge at {ask} above leg ceiling"));
            return None;
        }

        let quantity = analysis.size_diff.min(max_size);
        Some(Decision {
            kind: DecisionKind::CloseOutHedge,
            leg,
            action: Side::Buy,
            quantity,
            price: ask,
            aggressive: true,
            reason: format!(
                "Close-out hedge: buy {quantity} {leg} to cover imbalance of {}",
                analysis.size_diff
            ),
        })
    }

    /// Sell part of the leading leg when its bid is rich and above entry.
    fn profit_take(
        &self,
        bot_id: &str,
        analysis: &PositionAnalysis,
        market: &OutcomeBooks,
        cycle: &CycleParams,
        now: DateTime<Utc>,
    ) -> Option<Decision> {
        if analysis.size_diff < self.config.min_imbalance_for_sell {
            return None;
        }

        let leg = analysis.leading_leg();
        let entry = analysis.filled_avg(leg);
        let bid = market.book(leg).bid_price()?;
        if bid < entry || bid < self.config.sell_threshold {
            return None;
        }

        let quantity = analysis
            .size_diff
            .min(analysis.filled_size(leg))
            .min(cycle.order_size);
        if quantity <= Decimal::ZERO {
            return None;
        }

        if self.state.is_on_cooldown(bot_id, leg, cycle.cooldown, now) {
            debug!(bot_id, %leg, "Profit-take leg on cooldown");
            return None;
        }

        Some(Decision {
            kind: DecisionKind::ProfitTake,
            leg,
            action: Side::Sell,
            quantity,
            price: bid,
            aggressive: true,
            reason: format!("Profit take: sell {quantity} {leg} at {bid} (entry {entry})"),
        })
    }

    /// Buy the lagging leg, crossing the spread when the imbalance is large.
    /// In close-out the leg cooldown is ignored while the legs differ.
    fn balance(
        &self,
        bot_id: &str,
        analysis: &PositionAnalysis,
        market: &OutcomeBooks,
        cycle: &CycleParams,
        now: DateTime<Utc>,
    ) -> Option<Decision> {
        if analysis.total_size <= Decimal::ZERO {
            return None;
        }

        // Close-out only lifts the cooldown for a real gap; on a level pair the
        // lagging leg is YES by tie-break.
        let leg = analysis.lagging_leg;
        let hedging = cycle.close_out && analysis.size_diff > Decimal::ZERO;
        if !hedging && self.state.is_on_cooldown(bot_id, leg, cycle.cooldown, now) {
            debug!(bot_id, %leg, "Lagging leg on cooldown");
            return None;
        }

        let aggressive = analysis.is_large_imbalance;
        let book = market.book(leg);
        let price = if aggressive {
            book.ask_price()?
        } else {
            book.bid_price()?
        };

        if !self.passes_price_checks(bot_id, analysis, leg, cycle.order_size, price) {
            return None;
        }

        Some(Decision {
            kind: DecisionKind::Balance,
            leg,
            action: Side::Buy,
            quantity: cycle.order_size,
            price,
            aggressive,
            reason: format!(
                "Balance: buy {} {leg} at {price} (imbalance {:.2})",
                cycle.order_size, analysis.imbalance
            ),
        })
    }

    /// Passive entry, starting with the leg opposite to the last one bought.
    fn entry(
        &self,
        bot_id: &str,
        analysis: &PositionAnalysis,
        market: &OutcomeBooks,
        cycle: &CycleParams,
        scaled_max_position: Decimal,
        now: DateTime<Utc>,
    ) -> Option<Decision> {
        let first = self.state.next_leg_round_robin(bot_id);

        [first, first.inverse()].into_iter().find_map(|leg| {
            if self.state.is_on_cooldown(bot_id, leg, cycle.cooldown, now) {
                return None;
            }
            if !self.passes_position_limit(analysis, leg, cycle.order_size, scaled_max_position) {
                debug!(bot_id, %leg, %scaled_max_position, "Entry would breach position limit");
                return None;
            }

            let price = market.book(leg).bid_price()?;
            if !self.passes_price_checks(bot_id, analysis, leg, cycle.order_size, price) {
                return None;
            }

            Some(Decision {
                kind: DecisionKind::Entry,
                leg,
                action: Side::Buy,
                quantity: cycle.order_size,
                price,
                aggressive: false,
                reason: format!("Entry: buy {} {leg} at {price}", cycle.order_size),
            })
        })
    }

    /// Buying the lagging leg always narrows the gap. Buying the leading leg
    /// must keep both the effective and filled gaps within the limit.
    fn passes_position_limit(
        &self,
        analysis: &PositionAnalysis,
        leg: Outcome,
        size: Decimal,
        scaled_max_position: Decimal,
    ) -> bool {
        if leg == analysis.lagging_leg {
            return true;
        }

        analysis.diff_after_buy(leg, size) <= scaled_max_position
            && analysis.filled_diff_after_buy(leg, size) <= scaled_max_position
    }

    fn passes_price_checks(
        &self,
        bot_id: &str,
        analysis: &PositionAnalysis,
        leg: Outcome,
        size: Decimal,
        price: Decimal,
    ) -> bool {
        let other_avg = analysis.avg(leg.inverse());
        if !self.validator.is_leg_price_acceptable(leg, price, other_avg) {
            self.blocked(
                bot_id,
                leg,
                format!(
                    "Price {price} above ceiling {}",
                    self.validator.leg_price_ceiling(other_avg)
                ),
            );
            return false;
        }

        if !self.validator.would_cost_be_valid(analysis, leg, size, price) {
            self.blocked(
                bot_id,
                leg,
                format!(
                    "Pair cost would reach threshold {}",
                    self.validator.profit_threshold
                ),
            );
            return false;
        }

        true
    }

    fn blocked(&self, bot_id: &str, leg: Outcome, reason: String) {
        debug!(bot_id, %leg, %reason, "Trade blocked");
        self.events.send(StrategyEvent::TradeBlocked {
            bot_id: bot_id.into(),
            leg,
            reason,
        });
    }
}
