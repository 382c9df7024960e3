//! Leg-balancing YES/NO arbitrage.
//!
//! Accumulates both legs of a binary market so the combined average cost
//! stays below the profit threshold, keeping the legs near equal size.

use crate::{
    context::StrategyContext,
    event::{EventSink, StrategyEvent},
    signal::{SignalFactory, StrategySignal},
    strategy::PredictionStrategy,
};
use async_trait::async_trait;
use barter_instrument::Side;
use std::sync::Arc;
use tracing::{info, warn};

/// Position snapshot for a YES/NO pair.
pub mod analysis;

/// [`ArbitrageConfig`] and close-out parameters.
pub mod config;

/// Priority cascade choosing the cycle's action.
pub mod decision;

/// Per-bot cooldown and round-robin state.
pub mod state;

/// Pair cost ceilings.
pub mod validator;

pub use analysis::{analyze, PositionAnalysis};
pub use config::{ArbitrageConfig, CloseOutConfig};
pub use decision::{Decision, DecisionEngine, DecisionKind};
pub use state::{ArbitrageState, LegCooldowns};
pub use validator::{projected_average, PriceValidator};

/// Executor wiring config parsing, analysis, the decision cascade and signal
/// construction together.
#[derive(Debug, Clone, Default)]
pub struct LegBalanceStrategy {
    state: Arc<ArbitrageState>,
    events: EventSink,
}

impl LegBalanceStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: EventSink) -> Self {
        Self {
            state: Arc::default(),
            events,
        }
    }

    pub fn state(&self) -> &ArbitrageState {
        &self.state
    }

    /// Run one decision cycle for the context's bot.
    pub fn evaluate(&self, ctx: &StrategyContext) -> Option<StrategySignal> {
        let config = match ArbitrageConfig::from_params(&ctx.params) {
            Ok(config) => config,
            Err(error) => {
                warn!(bot_id = %ctx.bot_id, %error, "Invalid arbitrage config, skipping cycle");
                self.events.send(StrategyEvent::CycleSkipped {
                    bot_id: ctx.bot_id.clone(),
                    reason: error.to_string(),
                });
                return None;
            }
        };

        let analysis = analyze(ctx, config.imbalance_threshold, config.order_size);
        let engine = DecisionEngine::new(&config, &self.state, &self.events);
        let decision = engine.decide(
            &ctx.bot_id,
            &analysis,
            &ctx.market,
            ctx.time_progress,
            config.scaled_max_position(),
            ctx.now,
        )?;

        let factory = SignalFactory::new(ctx.tick_size);
        let book = ctx.market.book(decision.leg);
        let confidence = decision.kind.confidence();
        let signal = match decision.action {
            Side::Buy => factory.create_buy_signal(
                decision.leg,
                decision.quantity,
                book,
                decision.aggressive,
                decision.reason,
                confidence,
            ),
            Side::Sell => factory.create_sell_signal(
                decision.leg,
                decision.quantity,
                book,
                analysis.filled_avg(decision.leg),
                decision.reason,
                confidence,
            ),
        }?;

        info!(
            bot_id = %ctx.bot_id,
            kind = %decision.kind,
            action = %signal.action,
            side = %signal.side,
            price = %signal.price,
            quantity = %signal.quantity,
            yes_size = %analysis.yes_size,
            no_size = %analysis.no_size,
            "Leg balance signal"
        );
        self.events.send(StrategyEvent::SignalEmitted {
            bot_id: ctx.bot_id.clone(),
            signal: signal.clone(),
        });

        Some(signal)
    }
}

#[async_trait]
impl PredictionStrategy for LegBalanceStrategy {
    async fn generate_signal(&self, ctx: &StrategyContext) -> Option<StrategySignal> {
        self.evaluate(ctx)
    }

    fn remove_bot(&self, bot_id: &str) {
        self.state.cleanup(bot_id);
    }
}
