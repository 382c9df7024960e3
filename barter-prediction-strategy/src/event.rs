//! Diagnostic events published alongside the tracing output.

use crate::{context::BotId, signal::StrategySignal};
use barter_instrument::Outcome;
use smol_str::SmolStr;
use tokio::sync::mpsc;

/// Notable decision-cycle outcomes a host may want to record or display.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyEvent {
    SignalEmitted {
        bot_id: BotId,
        signal: StrategySignal,
    },
    TradeBlocked {
        bot_id: BotId,
        leg: Outcome,
        reason: String,
    },
    CooldownSkip {
        bot_id: BotId,
    },
    RiskRejected {
        bot_id: BotId,
        market_id: SmolStr,
        reason: String,
    },
    FeedFallback {
        bot_id: BotId,
        feed: &'static str,
        error: String,
    },
    CycleSkipped {
        bot_id: BotId,
        reason: String,
    },
}

/// Optional outbound channel for [`StrategyEvent`]s.
///
/// Sending never blocks and a dropped receiver is ignored.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<StrategyEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<StrategyEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Sink paired with the receiver that observes it.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StrategyEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn send(&self, event: StrategyEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
