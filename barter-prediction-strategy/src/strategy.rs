use crate::{context::StrategyContext, signal::StrategySignal};
use async_trait::async_trait;

/// Decision core invoked by the host once per cycle and bot.
///
/// Implementations never return errors: configuration problems, feed
/// failures and blocked trades all resolve to `None` and are reported via
/// tracing (and the optional [`EventSink`](crate::event::EventSink)).
#[async_trait]
pub trait PredictionStrategy: Send + Sync {
    /// Evaluate the bot's context and produce at most one signal.
    async fn generate_signal(&self, ctx: &StrategyContext) -> Option<StrategySignal>;

    /// Discard every piece of per-bot state held for `bot_id`. Idempotent.
    fn remove_bot(&self, bot_id: &str);
}
