//! Decision core for binary YES/NO prediction market bots.
//!
//! This crate turns a per-cycle [`StrategyContext`] (bot parameters, leg
//! positions, pending orders and top-of-book) into at most one
//! [`StrategySignal`]. Two strategies are provided, both implementing
//! [`PredictionStrategy`]:
//!
//! - [`LegBalanceStrategy`]: accumulates YES and NO so the combined average
//!   cost stays below a profit threshold, keeping the legs near equal size.
//! - [`SmileArbStrategy`]: prices "above strike K at settlement" markets as
//!   digital options off an options venue's implied volatility smile and
//!   trades the most mispriced leg.
//!
//! # Key Components
//!
//! - [`balance::DecisionEngine`]: close-out hedge, profit-take, balance and
//!   entry, evaluated in priority order
//! - [`balance::PriceValidator`]: combined-cost and single-leg price ceilings
//! - [`smile::pricing`]: normal CDF, total-variance IV interpolation, digital
//!   pricing and implied volatility
//! - [`smile::settlement`]: settlement dates at noon Eastern Time
//! - [`smile::risk::PortfolioRiskManager`]: per-strike and per-expiry notional caps
//! - [`SignalFactory`]: tick-rounded buy and sell signals
//!
//! # Example
//!
//! ```rust,ignore
//! use barter_prediction_strategy::{LegBalanceStrategy, PredictionStrategy, StrategyContext};
//! use barter_data::books::{Level, OutcomeBooks, TopOfBook};
//! use rust_decimal_macros::dec;
//! use serde_json::json;
//!
//! let params = json!({ "orderSize": "10", "profitThreshold": "0.98" });
//! let market = OutcomeBooks::new(
//!     TopOfBook::new(Some(Level::new(dec!(0.45), dec!(100))), Some(Level::new(dec!(0.46), dec!(100)))),
//!     TopOfBook::new(Some(Level::new(dec!(0.50), dec!(100))), Some(Level::new(dec!(0.51), dec!(100)))),
//! );
//! let ctx = StrategyContext::new("bot-1", params.as_object().cloned().unwrap(), market, dec!(0.01));
//!
//! let strategy = LegBalanceStrategy::new();
//! let signal = strategy.generate_signal(&ctx).await;
//! ```
//!
//! # Signal Format
//!
//! Prices and quantities are decimal strings, prices rounded to the market
//! tick:
//!
//! ```text
//! { "action": "BUY", "side": "YES", "price": "0.46", "quantity": "10", "reason": "...", "confidence": 0.5 }
//! ```

pub mod balance;
pub mod config;
pub mod context;
pub mod event;
pub mod signal;
pub mod smile;
pub mod strategy;

// Re-exports for convenience
pub use balance::{ArbitrageConfig, ArbitrageState, LegBalanceStrategy};
pub use config::{ConfigError, ParamReader};
pub use context::{BotId, LegPosition, Params, PendingOrders, StrategyContext};
pub use event::{EventSink, StrategyEvent};
pub use signal::{round_to_tick, SignalFactory, StrategySignal};
pub use smile::{config::SmileArbConfig, SmileArbStrategy};
pub use strategy::PredictionStrategy;
