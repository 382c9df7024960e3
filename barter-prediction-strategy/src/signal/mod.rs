use barter_instrument::{Outcome, Side};
use serde::{Deserialize, Serialize};

/// Tick rounding and construction of buy/sell [`StrategySignal`]s.
pub mod factory;

pub use factory::{round_price_to_tick, round_to_tick, SignalFactory};

/// Trading intent returned to the host runtime.
///
/// Prices and quantities are decimal strings so the host can forward them to
/// an exchange without re-rounding.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StrategySignal {
    pub action: Side,
    pub side: Outcome,
    pub price: String,
    pub quantity: String,
    pub reason: String,
    pub confidence: f64,
}
