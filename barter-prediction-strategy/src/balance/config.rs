//! Configuration types for the leg-balancing arbitrage strategy.

use crate::{
    config::{ConfigError, ParamReader},
    context::Params,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configuration for the leg-balancing arbitrage strategy.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArbitrageConfig {
    /// Contracts per order
    pub order_size: Decimal,
    /// Maximum contracts the leading leg may run ahead of the lagging leg
    pub max_position_per_leg: Decimal,
    /// Multiplier applied to `max_position_per_leg`
    pub position_scale: Decimal,
    /// Combined YES + NO average cost ceiling (e.g., 0.98)
    pub profit_threshold: Decimal,
    /// Price ceiling for a leg while the other leg is still empty
    pub max_single_leg_price: Decimal,
    /// Relative imbalance above which the lagging leg is bought aggressively
    pub imbalance_threshold: Decimal,
    /// Minimum time between orders on the same leg
    pub cooldown_ms: u64,
    /// Minimum bid for taking profit on the leading leg
    pub sell_threshold: Decimal,
    /// Minimum contract imbalance before taking profit
    pub min_imbalance_for_sell: Decimal,
    /// Near-expiry behaviour, `None` disables close-out entirely
    pub close_out: Option<CloseOutConfig>,
}

/// Near-expiry hedging parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CloseOutConfig {
    /// Time progress in `[0, 1]` from which close-out mode is active
    pub threshold: f64,
    /// Cooldown used instead of `cooldown_ms` while closing out
    pub cooldown_ms: u64,
    /// Multiplier applied to `order_size` while closing out
    pub order_multiplier: Decimal,
}

impl Default for CloseOutConfig {
    fn default() -> Self {
        Self {
            threshold: 0.9,
            cooldown_ms: 1_000,
            order_multiplier: Decimal::new(3, 0),
        }
    }
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            order_size: Decimal::new(10, 0),
            max_position_per_leg: Decimal::new(500, 0),
            position_scale: Decimal::ONE,
            profit_threshold: Decimal::new(98, 2), // $0.98
            max_single_leg_price: Decimal::new(65, 2), // $0.65
            imbalance_threshold: Decimal::new(2, 1), // 20%
            cooldown_ms: 5_000,
            sell_threshold: Decimal::new(75, 2), // $0.75
            min_imbalance_for_sell: Decimal::new(20, 0),
            close_out: Some(CloseOutConfig::default()),
        }
    }
}

impl ArbitrageConfig {
    /// Parse the host parameter map, applying defaults for omitted keys.
    pub fn from_params(params: &Params) -> Result<Self, ConfigError> {
        let reader = ParamReader::new(params);
        let defaults = Self::default();
        let close_out_defaults = CloseOutConfig::default();

        let close_out = if reader.bool("closeOutEnabled", true)? {
            Some(CloseOutConfig {
                threshold: reader.f64("closeOutThreshold", close_out_defaults.threshold)?,
                cooldown_ms: reader.u64("closeOutCooldownMs", close_out_defaults.cooldown_ms)?,
                order_multiplier: reader.decimal(
                    "closeOutOrderMultiplier",
                    close_out_defaults.order_multiplier,
                )?,
            })
        } else {
            None
        };

        Ok(Self {
            order_size: reader.decimal("orderSize", defaults.order_size)?,
            max_position_per_leg: reader.decimal("maxPositionPerLeg", defaults.max_position_per_leg)?,
            position_scale: reader.decimal("positionScale", defaults.position_scale)?,
            profit_threshold: reader.decimal("profitThreshold", defaults.profit_threshold)?,
            max_single_leg_price: reader.decimal("maxSingleLegPrice", defaults.max_single_leg_price)?,
            imbalance_threshold: reader.decimal("imbalanceThreshold", defaults.imbalance_threshold)?,
            cooldown_ms: reader.u64("cooldownMs", defaults.cooldown_ms)?,
            sell_threshold: reader.decimal("sellThreshold", defaults.sell_threshold)?,
            min_imbalance_for_sell: reader.decimal("minImbalanceForSell", defaults.min_imbalance_for_sell)?,
            close_out,
        })
    }

    /// Position limit after scaling.
    pub fn scaled_max_position(&self) -> Decimal {
        self.max_position_per_leg * self.position_scale
    }

    pub fn cooldown(&self) -> chrono::Duration {
        duration_ms(self.cooldown_ms)
    }

    /// Close-out parameters if close-out is enabled and `time_progress` has
    /// reached its threshold.
    pub fn active_close_out(&self, time_progress: f64) -> Option<&CloseOutConfig> {
        self.close_out
            .as_ref()
            .filter(|close_out| time_progress >= close_out.threshold)
    }
}

impl CloseOutConfig {
    pub fn cooldown(&self) -> chrono::Duration {
        duration_ms(self.cooldown_ms)
    }
}

fn duration_ms(ms: u64) -> chrono::Duration {
    chrono::Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
}
