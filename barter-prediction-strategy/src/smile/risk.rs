//! Notional caps for smile-arb trading.
//!
//! Validates trades against per-strike and per-expiry notional limits before
//! a signal is emitted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Reason a trade was refused by [`PortfolioRiskManager`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RiskRefusal {
    #[error("Would exceed per-strike cap: strike={strike} notional={projected} > max={cap}")]
    StrikeCap {
        strike: Decimal,
        projected: Decimal,
        cap: Decimal,
    },

    #[error("Would exceed per-expiry cap: notional={projected} > max={cap}")]
    ExpiryCap { projected: Decimal, cap: Decimal },
}

/// Tracks notional traded per strike for a single expiry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct PortfolioRiskManager {
    /// Maximum notional (contracts x price) per strike
    pub max_notional_per_strike: Decimal,
    /// Maximum notional across all strikes of the expiry
    pub max_notional_per_expiry: Decimal,
    notional_by_strike: HashMap<Decimal, Decimal>,
}

impl PortfolioRiskManager {
    pub fn new(max_notional_per_strike: Decimal, max_notional_per_expiry: Decimal) -> Self {
        Self {
            max_notional_per_strike,
            max_notional_per_expiry,
            notional_by_strike: HashMap::new(),
        }
    }

    /// Update caps while keeping recorded notional.
    pub fn set_limits(&mut self, max_notional_per_strike: Decimal, max_notional_per_expiry: Decimal) {
        self.max_notional_per_strike = max_notional_per_strike;
        self.max_notional_per_expiry = max_notional_per_expiry;
    }

    /// Check whether adding `size` contracts at `price` on `strike` stays
    /// within both caps. Reaching a cap exactly is allowed.
    pub fn check(&self, strike: Decimal, size: Decimal, price: Decimal) -> Result<(), RiskRefusal> {
        let notional = size * price;

        let projected_strike = self.strike_notional(strike) + notional;
        if projected_strike > self.max_notional_per_strike {
            return Err(RiskRefusal::StrikeCap {
                strike,
                projected: projected_strike,
                cap: self.max_notional_per_strike,
            });
        }

        let projected_total = self.total_notional() + notional;
        if projected_total > self.max_notional_per_expiry {
            return Err(RiskRefusal::ExpiryCap {
                projected: projected_total,
                cap: self.max_notional_per_expiry,
            });
        }

        Ok(())
    }

    pub fn can_trade(&self, strike: Decimal, size: Decimal, price: Decimal) -> bool {
        self.check(strike, size, price).is_ok()
    }

    pub fn record_fill(&mut self, strike: Decimal, size: Decimal, price: Decimal) {
        *self.notional_by_strike.entry(strike).or_default() += size * price;
    }

    pub fn strike_notional(&self, strike: Decimal) -> Decimal {
        self.notional_by_strike
            .get(&strike)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn total_notional(&self) -> Decimal {
        self.notional_by_strike.values().copied().sum()
    }

    pub fn reset(&mut self) {
        self.notional_by_strike.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_per_strike_cap() {
        let mut risk = PortfolioRiskManager::new(dec!(100), dec!(500));
        risk.record_fill(dec!(100000), dec!(150), dec!(0.60));

        // 90 + 10 == 100 is allowed
        assert!(risk.can_trade(dec!(100000), dec!(20), dec!(0.50)));
        assert_eq!(
            risk.check(dec!(100000), dec!(30), dec!(0.50)),
            Err(RiskRefusal::StrikeCap {
                strike: dec!(100000),
                projected: dec!(105),
                cap: dec!(100),
            })
        );
        // Other strikes are unaffected
        assert!(risk.can_trade(dec!(105000), dec!(30), dec!(0.50)));
    }

    #[test]
    fn test_per_expiry_cap_spans_strikes() {
        let mut risk = PortfolioRiskManager::new(dec!(100), dec!(150));
        risk.record_fill(dec!(95000), dec!(100), dec!(0.80));
        risk.record_fill(dec!(100000), dec!(100), dec!(0.60));

        assert_eq!(risk.total_notional(), dec!(140));
        assert!(matches!(
            risk.check(dec!(105000), dec!(40), dec!(0.50)),
            Err(RiskRefusal::ExpiryCap { .. })
        ));
        assert!(risk.can_trade(dec!(105000), dec!(20), dec!(0.50)));
    }

    #[test]
    fn test_strike_keys_ignore_scale() {
        let mut risk = PortfolioRiskManager::new(dec!(100), dec!(500));
        risk.record_fill(dec!(100000), dec!(10), dec!(0.5));
        risk.record_fill(dec!(100000.00), dec!(10), dec!(0.5));

        assert_eq!(risk.strike_notional(dec!(100000.0)), dec!(10));
    }

    #[test]
    fn test_reset_and_set_limits() {
        let mut risk = PortfolioRiskManager::new(dec!(100), dec!(500));
        risk.record_fill(dec!(100000), dec!(100), dec!(0.5));
        risk.set_limits(dec!(60), dec!(500));

        assert_eq!(risk.strike_notional(dec!(100000)), dec!(50));
        assert!(!risk.can_trade(dec!(100000), dec!(30), dec!(0.5)));

        risk.reset();
        assert_eq!(risk.total_notional(), dec!(0));
        assert!(risk.can_trade(dec!(100000), dec!(30), dec!(0.5)));
    }
}
