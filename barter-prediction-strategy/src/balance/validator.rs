//! Price ceilings that keep the combined YES + NO cost below the profit
//! threshold.

use super::{analysis::PositionAnalysis, config::ArbitrageConfig};
use barter_instrument::Outcome;
use rust_decimal::Decimal;
use tracing::debug;

/// Buffer kept between a leg's ceiling and the profit threshold ($0.01).
fn ceiling_buffer() -> Decimal {
    Decimal::new(1, 2)
}

/// Weighted average price after adding `add_size` at `add_price` to an
/// existing position.
pub fn projected_average(
    current_size: Decimal,
    current_avg: Decimal,
    add_size: Decimal,
    add_price: Decimal,
) -> Decimal {
    let total = current_size + add_size;
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if current_size <= Decimal::ZERO {
        return add_price;
    }
    if add_size <= Decimal::ZERO {
        return current_avg;
    }

    (current_size * current_avg + add_size * add_price) / total
}

/// Validates candidate leg prices against the pair cost ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceValidator {
    pub profit_threshold: Decimal,
    pub max_single_leg_price: Decimal,
}

impl PriceValidator {
    pub fn new(profit_threshold: Decimal, max_single_leg_price: Decimal) -> Self {
        Self {
            profit_threshold,
            max_single_leg_price,
        }
    }

    pub fn from_config(config: &ArbitrageConfig) -> Self {
        Self::new(config.profit_threshold, config.max_single_leg_price)
    }

    /// Whether buying `add_size` of `leg` at `add_price` keeps the projected
    /// combined average strictly below the profit threshold.
    ///
    /// A pair whose current combined average is already at or above the
    /// threshold accepts no further buys on either leg.
    pub fn would_cost_be_valid(
        &self,
        analysis: &PositionAnalysis,
        leg: Outcome,
        add_size: Decimal,
        add_price: Decimal,
    ) -> bool {
        let current_combined = analysis.yes_avg + analysis.no_avg;
        if analysis.yes_size > Decimal::ZERO
            && analysis.no_size > Decimal::ZERO
            && current_combined >= self.profit_threshold
        {
            debug!(
                %leg,
                %current_combined,
                threshold = %self.profit_threshold,
                "Pair cost already at threshold"
            );
            return false;
        }

        let projected = projected_average(analysis.size(leg), analysis.avg(leg), add_size, add_price);
        let projected_combined = projected + analysis.avg(leg.inverse());

        let valid = projected_combined < self.profit_threshold;
        if !valid {
            debug!(
                %leg,
                %add_price,
                %projected_combined,
                threshold = %self.profit_threshold,
                "Projected pair cost exceeds threshold"
            );
        }
        valid
    }

    /// Highest acceptable price for a leg given the other leg's average.
    pub fn leg_price_ceiling(&self, other_leg_average: Decimal) -> Decimal {
        if other_leg_average.is_zero() {
            self.max_single_leg_price
        } else {
            self.profit_threshold - other_leg_average - ceiling_buffer()
        }
    }

    pub fn is_leg_price_acceptable(&self, leg: Outcome, price: Decimal, other_leg_average: Decimal) -> bool {
        let ceiling = self.leg_price_ceiling(other_leg_average);
        let acceptable = price <= ceiling;
        if !acceptable {
            debug!(%leg, %price, %ceiling, "Leg price above ceiling");
        }
        acceptable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::analysis::analyze;
    use crate::context::{LegPosition, Params, StrategyContext};
    use barter_data::books::OutcomeBooks;
    use rust_decimal_macros::dec;

    fn analysis(yes: (Decimal, Decimal), no: (Decimal, Decimal)) -> PositionAnalysis {
        let ctx = StrategyContext::new("bot", Params::new(), OutcomeBooks::default(), dec!(0.01))
            .with_position(Outcome::Yes, LegPosition::new(yes.0, yes.1))
            .with_position(Outcome::No, LegPosition::new(no.0, no.1));
        analyze(&ctx, dec!(0.2), dec!(10))
    }

    fn validator() -> PriceValidator {
        PriceValidator::new(dec!(0.98), dec!(0.65))
    }

    #[test]
    fn test_projected_average() {
        struct TestCase {
            current: (Decimal, Decimal),
            add: (Decimal, Decimal),
            expected: Decimal,
        }

        let cases = vec![
            // TC0: empty position takes the add price
            TestCase {
                current: (dec!(0), dec!(0)),
                add: (dec!(10), dec!(0.40)),
                expected: dec!(0.40),
            },
            // TC1: nothing added keeps the current average
            TestCase {
                current: (dec!(10), dec!(0.45)),
                add: (dec!(0), dec!(0.90)),
                expected: dec!(0.45),
            },
            // TC2: both empty
            TestCase {
                current: (dec!(0), dec!(0)),
                add: (dec!(0), dec!(0)),
                expected: dec!(0),
            },
            // TC3: weighted
            TestCase {
                current: (dec!(10), dec!(0.40)),
                add: (dec!(30), dec!(0.50)),
                expected: dec!(0.475),
            },
        ];

        for (index, test) in cases.into_iter().enumerate() {
            assert_eq!(
                projected_average(test.current.0, test.current.1, test.add.0, test.add.1),
                test.expected,
                "TC{index} failed"
            );
        }
    }

    #[test]
    fn test_leg_price_ceiling() {
        let validator = validator();
        assert_eq!(validator.leg_price_ceiling(dec!(0)), dec!(0.65));
        assert_eq!(validator.leg_price_ceiling(dec!(0.45)), dec!(0.52));

        assert!(validator.is_leg_price_acceptable(Outcome::No, dec!(0.52), dec!(0.45)));
        assert!(!validator.is_leg_price_acceptable(Outcome::No, dec!(0.53), dec!(0.45)));
        assert!(validator.is_leg_price_acceptable(Outcome::Yes, dec!(0.65), dec!(0)));
        assert!(!validator.is_leg_price_acceptable(Outcome::Yes, dec!(0.66), dec!(0)));
    }

    #[test]
    fn test_would_cost_be_valid_is_strict() {
        let validator = validator();
        let analysis = analysis((dec!(10), dec!(0.48)), (dec!(0), dec!(0)));

        // 0.48 + 0.49 = 0.97 < 0.98
        assert!(validator.would_cost_be_valid(&analysis, Outcome::No, dec!(10), dec!(0.49)));
        // 0.48 + 0.50 = 0.98 is not strictly below
        assert!(!validator.would_cost_be_valid(&analysis, Outcome::No, dec!(10), dec!(0.50)));
    }

    #[test]
    fn test_would_cost_be_valid_iff_projected_below_threshold() {
        let validator = validator();
        let analysis = analysis((dec!(40), dec!(0.42)), (dec!(30), dec!(0.46)));

        for cents in 30..70 {
            let price = Decimal::new(cents, 2);
            let projected = projected_average(dec!(30), dec!(0.46), dec!(10), price) + dec!(0.42);
            assert_eq!(
                validator.would_cost_be_valid(&analysis, Outcome::No, dec!(10), price),
                projected < dec!(0.98),
                "price {price}"
            );
        }
    }

    #[test]
    fn test_pair_at_threshold_accepts_no_buys() {
        let validator = validator();
        let analysis = analysis((dec!(50), dec!(0.49)), (dec!(50), dec!(0.49)));

        // Pair sits at 0.98 already, even a cheap add is refused
        assert!(!validator.would_cost_be_valid(&analysis, Outcome::Yes, dec!(10), dec!(0.40)));
        assert!(!validator.would_cost_be_valid(&analysis, Outcome::No, dec!(10), dec!(0.40)));
    }
}
