use super::StrategySignal;
use barter_data::books::TopOfBook;
use barter_instrument::{Outcome, Side};
use rust_decimal::{Decimal, RoundingStrategy};

/// Discount applied to the best bid when posting a passive buy (0.5%).
fn passive_discount() -> Decimal {
    Decimal::new(5, 3)
}

/// Round `price` to the nearest multiple of `tick`, halves away from zero.
///
/// A non-positive tick leaves the price untouched.
pub fn round_price_to_tick(price: Decimal, tick: Decimal) -> Decimal {
    if tick <= Decimal::ZERO {
        return price;
    }

    let ticks = (price / tick).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    ticks * tick
}

/// Round `price` to `tick` and format it with exactly as many decimals as the
/// tick carries, eg/ `(0.4567, 0.01) -> "0.46"`, `(4.7, 1) -> "5"`.
pub fn round_to_tick(price: Decimal, tick: Decimal) -> String {
    let tick = tick.normalize();
    if tick <= Decimal::ZERO {
        return price.normalize().to_string();
    }

    let rounded = round_price_to_tick(price, tick);
    format!("{:.*}", tick.scale() as usize, rounded)
}

fn format_quantity(quantity: Decimal) -> String {
    quantity.normalize().to_string()
}

/// Builds [`StrategySignal`]s priced against the current book of a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalFactory {
    tick_size: Decimal,
}

impl SignalFactory {
    pub fn new(tick_size: Decimal) -> Self {
        Self { tick_size }
    }

    pub fn tick_size(&self) -> Decimal {
        self.tick_size
    }

    /// Buy signal on `leg`.
    ///
    /// Aggressive buys lift the best ask. Passive buys sit just below the
    /// best bid, and step a full tick under the bid if the discounted price
    /// would otherwise cross the ask.
    pub fn create_buy_signal(
        &self,
        leg: Outcome,
        quantity: Decimal,
        book: &TopOfBook,
        aggressive: bool,
        reason: impl Into<String>,
        confidence: f64,
    ) -> Option<StrategySignal> {
        let price = if aggressive {
            round_price_to_tick(book.ask_price()?, self.tick_size)
        } else {
            self.passive_bid_price(book)?
        };

        if price <= Decimal::ZERO || quantity <= Decimal::ZERO {
            return None;
        }

        Some(StrategySignal {
            action: Side::Buy,
            side: leg,
            price: round_to_tick(price, self.tick_size),
            quantity: format_quantity(quantity),
            reason: reason.into(),
            confidence,
        })
    }

    /// Sell signal on `leg` at the best bid. The reason is suffixed with the
    /// estimated profit against `avg_entry`.
    pub fn create_sell_signal(
        &self,
        leg: Outcome,
        quantity: Decimal,
        book: &TopOfBook,
        avg_entry: Decimal,
        reason: impl Into<String>,
        confidence: f64,
    ) -> Option<StrategySignal> {
        let price = round_price_to_tick(book.bid_price()?, self.tick_size);
        if price <= Decimal::ZERO || quantity <= Decimal::ZERO {
            return None;
        }

        let estimated_profit = (price - avg_entry) * quantity;

        Some(StrategySignal {
            action: Side::Sell,
            side: leg,
            price: round_to_tick(price, self.tick_size),
            quantity: format_quantity(quantity),
            reason: format!("{} (est. profit ${:.2})", reason.into(), estimated_profit),
            confidence,
        })
    }

    fn passive_bid_price(&self, book: &TopOfBook) -> Option<Decimal> {
        let bid = book.bid_price()?;
        let discounted = bid * (Decimal::ONE - passive_discount());
        let rounded = round_price_to_tick(discounted, self.tick_size);

        let crosses = book
            .ask_price()
            .is_some_and(|ask| discounted >= ask || rounded >= ask);

        if crosses {
            let stepped = round_price_to_tick(bid, self.tick_size) - self.tick_size;
            Some(stepped.max(self.tick_size))
        } else {
            Some(rounded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barter_data::books::Level;
    use rust_decimal_macros::dec;

    fn book(bid: Decimal, ask: Decimal) -> TopOfBook {
        TopOfBook::new(
            Some(Level::new(bid, dec!(100))),
            Some(Level::new(ask, dec!(100))),
        )
    }

    #[test]
    fn test_round_to_tick() {
        struct TestCase {
            price: Decimal,
            tick: Decimal,
            expected: &'static str,
        }

        let cases = vec![
            // TC0: cent tick rounds up
            TestCase {
                price: dec!(0.4567),
                tick: dec!(0.01),
                expected: "0.46",
            },
            // TC1: integer tick drops decimals
            TestCase {
                price: dec!(4.7),
                tick: dec!(1),
                expected: "5",
            },
            // TC2: nickel tick rounds down
            TestCase {
                price: dec!(0.47),
                tick: dec!(0.05),
                expected: "0.45",
            },
            // TC3: exact half rounds away from zero
            TestCase {
                price: dec!(0.455),
                tick: dec!(0.01),
                expected: "0.46",
            },
            // TC4: trailing zeros in the tick do not add decimals
            TestCase {
                price: dec!(0.5),
                tick: dec!(0.010),
                expected: "0.50",
            },
        ];

        for (index, test) in cases.into_iter().enumerate() {
            assert_eq!(
                round_to_tick(test.price, test.tick),
                test.expected,
                "TC{index} failed"
            );
        }
    }

    #[test]
    fn test_aggressive_buy_lifts_ask() {
        let factory = SignalFactory::new(dec!(0.01));
        let signal = factory
            .create_buy_signal(Outcome::Yes, dec!(10), &book(dec!(0.44), dec!(0.46)), true, "Balance", 0.7)
            .unwrap();

        assert_eq!(signal.action, Side::Buy);
        assert_eq!(signal.side, Outcome::Yes);
        assert_eq!(signal.price, "0.46");
        assert_eq!(signal.quantity, "10");
    }

    #[test]
    fn test_passive_buy_sits_at_or_below_bid() {
        let factory = SignalFactory::new(dec!(0.01));
        let signal = factory
            .create_buy_signal(Outcome::No, dec!(10), &book(dec!(0.44), dec!(0.46)), false, "Entry", 0.5)
            .unwrap();

        // 0.44 * 0.995 = 0.4378 rounds back to the bid
        assert_eq!(signal.price, "0.44");
    }

    #[test]
    fn test_passive_buy_steps_under_bid_on_crossed_book() {
        let factory = SignalFactory::new(dec!(0.01));
        let signal = factory
            .create_buy_signal(Outcome::No, dec!(10), &book(dec!(0.50), dec!(0.49)), false, "Entry", 0.5)
            .unwrap();

        assert_eq!(signal.price, "0.49");
    }

    #[test]
    fn test_passive_buy_floors_at_one_tick() {
        let factory = SignalFactory::new(dec!(0.01));
        let signal = factory
            .create_buy_signal(Outcome::Yes, dec!(5), &book(dec!(0.01), dec!(0.01)), false, "Entry", 0.5)
            .unwrap();

        assert_eq!(signal.price, "0.01");
    }

    #[test]
    fn test_buy_without_book_side_is_none() {
        let factory = SignalFactory::new(dec!(0.01));
        let empty = TopOfBook::default();

        assert!(factory.create_buy_signal(Outcome::Yes, dec!(10), &empty, true, "x", 0.5).is_none());
        assert!(factory.create_buy_signal(Outcome::Yes, dec!(10), &empty, false, "x", 0.5).is_none());
    }

    #[test]
    fn test_sell_signal_reports_estimated_profit() {
        let factory = SignalFactory::new(dec!(0.01));
        let signal = factory
            .create_sell_signal(Outcome::Yes, dec!(20), &book(dec!(0.80), dec!(0.82)), dec!(0.45), "Profit take", 0.8)
            .unwrap();

        assert_eq!(signal.action, Side::Sell);
        assert_eq!(signal.price, "0.80");
        assert_eq!(signal.quantity, "20");
        assert_eq!(signal.reason, "Profit take (est. profit $7.00)");
    }
}
