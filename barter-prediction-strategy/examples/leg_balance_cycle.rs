//! Simulated host loop for the leg-balancing strategy.
//!
//! Every signal is filled immediately at its limit price and fed back into
//! the next cycle's positions, while the market drifts between two quotes.
//!
//! Usage:
//!   RUST_LOG=barter_prediction_strategy=debug cargo run -p barter-prediction-strategy --example leg_balance_cycle

use barter_data::books::{Level, OutcomeBooks, TopOfBook};
use barter_instrument::{Outcome, Side};
use barter_prediction_strategy::{
    EventSink, LegBalanceStrategy, LegPosition, PredictionStrategy, StrategyContext,
    StrategyEvent,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::{collections::HashMap, str::FromStr};
use tracing::info;

const CYCLES: i64 = 40;
const BOT_ID: &str = "demo-bot";

#[tokio::main]
async fn main() {
    init_logging();

    let (events, mut event_rx) = EventSink::channel();
    let strategy = LegBalanceStrategy::with_events(events);

    let params = json!({
        "orderSize": "10",
        "profitThreshold": "0.98",
        "cooldownMs": 3000,
        "maxPositionPerLeg": "100",
    });
    let params = params.as_object().cloned().unwrap_or_default();

    let mut positions: HashMap<Outcome, LegPosition> = HashMap::new();
    let start = Utc::now();

    for cycle in 0..CYCLES {
        let ctx = StrategyContext {
            positions: positions.clone(),
            ..StrategyContext::new(BOT_ID, params.clone(), market(cycle), dec!(0.01))
        }
        .with_time_progress(cycle as f64 / CYCLES as f64)
        .at(start + Duration::seconds(cycle));

        let Some(signal) = strategy.generate_signal(&ctx).await else {
            continue;
        };

        let (Ok(price), Ok(quantity)) = (
            Decimal::from_str(&signal.price),
            Decimal::from_str(&signal.quantity),
        ) else {
            continue;
        };

        let position = positions.entry(signal.side).or_default();
        match signal.action {
            Side::Buy => {
                let total = position.size + quantity;
                position.avg_price = (position.size * position.avg_price + quantity * price) / total;
                position.size = total;
            }
            Side::Sell => {
                position.realized_pnl += (price - position.avg_price) * quantity;
                position.size -= quantity;
            }
        }
    }

    let mut skipped = 0;
    let mut blocked = 0;
    while let Ok(event) = event_rx.try_recv() {
        match event {
            StrategyEvent::CooldownSkip { .. } => skipped += 1,
            StrategyEvent::TradeBlocked { .. } => blocked += 1,
            _ => {}
        }
    }

    let yes = positions.get(&Outcome::Yes).copied().unwrap_or_default();
    let no = positions.get(&Outcome::No).copied().unwrap_or_default();
    info!(
        yes_size = %yes.size,
        yes_avg = %yes.avg_price.round_dp(4),
        no_size = %no.size,
        no_avg = %no.avg_price.round_dp(4),
        pair_cost = %(yes.avg_price + no.avg_price).round_dp(4),
        skipped,
        blocked,
        "Simulation finished"
    );
}

/// Quotes alternate between YES-cheap and NO-cheap every five cycles.
fn market(cycle: i64) -> OutcomeBooks {
    let book = |bid: Decimal, ask: Decimal| {
        TopOfBook::new(Some(Level::new(bid, dec!(200))), Some(Level::new(ask, dec!(200))))
    };

    if (cycle / 5) % 2 == 0 {
        OutcomeBooks::new(book(dec!(0.42), dec!(0.44)), book(dec!(0.53), dec!(0.55)))
    } else {
        OutcomeBooks::new(book(dec!(0.53), dec!(0.55)), book(dec!(0.42), dec!(0.44)))
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(cfg!(debug_assertions))
        .init()
}
