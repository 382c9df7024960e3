//! Smile arbitrage cycles against live public market data.
//!
//! Wires together:
//! - Deribit option chain (public REST, no credentials)
//! - Kalshi market listings and order books (public REST, no credentials)
//! - Smile arbitrage strategy, logging every signal it would send
//!
//! Nothing is traded.
//!
//! Usage:
//!   # Optional environment variables
//!   SETTLEMENT_DATE=2025-01-15   (defaults to tomorrow, Eastern Time)
//!   SERIES_TICKER=KXBTCD
//!   CYCLES=5
//!
//!   cargo run -p barter-prediction-strategy --example smile_arb_live

use barter_data::{
    books::OutcomeBooks,
    exchange::{deribit::DeribitHttpClient, kalshi::KalshiMarketsClient},
};
use barter_prediction_strategy::{
    smile::settlement::eastern_date, EventSink, PredictionStrategy, SmileArbStrategy,
    StrategyContext, StrategyEvent,
};
use chrono::{Days, Utc};
use rust_decimal_macros::dec;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

const BOT_ID: &str = "smile-live";
const CYCLE_INTERVAL: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() {
    init_logging();

    let settlement_date = std::env::var("SETTLEMENT_DATE").unwrap_or_else(|_| {
        eastern_date(Utc::now())
            .checked_add_days(Days::new(1))
            .map(|date| date.to_string())
            .unwrap_or_default()
    });
    let series = std::env::var("SERIES_TICKER").unwrap_or_else(|_| "KXBTCD".to_string());
    let cycles: usize = std::env::var("CYCLES")
        .ok()
        .and_then(|cycles| cycles.parse().ok())
        .unwrap_or(5);

    let params = json!({
        "currency": "BTC",
        "settlementDate": settlement_date,
        "seriesTicker": series,
        "marketPattern": "bitcoin|btc",
        "edgeBuffer": "0.03",
        "orderSize": "5",
    });
    let params = params.as_object().cloned().unwrap_or_default();

    let (events, mut event_rx) = EventSink::channel();
    let strategy = SmileArbStrategy::with_events(
        DeribitHttpClient::default(),
        KalshiMarketsClient::default(),
        events,
    );

    info!(%settlement_date, %series, cycles, "Starting smile arb cycles");

    for cycle in 0..cycles {
        let ctx = StrategyContext::new(BOT_ID, params.clone(), OutcomeBooks::default(), dec!(0.01))
            .at(Utc::now());

        match strategy.generate_signal(&ctx).await {
            Some(signal) => info!(cycle, ?signal, "Signal"),
            None => info!(cycle, "No signal"),
        }

        while let Ok(event) = event_rx.try_recv() {
            match event {
                StrategyEvent::FeedFallback { feed, error, .. } => warn!(feed, %error, "Feed fallback"),
                StrategyEvent::RiskRejected { market_id, reason, .. } => {
                    warn!(%market_id, %reason, "Risk rejected")
                }
                _ => {}
            }
        }

        tokio::time::sleep(CYCLE_INTERVAL).await;
    }

    strategy.remove_bot(BOT_ID);
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
