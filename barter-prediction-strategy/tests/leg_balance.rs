//! Integration tests for the leg-balancing strategy.
//!
//! Drives `generate_signal` across several cycles the way a host would,
//! updating positions and pending orders between calls. No network calls.

use barter_data::books::{Level, OutcomeBooks, TopOfBook};
use barter_instrument::{Outcome, Side};
use barter_prediction_strategy::{
    EventSink, LegBalanceStrategy, LegPosition, Params, PendingOrders, PredictionStrategy,
    StrategyContext, StrategyEvent,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap()
}

fn book(bid: Decimal, ask: Decimal) -> TopOfBook {
    TopOfBook::new(Some(Level::new(bid, dec!(50))), Some(Level::new(ask, dec!(50))))
}

/// YES 0.45/0.47, NO 0.50/0.52
fn market() -> OutcomeBooks {
    OutcomeBooks::new(book(dec!(0.45), dec!(0.47)), book(dec!(0.50), dec!(0.52)))
}

fn ctx(bot_id: &str, secs: i64) -> StrategyContext {
    StrategyContext::new(bot_id, Params::new(), market(), dec!(0.01)).at(start() + Duration::seconds(secs))
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<StrategyEvent>) -> Vec<StrategyEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ---------------------------------------------------------------------------
// Test 1: Entry, balance, cooldown skip, then balance again
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_host_loop_builds_balanced_pair() {
    let (events, mut rx) = EventSink::channel();
    let strategy = LegBalanceStrategy::with_events(events);

    // Cycle 1: flat, passive entry on YES at the bid
    let signal = strategy.generate_signal(&ctx("bot", 0)).await.unwrap();
    assert_eq!(signal.action, Side::Buy);
    assert_eq!(signal.side, Outcome::Yes);
    assert_eq!(signal.price, "0.45");
    assert_eq!(signal.quantity, "10");
    assert_eq!(signal.confidence, 0.5);

    // Cycle 2: YES order resting, NO lags by 100% so it is bought at the ask.
    // Ceiling for NO is 0.98 - 0.45 - 0.01 = 0.52.
    let cycle = ctx("bot", 1).with_pending(Outcome::Yes, PendingOrders::new(dec!(10), dec!(0.45)));
    let signal = strategy.generate_signal(&cycle).await.unwrap();
    assert_eq!(signal.action, Side::Buy);
    assert_eq!(signal.side, Outcome::No);
    assert_eq!(signal.price, "0.52");
    assert_eq!(signal.confidence, 0.7);

    // Cycle 3: both filled, both legs on the 5s cooldown
    let filled = |secs| {
        ctx("bot", secs)
            .with_position(Outcome::Yes, LegPosition::new(dec!(10), dec!(0.45)))
            .with_position(Outcome::No, LegPosition::new(dec!(10), dec!(0.52)))
    };
    assert!(strategy.generate_signal(&filled(2)).await.is_none());

    // Cycle 4: cooldowns elapsed, tied legs balance YES passively at 0.45,
    // exactly the ceiling 0.98 - 0.52 - 0.01
    let signal = strategy.generate_signal(&filled(6)).await.unwrap();
    assert_eq!(signal.side, Outcome::Yes);
    assert_eq!(signal.price, "0.45");
    assert_eq!(signal.confidence, 0.7);

    let events = drain(&mut rx);
    let emitted = events
        .iter()
        .filter(|event| matches!(event, StrategyEvent::SignalEmitted { .. }))
        .count();
    assert_eq!(emitted, 3);
    assert!(events.contains(&StrategyEvent::CooldownSkip { bot_id: "bot".into() }));
}

// ---------------------------------------------------------------------------
// Test 2: Pair cost at threshold blocks every buy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_expensive_pair_is_blocked() {
    let (events, mut rx) = EventSink::channel();
    let strategy = LegBalanceStrategy::with_events(events);

    let cycle = ctx("bot", 0)
        .with_position(Outcome::Yes, LegPosition::new(dec!(50), dec!(0.49)))
        .with_position(Outcome::No, LegPosition::new(dec!(50), dec!(0.49)));

    assert!(strategy.generate_signal(&cycle).await.is_none());
    assert!(drain(&mut rx)
        .iter()
        .any(|event| matches!(event, StrategyEvent::TradeBlocked { .. })));
}

// ---------------------------------------------------------------------------
// Test 3: Close-out hedges the lagging leg, ignoring cooldowns
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_close_out_hedges_repeatedly() {
    let strategy = LegBalanceStrategy::new();

    let cycle = ctx("bot", 0)
        .with_position(Outcome::Yes, LegPosition::new(dec!(100), dec!(0.45)))
        .with_position(Outcome::No, LegPosition::new(dec!(60), dec!(0.45)))
        .with_time_progress(0.95);

    for _ in 0..2 {
        let signal = strategy.generate_signal(&cycle).await.unwrap();
        assert_eq!(signal.action, Side::Buy);
        assert_eq!(signal.side, Outcome::No);
        assert_eq!(signal.price, "0.52");
        // min(imbalance 40, 10 x 3)
        assert_eq!(signal.quantity, "30");
        assert_eq!(signal.confidence, 0.9);
    }
}

#[tokio::test]
async fn test_close_out_disabled_falls_back_to_balance() {
    let strategy = LegBalanceStrategy::new();
    let params = json!({ "closeOutEnabled": "false" }).as_object().cloned().unwrap();

    let cycle = StrategyContext::new("bot", params, market(), dec!(0.01))
        .with_position(Outcome::Yes, LegPosition::new(dec!(100), dec!(0.45)))
        .with_position(Outcome::No, LegPosition::new(dec!(60), dec!(0.45)))
        .with_time_progress(0.95)
        .at(start());

    let signal = strategy.generate_signal(&cycle).await.unwrap();
    assert_eq!(signal.side, Outcome::No);
    assert_eq!(signal.quantity, "10");
    assert_eq!(signal.confidence, 0.7);
}

// ---------------------------------------------------------------------------
// Test 4: Bots are isolated and removable
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_bots_do_not_share_state() {
    let strategy = LegBalanceStrategy::new();

    let first_a = strategy.generate_signal(&ctx("bot-a", 0)).await.unwrap();
    let first_b = strategy.generate_signal(&ctx("bot-b", 0)).await.unwrap();
    assert_eq!(first_a.side, Outcome::Yes);
    assert_eq!(first_b.side, Outcome::Yes);

    // bot-a alternates to NO while YES cools down
    let second_a = strategy.generate_signal(&ctx("bot-a", 1)).await.unwrap();
    assert_eq!(second_a.side, Outcome::No);

    // Forgetting bot-a restarts its round-robin on YES
    strategy.remove_bot("bot-a");
    assert!(!strategy.state().is_tracking("bot-a"));
    assert!(strategy.state().is_tracking("bot-b"));

    let restarted = strategy.generate_signal(&ctx("bot-a", 2)).await.unwrap();
    assert_eq!(restarted.side, Outcome::Yes);
}

// ---------------------------------------------------------------------------
// Test 5: Concurrent bots on a shared strategy
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bots() {
    let strategy = std::sync::Arc::new(LegBalanceStrategy::new());

    let handles: Vec<_> = (0..8)
        .map(|index| {
            let strategy = std::sync::Arc::clone(&strategy);
            tokio::spawn(async move {
                let bot_id = format!("bot-{index}");
                strategy.generate_signal(&ctx(&bot_id, 0)).await
            })
        })
        .collect();

    for handle in handles {
        let signal = handle.await.unwrap().unwrap();
        assert_eq!(signal.side, Outcome::Yes);
    }
}
