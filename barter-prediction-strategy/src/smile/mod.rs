//! Volatility-smile arbitrage.
//!
//! Prices "above strike K at settlement" binary markets as digital options
//! off the reference venue's implied volatility surface, and trades the
//! market leg whose quote deviates most from that theoretical value.

use self::{
    config::SmileArbConfig,
    discovery::{DiscoveredMarket, MarketDiscovery},
    pricing::{compute_theoretical_price_with_diagnostics, Confidence, PricingDiagnostics},
    risk::PortfolioRiskManager,
    settlement::{is_within_cutoff, minutes_until, settlement_time},
    surface::IvSnapshot,
};
use crate::{
    context::{BotId, StrategyContext},
    event::{EventSink, StrategyEvent},
    signal::{round_to_tick, StrategySignal},
    strategy::PredictionStrategy,
};
use async_trait::async_trait;
use barter_data::{
    books::OutcomeBooks,
    catalog::MarketCatalog,
    options::OptionChainSource,
};
use barter_instrument::{Outcome, Side};
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use smol_str::SmolStr;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// [`SmileArbConfig`] parsing.
pub mod config;

/// Auto-scan and manual market discovery.
pub mod discovery;

/// Digital option pricing and implied volatility.
pub mod pricing;

/// Per-strike and per-expiry notional caps.
pub mod risk;

/// Settlement date parsing and Eastern Time conversion.
pub mod settlement;

/// Implied volatility snapshot.
pub mod surface;

/// A mispriced leg on one market, net of the edge buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeCandidate {
    pub market_id: SmolStr,
    pub strike: Decimal,
    pub action: Side,
    pub leg: Outcome,
    /// Book price the trade executes at
    pub price: Decimal,
    /// Dollars per contract beyond the edge buffer
    pub edge: f64,
    /// Theoretical value of `leg`
    pub fair_value: f64,
    pub iv: f64,
    pub confidence: Confidence,
}

/// All positive edges on `market`'s four trade directions.
///
/// A direction is only considered if the quote it trades against rests at
/// least `min_depth` contracts.
pub fn find_edges(
    market: &DiscoveredMarket,
    books: &OutcomeBooks,
    pricing: &PricingDiagnostics,
    edge_buffer: f64,
    min_depth: Decimal,
) -> Vec<EdgeCandidate> {
    let mut candidates = Vec::new();

    for leg in Outcome::ALL {
        let fair_value = match leg {
            Outcome::Yes => pricing.price,
            Outcome::No => 1.0 - pricing.price,
        };
        let book = books.book(leg);

        let quotes = [
            (Side::Buy, book.best_ask),
            (Side::Sell, book.best_bid),
        ];

        for (action, level) in quotes {
            let Some(level) = level else {
                continue;
            };
            if level.amount < min_depth {
                continue;
            }
            let Some(price) = level.price.to_f64() else {
                continue;
            };

            let edge = match action {
                Side::Buy => fair_value - price - edge_buffer,
                Side::Sell => price - fair_value - edge_buffer,
            };

            if edge > 0.0 {
                candidates.push(EdgeCandidate {
                    market_id: market.market_id.clone(),
                    strike: market.strike,
                    action,
                    leg,
                    price: level.price,
                    edge,
                    fair_value,
                    iv: pricing.iv,
                    confidence: pricing.confidence,
                });
            }
        }
    }

    candidates
}

#[derive(Debug, Default)]
struct SmileBotState {
    snapshot: Option<IvSnapshot>,
    discovery: Option<MarketDiscovery>,
    risk: PortfolioRiskManager,
    risk_date: Option<NaiveDate>,
}

/// Executor for smile arbitrage, generic over the option chain source and
/// the prediction venue catalog.
///
/// Each bot keeps its own IV snapshot, discovery cache and risk book behind
/// an async mutex, so cycles for one bot are serialised while different bots
/// run concurrently.
#[derive(Debug)]
pub struct SmileArbStrategy<Source, Catalog> {
    source: Source,
    catalog: Catalog,
    bots: RwLock<HashMap<BotId, Arc<Mutex<SmileBotState>>>>,
    events: EventSink,
}

impl<Source, Catalog> SmileArbStrategy<Source, Catalog>
where
    Source: OptionChainSource,
    Catalog: MarketCatalog,
{
    pub fn new(source: Source, catalog: Catalog) -> Self {
        Self::with_events(source, catalog, EventSink::disabled())
    }

    pub fn with_events(source: Source, catalog: Catalog, events: EventSink) -> Self {
        Self {
            source,
            catalog,
            bots: RwLock::new(HashMap::new()),
            events,
        }
    }

    fn bot_state(&self, bot_id: &str) -> Arc<Mutex<SmileBotState>> {
        if let Some(state) = self.bots.read().get(bot_id) {
            return Arc::clone(state);
        }

        Arc::clone(self.bots.write().entry(BotId::from(bot_id)).or_default())
    }

    pub fn is_tracking(&self, bot_id: &str) -> bool {
        self.bots.read().contains_key(bot_id)
    }

    /// Run one decision cycle for the context's bot.
    pub async fn evaluate(&self, ctx: &StrategyContext) -> Option<StrategySignal> {
        let config = match SmileArbConfig::from_params(&ctx.params, ctx.now) {
            Ok(config) => config,
            Err(error) => {
                warn!(bot_id = %ctx.bot_id, %error, "Invalid smile arb config, skipping cycle");
                self.skip(ctx, error.to_string());
                return None;
            }
        };

        let Some(settlement) = settlement_time(config.settlement_date) else {
            warn!(bot_id = %ctx.bot_id, date = %config.settlement_date, "Settlement time does not exist");
            self.skip(ctx, format!("no settlement time for {}", config.settlement_date));
            return None;
        };

        let cutoff_minutes = i64::try_from(config.cutoff_minutes).unwrap_or(i64::MAX);
        if is_within_cutoff(settlement, cutoff_minutes, ctx.now) {
            info!(
                bot_id = %ctx.bot_id,
                minutes_to_settlement = minutes_until(settlement, ctx.now),
                cutoff_minutes,
                "Within settlement cutoff, not trading"
            );
            self.skip(ctx, "within settlement cutoff".to_string());
            return None;
        }

        let bot = self.bot_state(&ctx.bot_id);
        let mut guard = bot.lock().await;
        let state = &mut *guard;

        if state.risk_date != Some(config.settlement_date) {
            state.risk = PortfolioRiskManager::new(config.max_notional_per_strike, config.max_notional_per_expiry);
            state.risk_date = Some(config.settlement_date);
        } else {
            state
                .risk
                .set_limits(config.max_notional_per_strike, config.max_notional_per_expiry);
        }

        self.refresh_snapshot(state, &config, ctx).await;
        self.refresh_markets(state, &config, ctx).await;

        let Some(snapshot) = state.snapshot.as_ref() else {
            warn!(bot_id = %ctx.bot_id, "No IV snapshot available, skipping cycle");
            return None;
        };
        let markets: Vec<DiscoveredMarket> = state
            .discovery
            .as_ref()
            .map(|discovery| discovery.markets().to_vec())
            .unwrap_or_default();
        if markets.is_empty() {
            debug!(bot_id = %ctx.bot_id, "No markets discovered");
            return None;
        }

        let best = self
            .best_edge(ctx, &config, snapshot, &markets, settlement)
            .await?;

        if let Err(refusal) = state.risk.check(best.strike, config.order_size, best.price) {
            warn!(
                bot_id = %ctx.bot_id,
                market_id = %best.market_id,
                reason = %refusal,
                "Smile arb trade refused by risk"
            );
            self.events.send(StrategyEvent::RiskRejected {
                bot_id: ctx.bot_id.clone(),
                market_id: best.market_id.clone(),
                reason: refusal.to_string(),
            });
            return None;
        }
        state.risk.record_fill(best.strike, config.order_size, best.price);

        let signal = StrategySignal {
            action: best.action,
            side: best.leg,
            price: round_to_tick(best.price, ctx.tick_size),
            quantity: config.order_size.normalize().to_string(),
            reason: format!(
                "Smile arb {} {} on {}: edge={:.4} theo={:.4} iv={:.4} strike={} confidence={}",
                best.action,
                best.leg,
                best.market_id,
                best.edge,
                best.fair_value,
                best.iv,
                best.strike,
                best.confidence
            ),
            confidence: best.confidence.score(),
        };

        info!(
            bot_id = %ctx.bot_id,
            market_id = %best.market_id,
            action = %signal.action,
            side = %signal.side,
            price = %signal.price,
            edge = best.edge,
            confidence = %best.confidence,
            notional = %state.risk.total_notional(),
            "Smile arb signal"
        );
        self.events.send(StrategyEvent::SignalEmitted {
            bot_id: ctx.bot_id.clone(),
            signal: signal.clone(),
        });

        Some(signal)
    }

    /// Largest edge across all markets. Markets that fail to price or whose
    /// book cannot be fetched are skipped.
    ///
    /// Only this edge goes to the risk check. If risk refuses it the cycle
    /// emits nothing; smaller edges are not tried.
    async fn best_edge(
        &self,
        ctx: &StrategyContext,
        config: &SmileArbConfig,
        snapshot: &IvSnapshot,
        markets: &[DiscoveredMarket],
        settlement: DateTime<Utc>,
    ) -> Option<EdgeCandidate> {
        let mut best: Option<EdgeCandidate> = None;

        for market in markets {
            let Some(strike) = market.strike.to_f64() else {
                continue;
            };

            let pricing = match compute_theoretical_price_with_diagnostics(snapshot, strike, settlement, ctx.now) {
                Ok(pricing) => pricing,
                Err(error) => {
                    warn!(bot_id = %ctx.bot_id, market_id = %market.market_id, %error, "Failed to price market");
                    continue;
                }
            };

            let books = match tokio::time::timeout(config.fetch_timeout(), self.catalog.order_book(&market.market_id)).await {
                Ok(Ok(books)) => books,
                Ok(Err(error)) => {
                    warn!(bot_id = %ctx.bot_id, market_id = %market.market_id, %error, "Failed to fetch order book");
                    continue;
                }
                Err(_) => {
                    warn!(bot_id = %ctx.bot_id, market_id = %market.market_id, "Order book fetch timed out");
                    continue;
                }
            };

            for candidate in find_edges(market, &books, &pricing, config.edge_buffer, config.min_depth) {
                debug!(
                    market_id = %candidate.market_id,
                    action = %candidate.action,
                    leg = %candidate.leg,
                    edge = candidate.edge,
                    "Edge found"
                );
                if best.as_ref().map_or(true, |best| candidate.edge > best.edge) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    async fn refresh_snapshot(&self, state: &mut SmileBotState, config: &SmileArbConfig, ctx: &StrategyContext) {
        let stale = state
            .snapshot
            .as_ref()
            .map_or(true, |snapshot| snapshot.age(ctx.now) >= config.iv_refresh_interval());
        if !stale {
            return;
        }

        let fetched = tokio::time::timeout(config.fetch_timeout(), self.source.fetch_chain(&config.currency)).await;
        let result = match fetched {
            Ok(Ok(chain)) => IvSnapshot::from_chain(&chain, ctx.now).map_err(|error| error.to_string()),
            Ok(Err(error)) => Err(error.to_string()),
            Err(_) => Err(format!("timed out after {}s", config.fetch_timeout_secs)),
        };

        match result {
            Ok(snapshot) => {
                debug!(
                    bot_id = %ctx.bot_id,
                    expiries = snapshot.expiries.len(),
                    underlying = snapshot.underlying_price,
                    "IV snapshot refreshed"
                );
                state.snapshot = Some(snapshot);
            }
            Err(error) => {
                warn!(
                    bot_id = %ctx.bot_id,
                    %error,
                    cached = state.snapshot.is_some(),
                    "IV refresh failed, falling back to cached snapshot"
                );
                self.events.send(StrategyEvent::FeedFallback {
                    bot_id: ctx.bot_id.clone(),
                    feed: "options",
                    error,
                });
            }
        }
    }

    async fn refresh_markets(&self, state: &mut SmileBotState, config: &SmileArbConfig, ctx: &StrategyContext) {
        let mode = config.discovery_mode();
        let interval = config.discovery_refresh_interval();

        let rebuild = state
            .discovery
            .as_ref()
            .map_or(true, |discovery| *discovery.mode() != mode);
        if rebuild {
            match MarketDiscovery::new(mode, interval) {
                Ok(discovery) => state.discovery = Some(discovery),
                Err(error) => {
                    warn!(bot_id = %ctx.bot_id, %error, "Invalid discovery settings");
                    return;
                }
            }
        }

        let Some(discovery) = state.discovery.as_mut() else {
            return;
        };
        discovery.set_refresh_interval(interval);
        if !discovery.needs_refresh(ctx.now) {
            return;
        }

        let fetched = tokio::time::timeout(config.fetch_timeout(), discovery.discover(&self.catalog, ctx.now)).await;
        let error = match fetched {
            Ok(Ok(markets)) => {
                discovery.update(markets, ctx.now);
                return;
            }
            Ok(Err(error)) => error.to_string(),
            Err(_) => format!("timed out after {}s", config.fetch_timeout_secs),
        };

        warn!(
            bot_id = %ctx.bot_id,
            %error,
            cached = discovery.markets().len(),
            "Market discovery failed, falling back to cached markets"
        );
        self.events.send(StrategyEvent::FeedFallback {
            bot_id: ctx.bot_id.clone(),
            feed: "markets",
            error,
        });
    }

    fn skip(&self, ctx: &StrategyContext, reason: String) {
        self.events.send(StrategyEvent::CycleSkipped {
            bot_id: ctx.bot_id.clone(),
            reason,
        });
    }
}

#[async_trait]
impl<Source, Catalog> PredictionStrategy for SmileArbStrategy<Source, Catalog>
where
    Source: OptionChainSource,
    Catalog: MarketCatalog,
{
    async fn generate_signal(&self, ctx: &StrategyContext) -> Option<StrategySignal> {
        self.evaluate(ctx).await
    }

    fn remove_bot(&self, bot_id: &str) {
        self.bots.write().remove(bot_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barter_data::books::{Level, TopOfBook};
    use rust_decimal_macros::dec;

    fn market() -> DiscoveredMarket {
        DiscoveredMarket {
            market_id: "KX-100K".into(),
            strike: dec!(100000),
            settlement_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            title: "Bitcoin above $100,000".to_string(),
        }
    }

    fn pricing(price: f64) -> PricingDiagnostics {
        PricingDiagnostics {
            price,
            iv: 0.5,
            forward: 100_000.0,
            d2: Some(0.0),
            confidence: Confidence::High,
        }
    }

    fn books(yes: (Decimal, Decimal), no: (Decimal, Decimal), depth: Decimal) -> OutcomeBooks {
        OutcomeBooks::new(
            TopOfBook::new(Some(Level::new(yes.0, depth)), Some(Level::new(yes.1, depth))),
            TopOfBook::new(Some(Level::new(no.0, depth)), Some(Level::new(no.1, depth))),
        )
    }

    #[test]
    fn test_find_edges_cheap_yes() {
        let books = books((dec!(0.38), dec!(0.40)), (dec!(0.50), dec!(0.62)), dec!(50));
        let edges = find_edges(&market(), &books, &pricing(0.50), 0.02, dec!(10));

        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].action, Side::Buy);
        assert_eq!(edges[0].leg, Outcome::Yes);
        assert_eq!(edges[0].price, dec!(0.40));
        assert!((edges[0].edge - 0.08).abs() < 1e-9);
    }

    #[test]
    fn test_find_edges_rich_no_bid() {
        let books = books((dec!(0.30), dec!(0.52)), (dec!(0.60), dec!(0.70)), dec!(50));
        let edges = find_edges(&market(), &books, &pricing(0.50), 0.02, dec!(10));

        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].action, Side::Sell);
        assert_eq!(edges[0].leg, Outcome::No);
        assert!((edges[0].fair_value - 0.50).abs() < 1e-12);
        assert!((edges[0].edge - 0.08).abs() < 1e-9);
    }

    #[test]
    fn test_find_edges_respects_buffer_and_depth() {
        // Only 0.01 of raw edge, swallowed by the buffer
        let books_thin_edge = books((dec!(0.40), dec!(0.49)), (dec!(0.40), dec!(0.55)), dec!(50));
        assert!(find_edges(&market(), &books_thin_edge, &pricing(0.50), 0.02, dec!(10)).is_empty());

        // Large edge but not enough resting size
        let shallow = books((dec!(0.38), dec!(0.40)), (dec!(0.50), dec!(0.62)), dec!(5));
        assert!(find_edges(&market(), &shallow, &pricing(0.50), 0.02, dec!(10)).is_empty());
    }
}
