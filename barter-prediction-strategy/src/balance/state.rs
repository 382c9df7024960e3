//! Per-bot order timing used for cooldowns and round-robin entry.

use crate::context::BotId;
use barter_instrument::Outcome;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::{collections::HashMap, sync::Arc};

/// Timestamp of the most recent order on each leg. Legs never traded report
/// the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegCooldowns {
    pub last_yes: DateTime<Utc>,
    pub last_no: DateTime<Utc>,
}

impl Default for LegCooldowns {
    fn default() -> Self {
        Self {
            last_yes: DateTime::UNIX_EPOCH,
            last_no: DateTime::UNIX_EPOCH,
        }
    }
}

impl LegCooldowns {
    pub fn last(&self, leg: Outcome) -> DateTime<Utc> {
        match leg {
            Outcome::Yes => self.last_yes,
            Outcome::No => self.last_no,
        }
    }
}

#[derive(Debug, Default)]
struct BotLegState {
    cooldowns: LegCooldowns,
    last_bought: Option<Outcome>,
}

/// Cooldown timestamps and last-bought leg per bot.
///
/// Bots are independent: each entry sits behind its own lock so concurrent
/// cycles for different bots never contend beyond the map lookup.
#[derive(Debug, Default)]
pub struct ArbitrageState {
    bots: RwLock<HashMap<BotId, Arc<Mutex<BotLegState>>>>,
}

impl ArbitrageState {
    pub fn new() -> Self {
        Self::default()
    }

    fn bot(&self, bot_id: &str) -> Arc<Mutex<BotLegState>> {
        if let Some(state) = self.bots.read().get(bot_id) {
            return Arc::clone(state);
        }

        Arc::clone(self.bots.write().entry(BotId::from(bot_id)).or_default())
    }

    /// Leg cooldown timestamps, initialising the bot on first access.
    pub fn cooldowns(&self, bot_id: &str) -> LegCooldowns {
        self.bot(bot_id).lock().cooldowns
    }

    /// Record an order on `leg` at `at` and remember it as the last bought leg.
    pub fn record_order(&self, bot_id: &str, leg: Outcome, at: DateTime<Utc>) {
        let bot = self.bot(bot_id);
        let mut state = bot.lock();
        match leg {
            Outcome::Yes => state.cooldowns.last_yes = at,
            Outcome::No => state.cooldowns.last_no = at,
        }
        state.last_bought = Some(leg);
    }

    /// Whether fewer than `cooldown` has elapsed since the last order on `leg`.
    pub fn is_on_cooldown(&self, bot_id: &str, leg: Outcome, cooldown: chrono::Duration, now: DateTime<Utc>) -> bool {
        now - self.cooldowns(bot_id).last(leg) < cooldown
    }

    pub fn are_both_on_cooldown(&self, bot_id: &str, cooldown: chrono::Duration, now: DateTime<Utc>) -> bool {
        let cooldowns = self.cooldowns(bot_id);
        Outcome::ALL
            .iter()
            .all(|leg| now - cooldowns.last(*leg) < cooldown)
    }

    pub fn last_bought_leg(&self, bot_id: &str) -> Option<Outcome> {
        self.bots
            .read()
            .get(bot_id)
            .and_then(|state| state.lock().last_bought)
    }

    /// Leg to try first when entering: the opposite of the last bought leg,
    /// YES if nothing has been bought yet.
    pub fn next_leg_round_robin(&self, bot_id: &str) -> Outcome {
        self.last_bought_leg(bot_id)
            .map(|leg| leg.inverse())
            .unwrap_or(Outcome::Yes)
    }

    /// Drop all state for `bot_id`. Safe to call repeatedly.
    pub fn cleanup(&self, bot_id: &str) {
        self.bots.write().remove(bot_id);
    }

    pub fn is_tracking(&self, bot_id: &str) -> bool {
        self.bots.read().contains_key(bot_id)
    }
}
