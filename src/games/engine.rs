//! Game engine
//!
//! Owns the round clock, ledger, bet book and crash history behind one lock.
//! Every public operation takes the lock once and runs to completion, so a
//! cashout and the tick that detects the crash are strictly ordered: whichever
//! acquires the lock first wins. `advance` is the only path that changes phase
//! or settles bets.

use crate::config::GameConfig;
use crate::errors::{CrashResult, GameError, GameResult};
use crate::games::bet_book::BetBook;
use crate::games::clock::{RoundClock, RoundTransition};
use crate::games::crash_point::{CrashPointGenerator, CrashPointSource};
use crate::games::history::CrashHistory;
use crate::games::ledger::Ledger;
use crate::games::types::{
    ActiveBetView, BetPlacement, CashoutReceipt, Player, RoundId, RoundResult, RoundSnapshot,
    SettlementReport,
};
use crate::metrics::GameMetrics;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Capacity of the round event channel; slow subscribers see `Lagged`
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Round events pushed to subscribers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundEvent {
    /// A new round is open for bets
    RoundStarted { round: RoundId },
    /// The multiplier started climbing
    Launched { round: RoundId },
    /// The round crashed and was settled
    Crashed {
        round: RoundId,
        crash_point: f64,
        settlement: SettlementReport,
    },
    /// Periodic state published by the ticker
    State { snapshot: RoundSnapshot },
}

struct EngineState {
    clock: RoundClock,
    ledger: Ledger,
    bets: BetBook,
    history: CrashHistory,
    crash_source: Box<dyn CrashPointSource>,
}

pub struct GameEngine {
    state: Mutex<EngineState>,
    metrics: Arc<GameMetrics>,
    events: broadcast::Sender<RoundEvent>,
    tick_interval: Duration,
}

impl GameEngine {
    /// Engine with a random crash point generator seeded from `config.crash`
    pub fn new(config: &GameConfig) -> CrashResult<Self> {
        let generator = CrashPointGenerator::new(config.crash.clone());
        Self::with_crash_source(config, Box::new(generator))
    }

    /// Engine drawing crash points from `source`
    pub fn with_crash_source(
        config: &GameConfig,
        source: Box<dyn CrashPointSource>,
    ) -> CrashResult<Self> {
        config.validate()?;

        let state = EngineState {
            clock: RoundClock::new(
                Instant::now(),
                config.waiting_duration(),
                config.settle_duration(),
            ),
            ledger: Ledger::new(config.ledger.starting_balance),
            bets: BetBook::new(),
            history: CrashHistory::new(config.round.history_capacity),
            crash_source: source,
        };
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            state: Mutex::new(state),
            metrics: Arc::new(GameMetrics::new()?),
            events,
            tick_interval: config.tick_interval(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        // No operation panics between partial writes
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn metrics(&self) -> Arc<GameMetrics> {
        self.metrics.clone()
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoundEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: RoundEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Register a new player with the starting balance
    pub fn add_player(&self, id: &str, name: &str) -> GameResult<Player> {
        let mut state = self.lock();
        let player = state.ledger.add_player(id, name)?;
        self.metrics.players.set(state.ledger.len() as i64);
        info!("👤 Player {} ({}) joined with balance {:.2}", id, name, player.balance);
        Ok(player)
    }

    /// Stake `amount` on the current round, or the next one once betting closed
    pub fn place_bet(&self, player_id: &str, amount: f64) -> GameResult<BetPlacement> {
        let mut state = self.lock();
        let EngineState {
            clock, ledger, bets, ..
        } = &mut *state;

        match bets.place_bet(ledger, player_id, amount, clock.phase(), clock.round()) {
            Ok(placement) => {
                self.metrics.bets_placed.inc();
                self.metrics.amount_staked.inc_by(amount);
                debug!(
                    "Bet {:.2} by {} for round {}{}",
                    amount,
                    player_id,
                    placement.round,
                    if placement.queued { " (queued)" } else { "" }
                );
                Ok(placement)
            }
            Err(e) => {
                self.metrics.bets_rejected.with_label_values(&[e.code()]).inc();
                debug!("Bet by {} rejected: {}", player_id, e);
                Err(e)
            }
        }
    }

    /// Lock in the multiplier last published by `advance`
    pub fn cashout(&self, player_id: &str) -> GameResult<CashoutReceipt> {
        let mut state = self.lock();
        if state.ledger.lookup_by_id(player_id).is_none() {
            return Err(GameError::NotFound(player_id.to_string()));
        }

        let phase = state.clock.phase();
        let multiplier = state.clock.multiplier();
        let receipt = state.bets.cashout(player_id, phase, multiplier).map_err(|e| {
            debug!("Cashout by {} rejected: {}", player_id, e);
            e
        })?;

        self.metrics.cashouts.inc();
        debug!(
            "Cashout by {} at {:.2}x in round {}",
            player_id, receipt.multiplier, receipt.round
        );
        Ok(receipt)
    }

    /// Administrative balance adjustment; negative amounts debit
    pub fn load_balance(&self, player_id: &str, amount: f64) -> GameResult<Player> {
        let mut state = self.lock();
        state.ledger.add_balance(player_id, amount)?;
        info!("💰 Balance of {} adjusted by {:.2}", player_id, amount);
        state
            .ledger
            .lookup_by_id(player_id)
            .ok_or_else(|| GameError::NotFound(player_id.to_string()))
    }

    /// `load_balance` for the first player registered under `name`
    pub fn load_balance_by_name(&self, name: &str, amount: f64) -> GameResult<Player> {
        let mut state = self.lock();
        let player = state
            .ledger
            .lookup_by_name(name)
            .ok_or_else(|| GameError::NotFound(name.to_string()))?;
        let balance = state.ledger.add_balance(&player.id, amount)?;
        info!("💰 Balance of {} ({}) adjusted by {:.2}", player.id, name, amount);
        Ok(Player { balance, ..player })
    }

    pub fn lookup_player(&self, id: &str) -> Option<Player> {
        self.lock().ledger.lookup_by_id(id)
    }

    pub fn lookup_player_by_name(&self, name: &str) -> Option<Player> {
        self.lock().ledger.lookup_by_name(name)
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub fn snapshot_at(&self, now: Instant) -> RoundSnapshot {
        let state = self.lock();
        Self::build_snapshot(&state, now)
    }

    fn build_snapshot(state: &EngineState, now: Instant) -> RoundSnapshot {
        RoundSnapshot {
            round: state.clock.round(),
            phase: state.clock.phase(),
            multiplier: state.clock.multiplier(),
            remaining_time_ms: state.clock.remaining(now).as_millis() as u64,
            active_bet_count: state.bets.active_count(),
            queued_bet_count: state.bets.queued().len(),
            crash_point: state.clock.revealed_crash_point(),
        }
    }

    /// Current-round bets that have not crashed
    pub fn active_bets(&self) -> Vec<ActiveBetView> {
        self.lock().bets.active_bets()
    }

    /// Recent crash results, oldest first
    pub fn crash_history(&self) -> Vec<RoundResult> {
        self.lock().history.to_vec()
    }

    /// Restart the crash point sequence from `seed`
    pub fn reseed(&self, seed: u64) {
        self.lock().crash_source.reseed(seed);
        info!("🎲 Crash point source reseeded");
    }

    /// Sum of all player balances
    pub fn total_balance(&self) -> f64 {
        self.lock().ledger.total_balance()
    }

    pub fn advance(&self) -> Option<RoundTransition> {
        self.advance_at(Instant::now())
    }

    /// Drive the round clock to `now`; settles on the crash transition
    pub fn advance_at(&self, now: Instant) -> Option<RoundTransition> {
        let mut state = self.lock();
        let EngineState {
            clock,
            ledger,
            bets,
            history,
            crash_source,
        } = &mut *state;

        let transition = clock.step(now, crash_source.as_mut())?;

        match transition {
            RoundTransition::Launched { round } => {
                info!("🚀 Round {} launched with {} bets", round, bets.active_count());
                self.publish(RoundEvent::Launched { round });
            }
            RoundTransition::Crashed { round, crash_point } => {
                let settlement = bets.settle(ledger, round);
                history.push(RoundResult {
                    round,
                    crash_point,
                    crashed_at: Utc::now(),
                    total_staked: settlement.total_staked,
                    total_paid: settlement.total_paid,
                });

                self.metrics.rounds_completed.inc();
                self.metrics.crash_points.observe(crash_point);
                self.metrics.amount_paid.inc_by(settlement.total_paid);

                info!(
                    "💥 Round {} crashed at {:.2}x ({} cashed out, {} lost)",
                    round, crash_point, settlement.cashed_out, settlement.lost
                );
                self.publish(RoundEvent::Crashed {
                    round,
                    crash_point,
                    settlement,
                });
            }
            RoundTransition::NextRound { round } => {
                bets.rollover(round);
                info!("🎰 Round {} open for bets ({} carried over)", round, bets.current().len());
                self.publish(RoundEvent::RoundStarted { round });
            }
        }

        Some(transition)
    }

    /// Broadcast the current snapshot to subscribers
    pub fn publish_state(&self) -> RoundSnapshot {
        let snapshot = self.snapshot();
        self.publish(RoundEvent::State {
            snapshot: snapshot.clone(),
        });
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::crash_point::ScriptedCrashPoints;
    use crate::games::types::Phase;

    fn engine(points: Vec<f64>) -> GameEngine {
        GameEngine::with_crash_source(
            &GameConfig::accelerated(),
            Box::new(ScriptedCrashPoints::new(points)),
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = GameConfig::accelerated();
        config.round.tick_ms = 0;
        assert!(GameEngine::new(&config).is_err());
    }

    #[test]
    fn test_cashout_unknown_player() {
        let engine = engine(vec![2.0]);
        assert_eq!(
            engine.cashout("ghost"),
            Err(GameError::NotFound("ghost".to_string()))
        );
    }

    #[test]
    fn test_cashout_while_waiting_is_invalid_phase() {
        let engine = engine(vec![2.0]);
        engine.add_player("p1", "Alice").unwrap();
        engine.place_bet("p1", 10.0).unwrap();
        assert_eq!(
            engine.cashout("p1"),
            Err(GameError::InvalidPhase(Phase::Waiting))
        );
    }

    #[test]
    fn test_crash_settles_once_and_records_history() {
        let engine = engine(vec![1.5]);
        engine.add_player("p1", "Alice").unwrap();
        engine.place_bet("p1", 100.0).unwrap();

        let t0 = Instant::now();
        assert!(matches!(
            engine.advance_at(t0 + Duration::from_millis(100)),
            Some(RoundTransition::Launched { round: 1 })
        ));
        let t1 = t0 + Duration::from_millis(100);
        assert!(matches!(
            engine.advance_at(t1 + Duration::from_secs(30)),
            Some(RoundTransition::Crashed { round: 1, .. })
        ));

        // Further ticks inside the settle window change nothing
        assert_eq!(engine.advance_at(t1 + Duration::from_millis(30_010)), None);

        assert_eq!(engine.lookup_player("p1").unwrap().balance, 900.0);
        let history = engine.crash_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].crash_point, 1.5);
        assert_eq!(engine.metrics().rounds_completed.get(), 1);

        let snapshot = engine.snapshot_at(t1 + Duration::from_millis(30_010));
        assert_eq!(snapshot.phase, Phase::Crashed);
        assert_eq!(snapshot.crash_point, Some(1.5));
        assert_eq!(snapshot.multiplier, 1.5);
        assert_eq!(snapshot.active_bet_count, 0);
    }

    #[test]
    fn test_load_balance_by_name() {
        let engine = engine(vec![2.0]);
        engine.add_player("p1", "Alice").unwrap();

        let player = engine.load_balance_by_name("Alice", 500.0).unwrap();
        assert_eq!(player.balance, 1500.0);
        assert_eq!(
            engine.load_balance_by_name("Nobody", 1.0),
            Err(GameError::NotFound("Nobody".to_string()))
        );
        assert!(engine.load_balance("p1", -2000.0).is_err());
        assert_eq!(engine.lookup_player_by_name("Alice").unwrap().balance, 1500.0);
    }

    #[test]
    fn test_events_published_on_transitions() {
        let engine = engine(vec![1.01]);
        let mut rx = engine.subscribe();

        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(100);
        engine.advance_at(t1);
        engine.advance_at(t1 + Duration::from_secs(1));
        engine.advance_at(t1 + Duration::from_millis(1_050));

        assert_eq!(rx.try_recv().unwrap(), RoundEvent::Launched { round: 1 });
        assert!(matches!(
            rx.try_recv().unwrap(),
            RoundEvent::Crashed { round: 1, crash_point, .. } if crash_point == 1.01
        ));
        assert_eq!(rx.try_recv().unwrap(), RoundEvent::RoundStarted { round: 2 });
    }

    #[test]
    fn test_rejected_bets_are_counted() {
        let engine = engine(vec![2.0]);
        assert!(engine.place_bet("ghost", 10.0).is_err());
        assert_eq!(
            engine
                .metrics()
                .bets_rejected
                .with_label_values(&["NOT_FOUND"])
                .get(),
            1
        );
    }
}
