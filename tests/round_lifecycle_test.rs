//! Round lifecycle scenarios
//! Deterministic runs drive the engine with explicit instants and scripted
//! crash points; the concurrent run uses the real ticker.

use crashgame::games::{
    spawn_ticker, CashoutReceipt, GameEngine, Phase, RoundTransition, ScriptedCrashPoints,
};
use crashgame::{GameConfig, GameError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

fn scripted_engine(config: &GameConfig, points: Vec<f64>) -> GameEngine {
    GameEngine::with_crash_source(config, Box::new(ScriptedCrashPoints::new(points)))
        .expect("Failed to create engine")
}

/// Run four full rounds in simulated time, then stop in WAITING.
/// Every bet placed before the call, queued ones included, is settled.
fn drain_rounds(engine: &GameEngine, from: Instant) {
    let mut step = 0u64;
    while step < 12 || engine.snapshot().phase != Phase::Waiting {
        step += 1;
        engine.advance_at(from + Duration::from_secs(60 * step));
    }
}

#[test]
fn test_cashout_then_crash_credits_payout() {
    let engine = scripted_engine(&GameConfig::accelerated(), vec![2.0]);

    let player = engine.add_player("p1", "Alice").unwrap();
    assert_eq!(player.balance, 1000.0);

    let placement = engine.place_bet("p1", 100.0).unwrap();
    assert_eq!(placement.round, 1);
    assert!(!placement.queued);
    assert_eq!(engine.lookup_player("p1").unwrap().balance, 900.0);

    let t0 = Instant::now();
    let t1 = t0 + Duration::from_millis(100);
    assert_eq!(
        engine.advance_at(t1),
        Some(RoundTransition::Launched { round: 1 })
    );
    assert_eq!(engine.snapshot_at(t1).phase, Phase::Flying);

    engine.advance_at(t1 + Duration::from_millis(2232));
    let snapshot = engine.snapshot_at(t1 + Duration::from_millis(2232));
    assert_eq!(snapshot.multiplier, 1.5);
    assert_eq!(snapshot.crash_point, None);

    let receipt = engine.cashout("p1").unwrap();
    assert_eq!(receipt.multiplier, 1.5);
    assert_eq!(receipt.payout, 150.0);

    // Still only the stake is gone until settlement
    assert_eq!(engine.lookup_player("p1").unwrap().balance, 900.0);

    let crash_at = t1 + Duration::from_secs(10);
    assert_eq!(
        engine.advance_at(crash_at),
        Some(RoundTransition::Crashed {
            round: 1,
            crash_point: 2.0
        })
    );
    assert_eq!(engine.lookup_player("p1").unwrap().balance, 1050.0);

    let snapshot = engine.snapshot_at(crash_at);
    assert_eq!(snapshot.phase, Phase::Crashed);
    assert_eq!(snapshot.crash_point, Some(2.0));
    assert_eq!(snapshot.multiplier, 2.0);

    // Cashed-out bets remain in the active view, crashed ones do not
    let active = engine.active_bets();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].player_name, "Alice");

    assert_eq!(
        engine.advance_at(crash_at + Duration::from_millis(50)),
        Some(RoundTransition::NextRound { round: 2 })
    );
    assert_eq!(engine.lookup_player("p1").unwrap().balance, 1050.0);
    assert!(engine.active_bets().is_empty());
}

#[test]
fn test_uncashed_bet_is_lost() {
    let engine = scripted_engine(&GameConfig::accelerated(), vec![1.3]);
    engine.add_player("p1", "Alice").unwrap();
    engine.place_bet("p1", 250.0).unwrap();

    let t1 = Instant::now() + Duration::from_millis(100);
    engine.advance_at(t1);
    engine.advance_at(t1 + Duration::from_secs(30));

    assert_eq!(engine.lookup_player("p1").unwrap().balance, 750.0);
    assert_eq!(
        engine.cashout("p1"),
        Err(GameError::InvalidPhase(Phase::Crashed))
    );
    assert!(engine.active_bets().is_empty());
}

#[test]
fn test_unknown_player_bet_rejected() {
    let engine = scripted_engine(&GameConfig::accelerated(), vec![2.0]);
    let before = engine.snapshot();

    assert_eq!(
        engine.place_bet("unknown", 10.0),
        Err(GameError::NotFound("unknown".to_string()))
    );

    let after = engine.snapshot();
    assert_eq!(after.active_bet_count, before.active_bet_count);
    assert_eq!(after.queued_bet_count, 0);
}

#[test]
fn test_insufficient_funds_leaves_balance() {
    let engine = scripted_engine(&GameConfig::accelerated(), vec![2.0]);
    engine.add_player("p1", "Alice").unwrap();

    assert!(matches!(
        engine.place_bet("p1", 2000.0),
        Err(GameError::InsufficientFunds { .. })
    ));
    assert_eq!(engine.lookup_player("p1").unwrap().balance, 1000.0);
    assert!(engine.active_bets().is_empty());
}

#[test]
fn test_duplicate_join_rejected() {
    let engine = scripted_engine(&GameConfig::accelerated(), vec![2.0]);
    engine.add_player("p1", "Alice").unwrap();
    assert_eq!(
        engine.add_player("p1", "Mallory"),
        Err(GameError::Duplicate("p1".to_string()))
    );
}

#[test]
fn test_bet_during_flight_is_queued_for_next_round() {
    let engine = scripted_engine(&GameConfig::accelerated(), vec![3.0, 2.0]);
    engine.add_player("p1", "Alice").unwrap();

    let t1 = Instant::now() + Duration::from_millis(100);
    engine.advance_at(t1);

    let placement = engine.place_bet("p1", 40.0).unwrap();
    assert!(placement.queued);
    assert_eq!(placement.round, 2);
    assert_eq!(placement.balance, 960.0);
    assert_eq!(engine.snapshot_at(t1).queued_bet_count, 1);

    // The queued bet cannot be cashed out in the round it was placed in
    assert_eq!(
        engine.cashout("p1"),
        Err(GameError::NoActiveBet("p1".to_string()))
    );

    let crash_at = t1 + Duration::from_secs(30);
    engine.advance_at(crash_at);
    // Bets placed while crashed are queued too
    assert!(engine.place_bet("p1", 10.0).unwrap().queued);

    assert_eq!(
        engine.advance_at(crash_at + Duration::from_millis(50)),
        Some(RoundTransition::NextRound { round: 2 })
    );
    let snapshot = engine.snapshot_at(crash_at + Duration::from_millis(50));
    assert_eq!(snapshot.round, 2);
    assert_eq!(snapshot.phase, Phase::Waiting);
    assert_eq!(snapshot.active_bet_count, 2);
    assert_eq!(snapshot.queued_bet_count, 0);
    assert_eq!(snapshot.remaining_time_ms, 100);
}

#[test]
fn test_multiple_bets_cash_out_in_order() {
    let engine = scripted_engine(&GameConfig::accelerated(), vec![5.0]);
    engine.add_player("p1", "Alice").unwrap();
    engine.place_bet("p1", 10.0).unwrap();
    engine.place_bet("p1", 20.0).unwrap();

    let t1 = Instant::now() + Duration::from_millis(100);
    engine.advance_at(t1);
    engine.advance_at(t1 + Duration::from_millis(2232));

    assert_eq!(engine.cashout("p1").unwrap().amount, 10.0);
    assert_eq!(engine.cashout("p1").unwrap().amount, 20.0);
    assert_eq!(
        engine.cashout("p1"),
        Err(GameError::NoActiveBet("p1".to_string()))
    );

    engine.advance_at(t1 + Duration::from_secs(60));
    assert_eq!(engine.lookup_player("p1").unwrap().balance, 1015.0);
}

#[test]
fn test_history_records_each_round() {
    let mut config = GameConfig::accelerated();
    config.round.history_capacity = 2;
    let engine = scripted_engine(&config, vec![1.1, 1.2, 1.3]);

    drain_rounds(&engine, Instant::now());

    // Four rounds crashed at 1.1, 1.2, 1.3, 1.1; only the last two are kept
    let history = engine.crash_history();
    assert_eq!(history.len(), 2);
    assert_eq!((history[0].round, history[0].crash_point), (3, 1.3));
    assert_eq!((history[1].round, history[1].crash_point), (4, 1.1));
}

#[tokio::test]
async fn test_ticker_drives_rounds_in_real_time() {
    let mut config = GameConfig::accelerated();
    config.round.tick_ms = 10;
    let engine = Arc::new(scripted_engine(&config, vec![1.01]));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let ticker = spawn_ticker(engine.clone(), engine.tick_interval(), shutdown_rx);
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    shutdown_tx.send(true).unwrap();
    ticker.await.unwrap();

    let snapshot = engine.snapshot();
    assert!(snapshot.round >= 2, "only reached round {}", snapshot.round);
    assert!(!engine.crash_history().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_players_conserve_balance() {
    let mut config = GameConfig::accelerated();
    config.round.tick_ms = 5;
    config.round.history_capacity = 10_000;
    let engine = Arc::new(scripted_engine(&config, vec![1.05, 1.1, 1.01, 1.2]));

    const PLAYERS: usize = 8;
    const STAKE: f64 = 10.0;
    for i in 0..PLAYERS {
        engine.add_player(&format!("p{}", i), &format!("Player {}", i)).unwrap();
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ticker = spawn_ticker(engine.clone(), engine.tick_interval(), shutdown_rx);

    let mut tasks = Vec::new();
    for i in 0..PLAYERS {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            let id = format!("p{}", i);
            let mut staked = 0.0;
            let mut receipts: Vec<CashoutReceipt> = Vec::new();
            let deadline = Instant::now() + Duration::from_millis(1_500);

            while Instant::now() < deadline {
                if engine.place_bet(&id, STAKE).is_ok() {
                    staked += STAKE;
                }
                for _ in 0..(i + 1) {
                    tokio::time::sleep(Duration::from_millis(3)).await;
                }
                if let Ok(receipt) = engine.cashout(&id) {
                    receipts.push(receipt);
                }
                tokio::time::sleep(Duration::from_millis(7)).await;
            }
            (id, staked, receipts)
        }));
    }

    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap());
    }

    shutdown_tx.send(true).unwrap();
    ticker.await.unwrap();
    drain_rounds(&engine, Instant::now());

    let crash_points: HashMap<u64, f64> = engine
        .crash_history()
        .into_iter()
        .map(|r| (r.round, r.crash_point))
        .collect();

    let mut total_receipts = 0;
    for (id, staked, receipts) in &results {
        let paid: f64 = receipts.iter().map(|r| r.payout).sum();
        let balance = engine.lookup_player(id).unwrap().balance;
        assert!(
            (balance - (1000.0 - staked + paid)).abs() < 1e-6,
            "{}: balance {} != 1000 - {} + {}",
            id,
            balance,
            staked,
            paid
        );

        for receipt in receipts {
            let crash_point = crash_points[&receipt.round];
            assert!(
                receipt.multiplier < crash_point,
                "cashout at {} in round {} crashed at {}",
                receipt.multiplier,
                receipt.round,
                crash_point
            );
        }
        total_receipts += receipts.len();
    }

    assert!(total_receipts > 0, "no cashout was ever accepted");
    assert_eq!(engine.snapshot().phase, Phase::Waiting);
    assert!(engine.active_bets().is_empty());
}
