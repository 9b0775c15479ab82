//! Game metrics with Prometheus text export

use crate::errors::CrashResult;
use prometheus::{
    Counter, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

/// Per-engine Prometheus registry
#[derive(Clone)]
pub struct GameMetrics {
    registry: Registry,
    pub rounds_completed: IntCounter,
    pub bets_placed: IntCounter,
    pub bets_rejected: IntCounterVec,
    pub cashouts: IntCounter,
    pub amount_staked: Counter,
    pub amount_paid: Counter,
    pub players: IntGauge,
    pub crash_points: Histogram,
}

impl GameMetrics {
    pub fn new() -> CrashResult<Self> {
        let registry = Registry::new();

        let rounds_completed = IntCounter::new(
            "crashgame_rounds_completed_total",
            "Rounds that reached the crash and were settled",
        )?;
        let bets_placed = IntCounter::new("crashgame_bets_placed_total", "Accepted stakes")?;
        let bets_rejected = IntCounterVec::new(
            Opts::new("crashgame_bets_rejected_total", "Rejected stakes by error code"),
            &["code"],
        )?;
        let cashouts = IntCounter::new("crashgame_cashouts_total", "Accepted cashouts")?;
        let amount_staked = Counter::new("crashgame_amount_staked_total", "Sum of accepted stakes")?;
        let amount_paid = Counter::new("crashgame_amount_paid_total", "Sum of settled payouts")?;
        let players = IntGauge::new("crashgame_players", "Registered players")?;
        let crash_points = Histogram::with_opts(
            HistogramOpts::new("crashgame_crash_point", "Crash point distribution")
                .buckets(vec![1.01, 1.25, 1.5, 2.0, 3.0, 5.0, 10.0, 100.0, 1000.0]),
        )?;

        registry.register(Box::new(rounds_completed.clone()))?;
        registry.register(Box::new(bets_placed.clone()))?;
        registry.register(Box::new(bets_rejected.clone()))?;
        registry.register(Box::new(cashouts.clone()))?;
        registry.register(Box::new(amount_staked.clone()))?;
        registry.register(Box::new(amount_paid.clone()))?;
        registry.register(Box::new(players.clone()))?;
        registry.register(Box::new(crash_points.clone()))?;

        Ok(Self {
            registry,
            rounds_completed,
            bets_placed,
            bets_rejected,
            cashouts,
            amount_staked,
            amount_paid,
            players,
            crash_points,
        })
    }

    /// Prometheus text exposition format
    pub fn render(&self) -> CrashResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
