//! Crash point policy
//!
//! One crash multiplier is drawn per round: `house_edge / r` with `r` uniform
//! in the open interval (0, 1), clamped to the configured bounds and rounded
//! to two decimals.

use crate::config::CrashPolicyConfig;
use crate::games::types::round2;
use rand::distributions::Open01;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of per-round crash points consumed by the engine
pub trait CrashPointSource: Send {
    fn next_crash_point(&mut self) -> f64;

    /// Restart the sequence from `seed`; sources without randomness ignore it
    fn reseed(&mut self, _seed: u64) {}
}

/// Map a uniform draw in (0, 1) to a crash point
pub fn crash_point_from_uniform(r: f64, policy: &CrashPolicyConfig) -> f64 {
    let raw = policy.house_edge / r;
    round2(raw.clamp(policy.min_multiplier, policy.max_multiplier))
}

/// Seedable random crash point generator
pub struct CrashPointGenerator {
    rng: StdRng,
    policy: CrashPolicyConfig,
}

impl CrashPointGenerator {
    /// Seeded from `policy.seed`, or from entropy when unset
    pub fn new(policy: CrashPolicyConfig) -> Self {
        let rng = match policy.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, policy }
    }

    pub fn policy(&self) -> &CrashPolicyConfig {
        &self.policy
    }
}

impl CrashPointSource for CrashPointGenerator {
    fn next_crash_point(&mut self) -> f64 {
        let r: f64 = self.rng.sample(Open01);
        crash_point_from_uniform(r, &self.policy)
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

/// Replays a fixed list of crash points, cycling when exhausted
#[derive(Debug, Clone)]
pub struct ScriptedCrashPoints {
    points: Vec<f64>,
    next: usize,
}

impl ScriptedCrashPoints {
    pub fn new(points: Vec<f64>) -> Self {
        Self { points, next: 0 }
    }
}

impl CrashPointSource for ScriptedCrashPoints {
    fn next_crash_point(&mut self) -> f64 {
        if self.points.is_empty() {
            return 1.0;
        }
        let point = self.points[self.next % self.points.len()];
        self.next = self.next.wrapping_add(1);
        point
    }
}
