//! Round phase state machine
//!
//! `RoundClock::step` is the single transition function. Each call performs at
//! most one transition, and the new phase starts at the instant passed in.

use crate::games::crash_point::CrashPointSource;
use crate::games::types::{round2, Phase, RoundId};
use std::time::{Duration, Instant};

/// Multiplier after `elapsed` seconds of flight: `1 + (e^(0.1t) - 1) * 2`
pub fn multiplier_at(elapsed: Duration) -> f64 {
    let t = elapsed.as_secs_f64();
    round2(1.0 + ((0.1 * t).exp() - 1.0) * 2.0)
}

/// Phase plus the data that only exists in that phase
#[derive(Debug, Clone, PartialEq)]
pub enum RoundState {
    Waiting {
        since: Instant,
    },
    Flying {
        since: Instant,
        crash_point: f64,
        multiplier: f64,
    },
    Crashed {
        since: Instant,
        crash_point: f64,
    },
}

impl RoundState {
    pub fn phase(&self) -> Phase {
        match self {
            RoundState::Waiting { .. } => Phase::Waiting,
            RoundState::Flying { .. } => Phase::Flying,
            RoundState::Crashed { .. } => Phase::Crashed,
        }
    }
}

/// Outcome of a `step` that changed phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundTransition {
    /// WAITING -> FLYING
    Launched { round: RoundId },
    /// FLYING -> CRASHED; settlement must run exactly once
    Crashed { round: RoundId, crash_point: f64 },
    /// CRASHED -> WAITING with the new round number
    NextRound { round: RoundId },
}

#[derive(Debug, Clone)]
pub struct RoundClock {
    round: RoundId,
    state: RoundState,
    waiting: Duration,
    settle: Duration,
}

impl RoundClock {
    /// Round 1, WAITING since `now`
    pub fn new(now: Instant, waiting: Duration, settle: Duration) -> Self {
        Self {
            round: 1,
            state: RoundState::Waiting { since: now },
            waiting,
            settle,
        }
    }

    pub fn round(&self) -> RoundId {
        self.round
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    /// Last multiplier published by `step`
    pub fn multiplier(&self) -> f64 {
        match self.state {
            RoundState::Waiting { .. } => 1.0,
            RoundState::Flying { multiplier, .. } => multiplier,
            RoundState::Crashed { crash_point, .. } => crash_point,
        }
    }

    /// Crash point, revealed only after the crash
    pub fn revealed_crash_point(&self) -> Option<f64> {
        match self.state {
            RoundState::Crashed { crash_point, .. } => Some(crash_point),
            _ => None,
        }
    }

    /// Time left in a timed phase; zero while flying
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.state {
            RoundState::Waiting { since } => {
                self.waiting.saturating_sub(now.saturating_duration_since(since))
            }
            RoundState::Crashed { since, .. } => {
                self.settle.saturating_sub(now.saturating_duration_since(since))
            }
            RoundState::Flying { .. } => Duration::ZERO,
        }
    }

    /// Evaluate the clock at `now`, performing at most one transition
    pub fn step(
        &mut self,
        now: Instant,
        source: &mut dyn CrashPointSource,
    ) -> Option<RoundTransition> {
        match self.state {
            RoundState::Waiting { since } => {
                if now.saturating_duration_since(since) < self.waiting {
                    return None;
                }
                self.state = RoundState::Flying {
                    since: now,
                    crash_point: source.next_crash_point(),
                    multiplier: 1.0,
                };
                Some(RoundTransition::Launched { round: self.round })
            }
            RoundState::Flying {
                since,
                crash_point,
                multiplier,
            } => {
                let live = multiplier_at(now.saturating_duration_since(since)).max(multiplier);
                if live >= crash_point {
                    self.state = RoundState::Crashed {
                        since: now,
                        crash_point,
                    };
                    return Some(RoundTransition::Crashed {
                        round: self.round,
                        crash_point,
                    });
                }
                self.state = RoundState::Flying {
                    since,
                    crash_point,
                    multiplier: live,
                };
                None
            }
            RoundState::Crashed { since, .. } => {
                if now.saturating_duration_since(since) < self.settle {
                    return None;
                }
                self.round += 1;
                self.state = RoundState::Waiting { since: now };
                Some(RoundTransition::NextRound { round: self.round })
            }
        }
    }
}
