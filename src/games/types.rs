use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Round number, starting at 1
pub type RoundId = u64;

/// Round phase as seen by clients
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Waiting,
    Flying,
    Crashed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Waiting => "waiting",
            Phase::Flying => "flying",
            Phase::Crashed => "crashed",
        }
    }

    /// Bets placed outside WAITING are queued for the following round
    pub fn accepts_current_round_bets(&self) -> bool {
        matches!(self, Phase::Waiting)
    }

    pub fn allows_cashout(&self) -> bool {
        matches!(self, Phase::Flying)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered player. Returned by value; the ledger keeps the only live copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub balance: f64,
}

/// Bet lifecycle. Transitions exactly once out of `Active`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BetStatus {
    Active,
    CashedOut { multiplier: f64 },
    Crashed,
}

impl BetStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, BetStatus::Active)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bet {
    pub player_id: String,
    pub player_name: String,
    pub amount: f64,
    pub round: RoundId,
    #[serde(flatten)]
    pub status: BetStatus,
    /// Amount credited at settlement; `None` until the round settles
    pub payout: Option<f64>,
}

impl Bet {
    pub fn new(player_id: String, player_name: String, amount: f64, round: RoundId) -> Self {
        Self {
            player_id,
            player_name,
            amount,
            round,
            status: BetStatus::Active,
            payout: None,
        }
    }
}

/// Public round state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundSnapshot {
    pub round: RoundId,
    pub phase: Phase,
    pub multiplier: f64,
    /// Time left in WAITING or CRASHED; 0 while flying
    pub remaining_time_ms: u64,
    pub active_bet_count: usize,
    pub queued_bet_count: usize,
    /// Revealed only once the round has crashed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crash_point: Option<f64>,
}

/// Entry of the active-bets view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActiveBetView {
    pub player_name: String,
    pub amount: f64,
}

/// Result of an accepted stake
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BetPlacement {
    pub round: RoundId,
    /// True when the bet waits for the next round
    pub queued: bool,
    pub amount: f64,
    pub balance: f64,
}

/// Result of an accepted cashout. The payout is credited at settlement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashoutReceipt {
    pub round: RoundId,
    pub amount: f64,
    pub multiplier: f64,
    pub payout: f64,
}

/// Totals of a single settlement pass
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SettlementReport {
    pub round: RoundId,
    pub cashed_out: usize,
    pub lost: usize,
    pub total_staked: f64,
    pub total_paid: f64,
}

/// Crash history entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundResult {
    pub round: RoundId,
    pub crash_point: f64,
    pub crashed_at: DateTime<Utc>,
    pub total_staked: f64,
    pub total_paid: f64,
}

/// Round to two decimal places, the precision of every displayed multiplier
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
