//! API Request and Response Models

use crate::games::types::{ActiveBetView, RoundResult};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// POST /api/game/join
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub player_id: String,
    pub name: String,
}

/// POST /api/game/bet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetRequest {
    pub player_id: String,
    pub amount: f64,
}

/// POST /api/game/cashout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashoutRequest {
    pub player_id: String,
}

/// POST /api/game/load-balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadBalanceRequest {
    pub player_name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveBetsResponse {
    pub round: u64,
    pub bets: Vec<ActiveBetView>,
}

/// Recent crash results, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub crash_points: Vec<f64>,
    pub rounds: Vec<RoundResult>,
}

impl From<Vec<RoundResult>> for HistoryResponse {
    fn from(rounds: Vec<RoundResult>) -> Self {
        Self {
            crash_points: rounds.iter().map(|r| r.crash_point).collect(),
            rounds,
        }
    }
}
