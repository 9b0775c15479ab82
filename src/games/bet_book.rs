//! Per-round bet collections
//!
//! Bets placed during WAITING join the current round; anything placed later is
//! queued for the next one and promoted on rollover.

use crate::errors::{GameError, GameResult};
use crate::games::ledger::Ledger;
use crate::games::types::{
    ActiveBetView, Bet, BetPlacement, BetStatus, CashoutReceipt, Phase, RoundId, SettlementReport,
};
use tracing::error;

#[derive(Debug, Clone, Default)]
pub struct BetBook {
    current: Vec<Bet>,
    queued: Vec<Bet>,
}

impl BetBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &[Bet] {
        &self.current
    }

    pub fn queued(&self) -> &[Bet] {
        &self.queued
    }

    /// Current-round bets that have not crashed
    pub fn active_count(&self) -> usize {
        self.current
            .iter()
            .filter(|b| !matches!(b.status, BetStatus::Crashed))
            .count()
    }

    /// Deduct the stake and record the bet. On error nothing changes.
    pub fn place_bet(
        &mut self,
        ledger: &mut Ledger,
        player_id: &str,
        amount: f64,
        phase: Phase,
        current_round: RoundId,
    ) -> GameResult<BetPlacement> {
        let player = ledger
            .lookup_by_id(player_id)
            .ok_or_else(|| GameError::NotFound(player_id.to_string()))?;

        if !amount.is_finite() || amount <= 0.0 {
            return Err(GameError::InvalidAmount(amount));
        }

        let balance = ledger.deduct_balance(player_id, amount)?;

        let queued = !phase.accepts_current_round_bets();
        let round = if queued { current_round + 1 } else { current_round };
        let bet = Bet::new(player.id, player.name, amount, round);

        if queued {
            self.queued.push(bet);
        } else {
            self.current.push(bet);
        }

        Ok(BetPlacement {
            round,
            queued,
            amount,
            balance,
        })
    }

    /// Lock in `live_multiplier` on the player's first active bet
    pub fn cashout(
        &mut self,
        player_id: &str,
        phase: Phase,
        live_multiplier: f64,
    ) -> GameResult<CashoutReceipt> {
        if !phase.allows_cashout() {
            return Err(GameError::InvalidPhase(phase));
        }

        let bet = self
            .current
            .iter_mut()
            .find(|b| b.player_id == player_id && b.status.is_active())
            .ok_or_else(|| GameError::NoActiveBet(player_id.to_string()))?;

        bet.status = BetStatus::CashedOut {
            multiplier: live_multiplier,
        };

        Ok(CashoutReceipt {
            round: bet.round,
            amount: bet.amount,
            multiplier: live_multiplier,
            payout: bet.amount * live_multiplier,
        })
    }

    /// Finalize every current bet. Runs once per crash.
    pub fn settle(&mut self, ledger: &mut Ledger, round: RoundId) -> SettlementReport {
        let mut report = SettlementReport {
            round,
            ..SettlementReport::default()
        };

        for bet in self.current.iter_mut() {
            debug_assert!(bet.payout.is_none(), "bet settled twice");
            report.total_staked += bet.amount;

            match bet.status {
                BetStatus::Active => {
                    bet.status = BetStatus::Crashed;
                    bet.payout = Some(0.0);
                    report.lost += 1;
                }
                BetStatus::CashedOut { multiplier } => {
                    let payout = bet.amount * multiplier;
                    if let Err(e) = ledger.add_balance(&bet.player_id, payout) {
                        error!("Payout for {} not credited: {}", bet.player_id, e);
                        continue;
                    }
                    bet.payout = Some(payout);
                    report.cashed_out += 1;
                    report.total_paid += payout;
                }
                BetStatus::Crashed => {}
            }
        }

        report
    }

    /// Start `new_round` with the queued bets
    pub fn rollover(&mut self, new_round: RoundId) {
        debug_assert!(self.queued.iter().all(|b| b.round == new_round));
        self.current = std::mem::take(&mut self.queued);
    }

    pub fn active_bets(&self) -> Vec<ActiveBetView> {
        self.current
            .iter()
            .filter(|b| !matches!(b.status, BetStatus::Crashed))
            .map(|b| ActiveBetView {
                player_name: b.player_name.clone(),
                amount: b.amount,
            })
            .collect()
    }
}
