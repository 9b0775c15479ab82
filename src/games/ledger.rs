//! Player registry and balance mutations
//!
//! Balances never go negative. Lookups hand out copies; the registry is the
//! only place a balance changes.

use crate::errors::{GameError, GameResult};
use crate::games::types::Player;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Ledger {
    players: HashMap<String, Player>,
    starting_balance: f64,
}

impl Ledger {
    pub fn new(starting_balance: f64) -> Self {
        Self {
            players: HashMap::new(),
            starting_balance,
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Register a player with the starting balance
    pub fn add_player(&mut self, id: &str, name: &str) -> GameResult<Player> {
        if self.players.contains_key(id) {
            return Err(GameError::Duplicate(id.to_string()));
        }
        let player = Player {
            id: id.to_string(),
            name: name.to_string(),
            balance: self.starting_balance,
        };
        self.players.insert(id.to_string(), player.clone());
        Ok(player)
    }

    /// Withdraw a stake; returns the new balance
    pub fn deduct_balance(&mut self, id: &str, amount: f64) -> GameResult<f64> {
        let player = self
            .players
            .get_mut(id)
            .ok_or_else(|| GameError::NotFound(id.to_string()))?;

        if !amount.is_finite() || amount < 0.0 {
            return Err(GameError::InvalidAmount(amount));
        }
        if player.balance < amount {
            return Err(GameError::InsufficientFunds {
                balance: player.balance,
                requested: amount,
            });
        }

        player.balance -= amount;
        Ok(player.balance)
    }

    /// Administrative credit or debit; returns the new balance.
    /// A debit larger than the balance is refused.
    pub fn add_balance(&mut self, id: &str, amount: f64) -> GameResult<f64> {
        let player = self
            .players
            .get_mut(id)
            .ok_or_else(|| GameError::NotFound(id.to_string()))?;

        if !amount.is_finite() {
            return Err(GameError::InvalidAmount(amount));
        }
        let updated = player.balance + amount;
        if updated < 0.0 {
            return Err(GameError::InsufficientFunds {
                balance: player.balance,
                requested: -amount,
            });
        }

        player.balance = updated;
        Ok(updated)
    }

    pub fn lookup_by_id(&self, id: &str) -> Option<Player> {
        self.players.get(id).cloned()
    }

    /// First player registered under `name`; names are not unique
    pub fn lookup_by_name(&self, name: &str) -> Option<Player> {
        self.players.values().find(|p| p.name == name).cloned()
    }

    /// Sum of all balances
    pub fn total_balance(&self) -> f64 {
        self.players.values().map(|p| p.balance).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with_p1() -> Ledger {
        let mut ledger = Ledger::new(1000.0);
        ledger.add_player("p1", "Alice").unwrap();
        ledger
    }

    #[test]
    fn test_add_player_uses_starting_balance() {
        let ledger = ledger_with_p1();
        let player = ledger.lookup_by_id("p1").unwrap();
        assert_eq!(player.balance, 1000.0);
        assert_eq!(player.name, "Alice");
    }

    #[test]
    fn test_duplicate_player_rejected() {
        let mut ledger = ledger_with_p1();
        assert_eq!(
            ledger.add_player("p1", "Someone"),
            Err(GameError::Duplicate("p1".to_string()))
        );
        assert_eq!(ledger.lookup_by_id("p1").unwrap().name, "Alice");
    }

    #[test]
    fn test_deduct_balance_rules() {
        let mut ledger = ledger_with_p1();

        assert_eq!(ledger.deduct_balance("p1", 100.0), Ok(900.0));
        assert!(matches!(
            ledger.deduct_balance("p1", 2000.0),
            Err(GameError::InsufficientFunds { .. })
        ));
        assert_eq!(ledger.deduct_balance("p1", -5.0), Err(GameError::InvalidAmount(-5.0)));
        assert!(matches!(
            ledger.deduct_balance("p1", f64::NAN),
            Err(GameError::InvalidAmount(_))
        ));
        assert_eq!(
            ledger.deduct_balance("ghost", 1.0),
            Err(GameError::NotFound("ghost".to_string()))
        );
        assert_eq!(ledger.lookup_by_id("p1").unwrap().balance, 900.0);
    }

    #[test]
    fn test_deduct_entire_balance() {
        let mut ledger = ledger_with_p1();
        assert_eq!(ledger.deduct_balance("p1", 1000.0), Ok(0.0));
    }

    #[test]
    fn test_add_balance_allows_debit_but_not_below_zero() {
        let mut ledger = ledger_with_p1();

        assert_eq!(ledger.add_balance("p1", 250.0), Ok(1250.0));
        assert_eq!(ledger.add_balance("p1", -1250.0), Ok(0.0));
        assert!(matches!(
            ledger.add_balance("p1", -0.01),
            Err(GameError::InsufficientFunds { .. })
        ));
        assert_eq!(ledger.lookup_by_id("p1").unwrap().balance, 0.0);
    }

    #[test]
    fn test_lookup_returns_copies() {
        let mut ledger = ledger_with_p1();
        let mut copy = ledger.lookup_by_id("p1").unwrap();
        copy.balance = 1.0;

        assert_eq!(ledger.lookup_by_id("p1").unwrap().balance, 1000.0);
        ledger.add_player("p2", "Bob").unwrap();
        assert_eq!(ledger.lookup_by_name("Bob").unwrap().id, "p2");
        assert!(ledger.lookup_by_name("Carol").is_none());
        assert_eq!(ledger.total_balance(), 2000.0);
    }
}
