use crate::games::types::RoundResult;
use std::collections::VecDeque;

/// Bounded record of recent crash results, oldest first
#[derive(Debug, Clone)]
pub struct CrashHistory {
    entries: VecDeque<RoundResult>,
    capacity: usize,
}

impl CrashHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, evicting the oldest entry when full
    pub fn push(&mut self, result: RoundResult) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&RoundResult> {
        self.entries.back()
    }

    pub fn to_vec(&self) -> Vec<RoundResult> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result(round: u64, crash_point: f64) -> RoundResult {
        RoundResult {
            round,
            crash_point,
            crashed_at: Utc::now(),
            total_staked: 0.0,
            total_paid: 0.0,
        }
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut history = CrashHistory::new(3);
        for round in 1..=5 {
            history.push(result(round, 1.0 + round as f64));
        }

        let rounds: Vec<u64> = history.to_vec().iter().map(|r| r.round).collect();
        assert_eq!(rounds, vec![3, 4, 5]);
        assert_eq!(history.latest().map(|r| r.crash_point), Some(6.0));
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut history = CrashHistory::new(0);
        history.push(result(1, 2.0));
        history.push(result(2, 3.0));
        assert_eq!(history.len(), 1);
    }
}
