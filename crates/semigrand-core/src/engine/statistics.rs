use serde::{Deserialize, Serialize};

/// Attempt/accept counters for one move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveStatistics {
    pub attempts: u64,
    pub accepted: u64,
}

impl MoveStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, accepted: bool) {
        self.attempts += 1;
        if accepted {
            self.accepted += 1;
        }
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempts as f64
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
