//! Duration-tracked status conditions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named conditions that can sit in a character's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Condition {
    /// Enemies must pass a Will save before attacking. Consumed by one attempt.
    Sanctuary,
}

impl Condition {
    pub fn name(&self) -> &'static str {
        match self {
            Condition::Sanctuary => "Sanctuary",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Conditions currently affecting a character, with rounds remaining.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionLedger {
    entries: BTreeMap<Condition, u32>,
}

impl ConditionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition, replacing any existing duration.
    pub fn add(&mut self, condition: Condition, rounds: u32) {
        if rounds == 0 {
            self.entries.remove(&condition);
        } else {
            self.entries.insert(condition, rounds);
        }
    }

    /// Remove a condition. Returns true if it was present.
    pub fn remove(&mut self, condition: Condition) -> bool {
        self.entries.remove(&condition).is_some()
    }

    pub fn has(&self, condition: Condition) -> bool {
        self.entries.contains_key(&condition)
    }

    pub fn remaining(&self, condition: Condition) -> Option<u32> {
        self.entries.get(&condition).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Condition, u32)> + '_ {
        self.entries.iter().map(|(c, r)| (*c, *r))
    }

    /// Count every condition down by one round and return those that expired.
    pub fn tick(&mut self) -> Vec<Condition> {
        let mut expired = Vec::new();
        for (condition, rounds) in self.entries.iter_mut() {
            *rounds = rounds.saturating_sub(1);
            if *rounds == 0 {
                expired.push(*condition);
            }
        }
        for condition in &expired {
            self.entries.remove(condition);
        }
        expired
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
