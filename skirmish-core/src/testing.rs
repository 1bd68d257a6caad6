//! Testing utilities for encounters.
//!
//! This module provides tools for integration testing:
//! - `ScriptedRoller` for deterministic dice
//! - `TestHarness` for scripted encounter scenarios
//! - Assertion helpers for verifying encounter state

use crate::character::Character;
use crate::class_data::ArchetypeKind;
use crate::config::{EncounterConfig, SchedulerDelays};
use crate::dice::{DiceRoller, DieType};
use crate::encounter::{Encounter, Intent};
use crate::error::IntentError;
use crate::grid::{GridPosition, Placement};
use crate::scheduler::{Phase, Tick};
use crate::waves::WaveDefinition;
use std::collections::VecDeque;

/// A dice roller that returns scripted values in order.
///
/// Values are clamped to the die's faces. Once the script runs out every
/// roll is a 1.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRoller {
    rolls: VecDeque<u32>,
}

impl ScriptedRoller {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
        }
    }

    /// Append more values to the script.
    pub fn push(&mut self, rolls: impl IntoIterator<Item = u32>) {
        self.rolls.extend(rolls);
    }

    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl DiceRoller for ScriptedRoller {
    fn roll_die(&mut self, die: DieType) -> u32 {
        self.rolls.pop_front().unwrap_or(1).clamp(1, die.sides())
    }
}

/// Test harness for running encounter scenarios.
pub struct TestHarness {
    /// The encounter under test.
    pub encounter: Encounter,
}

impl TestHarness {
    /// An encounter with zero delays, waiting for a class choice.
    pub fn new() -> Self {
        Self::with_config(EncounterConfig::new().with_delays(SchedulerDelays::instant()))
    }

    /// An encounter with a custom configuration and scripted dice.
    pub fn with_config(config: EncounterConfig) -> Self {
        Self {
            encounter: Encounter::with_roller(config, Box::new(ScriptedRoller::default())),
        }
    }

    /// Zero delays and a custom wave table.
    pub fn with_waves(waves: Vec<WaveDefinition>) -> Self {
        Self::with_config(
            EncounterConfig::new()
                .with_delays(SchedulerDelays::instant())
                .with_waves(waves),
        )
    }

    /// Pick the player's class and deploy the first wave.
    pub fn start(mut self, kind: ArchetypeKind) -> Self {
        self.intent(Intent::SelectClass(kind))
            .unwrap_or_else(|e| panic!("could not start encounter: {e}"));
        self
    }

    /// Replace the dice with a fresh script.
    pub fn rolls(&mut self, rolls: impl IntoIterator<Item = u32>) -> &mut Self {
        self.encounter
            .set_roller(Box::new(ScriptedRoller::new(rolls)));
        self
    }

    /// Send an intent.
    pub fn intent(&mut self, intent: Intent) -> Result<(), IntentError> {
        self.encounter.handle(intent)
    }

    /// Look a character up by name.
    #[track_caller]
    pub fn find(&self, name: &str) -> &Character {
        self.encounter
            .find_by_name(name)
            .unwrap_or_else(|| panic!("no character named '{name}'"))
    }

    /// Mutable access to a character, for arranging a scenario.
    #[track_caller]
    pub fn character_mut(&mut self, name: &str) -> &mut Character {
        self.encounter
            .roster
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .unwrap_or_else(|| panic!("no character named '{name}'"))
    }

    /// Set a character's current HP.
    pub fn set_hp(&mut self, name: &str, hp: i32) -> &mut Self {
        self.character_mut(name).hp.set(hp);
        self
    }

    /// Put a character on a square, ignoring movement rules.
    pub fn place(&mut self, name: &str, x: i32, y: i32) -> &mut Self {
        self.character_mut(name).placement = Placement::Deployed(GridPosition::new(x, y));
        self
    }

    /// Current HP of a character.
    pub fn hp(&self, name: &str) -> i32 {
        self.find(name).hp.current()
    }

    /// Select a target by name.
    pub fn target(&mut self, name: &str) -> Result<(), IntentError> {
        let id = self.find(name).id;
        self.intent(Intent::SelectTarget(id))
    }

    /// Tick until nothing is pending, at most `limit` ticks.
    pub fn settle(&mut self, limit: Tick) -> Tick {
        self.encounter.advance_until_idle(limit)
    }

    /// Tick until `done` holds, at most `limit` ticks. Returns whether it held.
    pub fn run_until(&mut self, limit: Tick, done: impl Fn(&Encounter) -> bool) -> bool {
        for _ in 0..limit {
            if done(&self.encounter) {
                return true;
            }
            self.encounter.tick();
        }
        done(&self.encounter)
    }

    pub fn phase(&self) -> Phase {
        self.encounter.phase()
    }

    /// Whether any log line contains `needle`.
    pub fn logged(&self, needle: &str) -> bool {
        self.encounter.log().contains(needle)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the encounter is in the expected phase.
#[track_caller]
pub fn assert_phase(harness: &TestHarness, expected: Phase) {
    assert_eq!(
        harness.phase(),
        expected,
        "Expected phase {expected:?}, got {:?}",
        harness.phase()
    );
}

/// Assert a character's current HP.
#[track_caller]
pub fn assert_hp(harness: &TestHarness, name: &str, expected: i32) {
    let actual = harness.hp(name);
    assert_eq!(actual, expected, "Expected {name} at {expected} HP, got {actual}");
}

/// Assert that some log line contains `needle`.
#[track_caller]
pub fn assert_logged(harness: &TestHarness, needle: &str) {
    assert!(
        harness.logged(needle),
        "Expected log to contain '{needle}'. Log:\n{}",
        harness.encounter.log().lines().join("\n")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TurnSlot;

    #[test]
    fn test_scripted_roller_clamps_and_defaults() {
        let mut roller = ScriptedRoller::new([25, 4]);
        assert_eq!(roller.roll_die(DieType::D20), 20);
        assert_eq!(roller.roll_die(DieType::D6), 4);
        assert_eq!(roller.remaining(), 0);
        assert_eq!(roller.roll_die(DieType::D8), 1);
        roller.push([7]);
        assert_eq!(roller.roll_die(DieType::D8), 7);
    }

    #[test]
    fn test_harness_starts_encounter() {
        let harness = TestHarness::new().start(ArchetypeKind::Cleric);
        assert_phase(&harness, Phase::Combat(TurnSlot::Party(0)));
        assert_hp(&harness, "Kyra", 32);
        assert_logged(&harness, "Kyra's turn!");
        assert_eq!(harness.find("goblin 2").position(), Some(GridPosition::new(14, 1)));
    }

    #[test]
    fn test_harness_arranges_scenarios() {
        let mut harness = TestHarness::new().start(ArchetypeKind::Fighter);
        harness.set_hp("Valeros", 12).place("Goblin 1", 2, 4);
        assert_hp(&harness, "Valeros", 12);
        assert_eq!(harness.find("Goblin 1").distance_to(harness.find("Valeros")), Some(1));
    }
}
