//! Encounter configuration.

use crate::effects::EffectTiming;
use crate::error::ConfigError;
use crate::grid::GridBounds;
use crate::waves::{default_waves, WaveDefinition};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Scheduler delays, in ticks (60 ticks per second).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerDelays {
    /// Pause after each AI-driven action before the next decision.
    pub ai_action: u64,
    /// Input lockout after a human action.
    pub player_action: u64,
    /// Input lockout after a human Stride.
    pub player_move: u64,
    /// Extra wait when a Stride spends the last action.
    pub turn_end_after_move: u64,
    /// Length of the wave-complete overlay.
    pub victory_pause: u64,
}

impl Default for SchedulerDelays {
    fn default() -> Self {
        Self {
            ai_action: 90,
            player_action: 60,
            player_move: 30,
            turn_end_after_move: 30,
            victory_pause: 180,
        }
    }
}

impl SchedulerDelays {
    /// All delays zero, for tests and fast simulation.
    pub fn instant() -> Self {
        Self {
            ai_action: 0,
            player_action: 0,
            player_move: 0,
            turn_end_after_move: 0,
            victory_pause: 0,
        }
    }
}

/// Configuration for an [`Encounter`](crate::encounter::Encounter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Board size.
    pub grid: GridBounds,

    /// RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Let the AI play the human slot, upgrades and wave confirmation too.
    pub autopilot: bool,

    /// Scheduler delays.
    pub delays: SchedulerDelays,

    /// Effect start delay and base duration.
    pub effects: EffectTiming,

    /// Row the party lines up on at the start of each wave.
    pub party_row: i32,

    /// Wave table, fought in order.
    pub waves: Vec<WaveDefinition>,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EncounterConfig {
    /// The standard three-wave encounter.
    pub fn new() -> Self {
        Self {
            grid: GridBounds::default(),
            seed: None,
            autopilot: false,
            delays: SchedulerDelays::default(),
            effects: EffectTiming::default(),
            party_row: 3,
            waves: default_waves(),
        }
    }

    /// Fix the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enable or disable autopilot.
    pub fn with_autopilot(mut self, autopilot: bool) -> Self {
        self.autopilot = autopilot;
        self
    }

    /// Set the board size.
    pub fn with_grid(mut self, width: i32, height: i32) -> Self {
        self.grid = GridBounds::new(width, height);
        self
    }

    /// Set the scheduler delays.
    pub fn with_delays(mut self, delays: SchedulerDelays) -> Self {
        self.delays = delays;
        self
    }

    /// Set effect timing.
    pub fn with_effect_timing(mut self, timing: EffectTiming) -> Self {
        self.effects = timing;
        self
    }

    /// Replace the wave table.
    pub fn with_waves(mut self, waves: Vec<WaveDefinition>) -> Self {
        self.waves = waves;
        self
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check that the wave table fits on the board.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.waves.is_empty() {
            return Err(ConfigError::Invalid("at least one wave is required".into()));
        }
        if !(0..self.grid.height).contains(&self.party_row) || self.grid.width < 5 {
            return Err(ConfigError::Invalid(format!(
                "party row {} does not fit a {}x{} grid",
                self.party_row, self.grid.width, self.grid.height
            )));
        }
        for (i, wave) in self.waves.iter().enumerate() {
            if wave.spawns.is_empty() {
                return Err(ConfigError::Invalid(format!("wave {} has no enemies", i + 1)));
            }
            if let Some(spawn) = wave.spawns.iter().find(|s| !self.grid.contains(s.position)) {
                return Err(ConfigError::Invalid(format!(
                    "wave {} spawns a {} off the board at {}",
                    i + 1,
                    spawn.kind,
                    spawn.position
                )));
            }
        }
        Ok(())
    }
}
