//! Error types for action resolution and intent handling.

use crate::grid::GridPosition;
use thiserror::Error;

/// A rejected action attempt.
///
/// These are recoverable: the message goes to the combat log and no state
/// changes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("Not enough actions!")]
    NotEnoughActions { needed: u8, left: u8 },

    #[error("{target} has already fallen!")]
    TargetDead { target: String },

    #[error("{target} is out of range for {ability} (range: {range_feet} feet)")]
    OutOfRange {
        target: String,
        ability: &'static str,
        range_feet: i32,
    },

    #[error("{ability} requires a target")]
    NoTarget { ability: &'static str },

    #[error("{target} is not a valid target for {ability}")]
    InvalidTarget {
        target: String,
        ability: &'static str,
    },

    #[error("{0} is already active!")]
    AlreadyActive(String),

    #[error("No potions left!")]
    NoPotions,

    #[error("Cannot move to {0}!")]
    InvalidMove(GridPosition),

    #[error("{0} is not available right now")]
    NotAvailable(String),
}

/// A rejected intent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntentError {
    #[error("{intent} is not allowed during {phase}")]
    WrongPhase {
        intent: &'static str,
        phase: &'static str,
    },

    #[error("It is not that character's turn")]
    NotYourTurn,

    #[error("Waiting for the current action to finish")]
    Busy,

    #[error("Unknown character")]
    UnknownCharacter,

    #[error(transparent)]
    Action(#[from] ActionError),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_error_messages_read_as_log_lines() {
        assert_eq!(
            ActionError::NotEnoughActions { needed: 2, left: 1 }.to_string(),
            "Not enough actions!"
        );
        assert_eq!(
            ActionError::OutOfRange {
                target: "Goblin".into(),
                ability: "Arcane Blast",
                range_feet: 20,
            }
            .to_string(),
            "Goblin is out of range for Arcane Blast (range: 20 feet)"
        );
        assert_eq!(
            ActionError::InvalidMove(GridPosition::new(3, 4)).to_string(),
            "Cannot move to (3, 4)!"
        );
    }

    #[test]
    fn test_intent_error_wraps_action_error() {
        let err: IntentError = ActionError::NoPotions.into();
        assert_eq!(err.to_string(), "No potions left!");
    }
}
