//! Headless interface for programmatic and text-driven play.
//!
//! This module wraps an [`Encounter`] with a small text command language so
//! it can be driven without a renderer. It's designed for:
//! - Automated testing and scripted sessions
//! - Agents playing over stdin/stdout
//! - Unattended autoplay runs that report a JSON summary
//!
//! # Example
//!
//! ```
//! use skirmish_core::headless::HeadlessGame;
//! use skirmish_core::EncounterConfig;
//!
//! let mut game = HeadlessGame::new(EncounterConfig::new().with_seed(7));
//! game.send("class fighter").unwrap();
//! for line in game.drain_log() {
//!     println!("{line}");
//! }
//! ```

use crate::actions::Ability;
use crate::character::{Archetype, Character, Upgrade};
use crate::class_data::ArchetypeKind;
use crate::config::EncounterConfig;
use crate::encounter::{Encounter, Intent};
use crate::error::IntentError;
use crate::grid::GridPosition;
use crate::scheduler::{Phase, Tick};
use serde::Serialize;
use thiserror::Error;

/// Errors from a text command.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type #help for help.")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Intent(#[from] IntentError),
}

/// Help text for the command language.
pub const COMMAND_HELP: &[(&str, &str)] = &[
    ("class <fighter|rogue|wizard|cleric>", "Choose your class and start"),
    ("select <name>", "Select your character"),
    ("target <name>", "Select a target"),
    ("use <ability>", "Use an ability, e.g. 'use power attack', 'use magic missile 2'"),
    ("move <x> <y>", "Stride to a square"),
    ("end", "End your turn"),
    ("upgrade <accuracy|damage|speed|vitality>", "Upgrade the current party member"),
    ("confirm", "Start the next wave"),
    ("restart", "Start over"),
];

/// Turn a command line into an intent.
///
/// Names are resolved against the encounter's roster.
pub fn parse_command(encounter: &Encounter, line: &str) -> Result<Intent, CommandError> {
    let line = line.trim();
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    match verb.to_ascii_lowercase().as_str() {
        "class" => rest
            .parse::<ArchetypeKind>()
            .map(Intent::SelectClass)
            .map_err(CommandError::Invalid),
        "select" => Ok(Intent::SelectCharacter(named(encounter, rest, "select <name>")?.id)),
        "target" => Ok(Intent::SelectTarget(named(encounter, rest, "target <name>")?.id)),
        "use" => {
            if rest.is_empty() {
                return Err(CommandError::Usage("use <ability>"));
            }
            rest.parse::<Ability>()
                .map(Intent::Invoke)
                .map_err(CommandError::Invalid)
        }
        "move" => {
            let coords: Vec<i32> = rest
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty())
                .map(str::parse)
                .collect::<Result<_, _>>()
                .map_err(|_| CommandError::Usage("move <x> <y>"))?;
            match coords.as_slice() {
                [x, y] => Ok(Intent::MoveTo(GridPosition::new(*x, *y))),
                _ => Err(CommandError::Usage("move <x> <y>")),
            }
        }
        "end" => Ok(Intent::EndTurn),
        "upgrade" => rest
            .parse::<Upgrade>()
            .map(Intent::ApplyUpgrade)
            .map_err(CommandError::Invalid),
        "confirm" => Ok(Intent::ConfirmWave),
        "restart" => Ok(Intent::Restart),
        _ => Err(CommandError::Unknown(verb.to_string())),
    }
}

fn named<'a>(
    encounter: &'a Encounter,
    name: &str,
    usage: &'static str,
) -> Result<&'a Character, CommandError> {
    if name.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    encounter
        .find_by_name(name)
        .ok_or_else(|| CommandError::Invalid(format!("No character named '{name}'")))
}

/// One party member in a summary.
#[derive(Debug, Clone, Serialize)]
pub struct MemberSummary {
    pub name: String,
    pub class: &'static str,
    pub hp: i32,
    pub max_hp: i32,
    pub alive: bool,
    pub attack_bonus: i32,
    pub bonus_damage: i32,
    pub speed: i32,
    pub potions: u32,
}

impl From<&Character> for MemberSummary {
    fn from(c: &Character) -> Self {
        Self {
            name: c.name.clone(),
            class: c.archetype.name(),
            hp: c.hp.current(),
            max_hp: c.hp.maximum(),
            alive: c.is_alive(),
            attack_bonus: c.attack_bonus,
            bonus_damage: c.bonus_damage,
            speed: c.speed,
            potions: c.potions,
        }
    }
}

/// End-of-run report.
#[derive(Debug, Clone, Serialize)]
pub struct EncounterSummary {
    pub phase: Phase,
    pub outcome: &'static str,
    pub wave: usize,
    pub waves: usize,
    pub round: u32,
    pub ticks: Tick,
    pub party: Vec<MemberSummary>,
    pub enemies_remaining: usize,
    pub log_lines: usize,
}

/// An entry in the command transcript.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    /// The command as typed.
    pub command: String,
    /// The parsed intent, if it parsed.
    pub intent: Option<Intent>,
    /// Tick the command arrived on.
    pub tick: Tick,
}

/// An encounter that can be driven by text commands.
pub struct HeadlessGame {
    encounter: Encounter,
    cursor: usize,
    transcript: Vec<TranscriptEntry>,
}

impl HeadlessGame {
    pub fn new(config: EncounterConfig) -> Self {
        Self::from_encounter(Encounter::new(config))
    }

    pub fn from_encounter(encounter: Encounter) -> Self {
        Self {
            encounter,
            cursor: 0,
            transcript: Vec::new(),
        }
    }

    /// Parse and apply one command.
    pub fn send(&mut self, line: &str) -> Result<(), CommandError> {
        let parsed = parse_command(&self.encounter, line);
        self.transcript.push(TranscriptEntry {
            command: line.trim().to_string(),
            intent: parsed.as_ref().ok().copied(),
            tick: self.encounter.now(),
        });
        let intent = parsed?;
        self.encounter.handle(intent)?;
        if intent == Intent::Restart {
            self.cursor = 0;
        }
        Ok(())
    }

    /// Advance one tick.
    pub fn tick(&mut self) {
        self.encounter.tick();
    }

    /// Log lines written since the last call.
    pub fn drain_log(&mut self) -> Vec<String> {
        let log = self.encounter.log();
        if self.cursor > log.len() {
            // The log was cleared by a restart.
            self.cursor = 0;
        }
        let lines = log.since(self.cursor).to_vec();
        self.cursor = log.len();
        lines
    }

    // ========================================================================
    // State Queries
    // ========================================================================

    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    pub fn encounter_mut(&mut self) -> &mut Encounter {
        &mut self.encounter
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn is_finished(&self) -> bool {
        self.encounter.is_finished()
    }

    /// A prompt describing what the encounter is waiting for, if anything.
    pub fn prompt(&self) -> Option<String> {
        let enc = &self.encounter;
        if enc.is_busy() {
            return None;
        }
        match enc.phase() {
            Phase::ClassSelect => Some("Choose a class: fighter, rogue, wizard, cleric".to_string()),
            Phase::Combat(_) if enc.is_human_turn() => {
                let actor = enc.current_actor()?;
                let menu: Vec<String> = enc.available_actions().into_iter().map(|a| a.label).collect();
                Some(format!(
                    "{} ({} actions left): {}",
                    actor.name,
                    actor.actions_left,
                    menu.join(", ")
                ))
            }
            Phase::Upgrade { member } => {
                let name = enc.party().nth(member).map(|c| c.name.clone())?;
                let options: Vec<String> = Upgrade::ALL
                    .iter()
                    .map(|u| format!("{u} ({})", u.description()))
                    .collect();
                Some(format!("Choose {name}'s upgrade: {}", options.join(", ")))
            }
            Phase::WaveConfirm => Some("Type 'confirm' to start the next wave".to_string()),
            _ => None,
        }
    }

    /// Multi-line status report.
    pub fn status(&self) -> Vec<String> {
        let enc = &self.encounter;
        let mut lines = vec![format!(
            "Phase: {} | Wave {}/{} | Round {} | Tick {}",
            enc.phase().name(),
            enc.wave_number(),
            enc.wave_count(),
            enc.round(),
            enc.now()
        )];
        if let Some(actor) = enc.current_actor() {
            lines.push(format!("Turn: {} ({} actions left)", actor.name, actor.actions_left));
        }
        for c in enc.party().chain(enc.current_enemies()) {
            let mut line = format!("  {c}");
            if let Some(pos) = c.position() {
                line.push_str(&format!(" at {pos}"));
            }
            if !c.is_alive() {
                line.push_str(" [fallen]");
            }
            let extras: Vec<String> = c
                .conditions
                .iter()
                .map(|(cond, rounds)| format!("{cond} {rounds}"))
                .chain(match c.archetype {
                    Archetype::Fighter { shield_raised: true } => Some("shield raised".to_string()),
                    Archetype::Wizard { shield_up: true } => Some("Shield spell".to_string()),
                    _ => None,
                })
                .collect();
            if !extras.is_empty() {
                line.push_str(&format!(" ({})", extras.join(", ")));
            }
            lines.push(line);
        }
        lines
    }

    pub fn summary(&self) -> EncounterSummary {
        let enc = &self.encounter;
        let phase = enc.phase();
        EncounterSummary {
            phase,
            outcome: match phase {
                Phase::Victory => "victory",
                Phase::Defeat => "defeat",
                _ => "unfinished",
            },
            wave: enc.wave_number(),
            waves: enc.wave_count(),
            round: enc.round(),
            ticks: enc.now(),
            party: enc.party().map(MemberSummary::from).collect(),
            enemies_remaining: enc.current_enemies().filter(|c| c.is_alive()).count(),
            log_lines: enc.log().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerDelays;
    use crate::testing::ScriptedRoller;

    fn game() -> HeadlessGame {
        let config = EncounterConfig::new().with_delays(SchedulerDelays::instant());
        HeadlessGame::from_encounter(Encounter::with_roller(config, Box::new(ScriptedRoller::default())))
    }

    #[test]
    fn test_parse_commands() {
        let mut game = game();
        let enc = game.encounter();
        assert_eq!(parse_command(enc, "class Rogue"), Ok(Intent::SelectClass(ArchetypeKind::Rogue)));
        assert_eq!(parse_command(enc, "move 3, 4"), Ok(Intent::MoveTo(GridPosition::new(3, 4))));
        assert_eq!(
            parse_command(enc, "use magic missile 2"),
            Ok(Intent::Invoke(Ability::MagicMissile { actions: 2 }))
        );
        assert_eq!(parse_command(enc, "upgrade speed"), Ok(Intent::ApplyUpgrade(Upgrade::Speed)));
        assert_eq!(parse_command(enc, "move 3"), Err(CommandError::Usage("move <x> <y>")));
        assert!(matches!(parse_command(enc, "dance"), Err(CommandError::Unknown(_))));

        game.send("class fighter").unwrap();
        let goblin = game.encounter().find_by_name("Goblin 1").unwrap().id;
        assert_eq!(
            parse_command(game.encounter(), "target goblin 1"),
            Ok(Intent::SelectTarget(goblin))
        );
    }

    #[test]
    fn test_drain_log_is_incremental() {
        let mut game = game();
        game.send("class wizard").unwrap();
        let first = game.drain_log();
        assert!(first.iter().any(|l| l == "Ezren's turn!"));
        assert!(game.drain_log().is_empty());

        game.send("restart").unwrap();
        game.send("class cleric").unwrap();
        let again = game.drain_log();
        assert_eq!(again.first().map(String::as_str), Some("Wave 1: Goblins"));
    }

    #[test]
    fn test_send_reports_intent_errors() {
        let mut game = game();
        let err = game.send("end").unwrap_err();
        assert!(matches!(err, CommandError::Intent(IntentError::WrongPhase { .. })));
        assert_eq!(game.transcript().len(), 1);
    }

    #[test]
    fn test_prompt_and_summary() {
        let mut game = game();
        assert!(game.prompt().unwrap().starts_with("Choose a class"));
        game.send("class fighter").unwrap();
        let prompt = game.prompt().unwrap();
        assert!(prompt.starts_with("Valeros (3 actions left)"));
        assert!(prompt.contains("End Turn [0]"));

        let summary = game.summary();
        assert_eq!(summary.outcome, "unfinished");
        assert_eq!(summary.party.len(), 4);
        assert_eq!(summary.enemies_remaining, 3);
        assert!(game.status()[0].starts_with("Phase: combat | Wave 1/3"));
    }
}
