//! The encounter root object and its intent API.
//!
//! An [`Encounter`] owns every piece of mutable state: the roster, the wave
//! controller, the combat log, the effect registry and the dice. Callers
//! drive it with two methods:
//!
//! - [`Encounter::handle`] applies a human [`Intent`], or rejects it with no
//!   state change.
//! - [`Encounter::tick`] advances the clock by one tick and fires at most one
//!   scheduled transition (see [`crate::scheduler`]).

use crate::actions::{self, Ability, AvailableAction};
use crate::character::{Character, CharacterId, Roster, Upgrade};
use crate::class_data::ArchetypeKind;
use crate::combat::CombatContext;
use crate::config::EncounterConfig;
use crate::dice::{DiceRoller, RngRoller};
use crate::effects::EffectRegistry;
use crate::error::{ActionError, IntentError};
use crate::grid::GridPosition;
use crate::log::CombatLog;
use crate::rules;
use crate::scheduler::{Phase, Resume, Scheduled, Tick, TurnSlot};
use crate::waves::WaveController;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Something the human player asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    SelectClass(ArchetypeKind),
    SelectCharacter(CharacterId),
    SelectTarget(CharacterId),
    Invoke(Ability),
    MoveTo(GridPosition),
    EndTurn,
    ApplyUpgrade(Upgrade),
    ConfirmWave,
    Restart,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::SelectClass(_) => "select class",
            Intent::SelectCharacter(_) => "select character",
            Intent::SelectTarget(_) => "select target",
            Intent::Invoke(_) => "invoke",
            Intent::MoveTo(_) => "move",
            Intent::EndTurn => "end turn",
            Intent::ApplyUpgrade(_) => "upgrade",
            Intent::ConfirmWave => "confirm wave",
            Intent::Restart => "restart",
        }
    }
}

/// A complete multi-wave encounter.
pub struct Encounter {
    pub(crate) config: EncounterConfig,
    pub(crate) roster: Roster,
    pub(crate) party: Vec<CharacterId>,
    pub(crate) waves: WaveController,
    pub(crate) log: CombatLog,
    pub(crate) effects: EffectRegistry,
    pub(crate) roller: Box<dyn DiceRoller>,
    pub(crate) phase: Phase,
    pub(crate) pending: Option<Scheduled>,
    pub(crate) now: Tick,
    pub(crate) round: u32,
    pub(crate) human: Option<CharacterId>,
    pub(crate) selected: Option<CharacterId>,
    pub(crate) target: Option<CharacterId>,
}

impl Encounter {
    /// Create an encounter waiting for a class choice.
    ///
    /// Dice come from a `StdRng` seeded with `config.seed`, or from entropy.
    pub fn new(config: EncounterConfig) -> Self {
        let roller: Box<dyn DiceRoller> = match config.seed {
            Some(seed) => Box::new(RngRoller::seeded(seed)),
            None => Box::new(RngRoller::new(StdRng::from_entropy())),
        };
        Self::with_roller(config, roller)
    }

    /// Create an encounter that rolls with `roller`.
    pub fn with_roller(config: EncounterConfig, roller: Box<dyn DiceRoller>) -> Self {
        Self {
            waves: WaveController::new(config.waves.clone()),
            effects: EffectRegistry::new(config.effects),
            config,
            roster: Roster::new(),
            party: Vec::new(),
            log: CombatLog::new(),
            roller,
            phase: Phase::ClassSelect,
            pending: None,
            now: 0,
            round: 0,
            human: None,
            selected: None,
            target: None,
        }
    }

    /// Replace the dice used from now on.
    pub fn set_roller(&mut self, roller: Box<dyn DiceRoller>) {
        self.roller = roller;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn config(&self) -> &EncounterConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    /// Full rounds started in the current wave, starting at 1.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn pending(&self) -> Option<Scheduled> {
        self.pending
    }

    /// Whether human input is locked out by an outstanding deadline.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Victory | Phase::Defeat)
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Party members in turn order.
    pub fn party(&self) -> impl Iterator<Item = &Character> {
        self.party.iter().filter_map(|id| self.roster.get(*id))
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.roster.get(id)
    }

    /// Find a character by name, case-insensitively.
    pub fn find_by_name(&self, name: &str) -> Option<&Character> {
        self.roster
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
    }

    /// The character the player controls, if any.
    pub fn human(&self) -> Option<CharacterId> {
        self.human
    }

    pub fn wave_number(&self) -> usize {
        self.waves.number()
    }

    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    /// Enemies of the wave on the field.
    pub fn current_enemies(&self) -> impl Iterator<Item = &Character> {
        self.waves
            .current_enemies()
            .iter()
            .filter_map(|id| self.roster.get(*id))
    }

    pub fn log(&self) -> &CombatLog {
        &self.log
    }

    pub fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut EffectRegistry {
        &mut self.effects
    }

    pub fn selected_character(&self) -> Option<CharacterId> {
        self.selected
    }

    pub fn selected_target(&self) -> Option<CharacterId> {
        self.target
    }

    /// The character whose turn it is.
    pub fn current_actor(&self) -> Option<&Character> {
        self.current_actor_id().and_then(|id| self.roster.get(id))
    }

    /// Whether the current turn is waiting on the player.
    pub fn is_human_turn(&self) -> bool {
        self.current_actor_id()
            .is_some_and(|id| !self.is_ai_controlled(id))
    }

    /// The action menu for the player's character, against the selected target.
    pub fn available_actions(&self) -> Vec<AvailableAction> {
        if !self.is_human_turn() {
            return Vec::new();
        }
        let Some(actor) = self.current_actor() else {
            return Vec::new();
        };
        let target = self.target.and_then(|id| self.roster.get(id));
        actions::available_actions(actor, target)
    }

    /// Legal Stride destinations for the player's character.
    pub fn valid_moves(&self) -> Vec<GridPosition> {
        if !self.is_human_turn() {
            return Vec::new();
        }
        self.current_actor()
            .filter(|c| c.actions_left > 0)
            .map(|c| c.valid_moves(&self.roster, self.config.grid))
            .unwrap_or_default()
    }

    // ========================================================================
    // Intents
    // ========================================================================

    /// Apply a human intent.
    ///
    /// Rejected intents leave the encounter untouched, except that a failed
    /// action attempt writes its reason to the combat log.
    pub fn handle(&mut self, intent: Intent) -> Result<(), IntentError> {
        tracing::debug!(?intent, phase = self.phase.name(), "intent");
        match intent {
            Intent::Restart => {
                self.restart();
                Ok(())
            }
            Intent::SelectClass(kind) => {
                self.expect_phase(intent, matches!(self.phase, Phase::ClassSelect))?;
                self.start(kind);
                Ok(())
            }
            Intent::SelectCharacter(id) => {
                let actor = self.expect_human_turn(intent)?;
                if self.roster.get(id).is_none() {
                    return Err(IntentError::UnknownCharacter);
                }
                if id != actor {
                    return Err(IntentError::NotYourTurn);
                }
                self.selected = Some(id);
                Ok(())
            }
            Intent::SelectTarget(id) => {
                self.expect_human_turn(intent)?;
                match self.roster.get(id) {
                    Some(c) if c.is_active() => {
                        self.target = Some(id);
                        Ok(())
                    }
                    _ => Err(IntentError::UnknownCharacter),
                }
            }
            Intent::EndTurn | Intent::Invoke(Ability::EndTurn) => {
                let actor = self.expect_human_turn(intent)?;
                if let Some(c) = self.roster.get(actor) {
                    self.log.push(format!("{} ends their turn.", c.name));
                }
                self.end_turn();
                Ok(())
            }
            Intent::Invoke(Ability::Stride) => {
                self.expect_human_turn(intent)?;
                Err(self.reject(ActionError::NoTarget { ability: "Stride" }))
            }
            Intent::Invoke(ability) => {
                let actor = self.expect_human_turn(intent)?;
                self.player_action(actor, ability)
            }
            Intent::MoveTo(dest) => {
                let actor = self.expect_human_turn(intent)?;
                self.player_move(actor, dest)
            }
            Intent::ApplyUpgrade(upgrade) => {
                let Phase::Upgrade { member } = self.phase else {
                    return Err(self.wrong_phase(intent));
                };
                if self.pending.is_some() {
                    return Err(IntentError::Busy);
                }
                self.apply_upgrade(member, upgrade);
                Ok(())
            }
            Intent::ConfirmWave => {
                self.expect_phase(intent, matches!(self.phase, Phase::WaveConfirm))?;
                if self.pending.is_some() {
                    return Err(IntentError::Busy);
                }
                self.start_wave();
                Ok(())
            }
        }
    }

    fn wrong_phase(&self, intent: Intent) -> IntentError {
        IntentError::WrongPhase {
            intent: intent.name(),
            phase: self.phase.name(),
        }
    }

    fn expect_phase(&self, intent: Intent, ok: bool) -> Result<(), IntentError> {
        if ok {
            Ok(())
        } else {
            Err(self.wrong_phase(intent))
        }
    }

    /// The player's actor, if it is their turn and input is open.
    fn expect_human_turn(&self, intent: Intent) -> Result<CharacterId, IntentError> {
        if !matches!(self.phase, Phase::Combat(_)) {
            return Err(self.wrong_phase(intent));
        }
        if self.pending.is_some() {
            return Err(IntentError::Busy);
        }
        match self.current_actor_id() {
            Some(id) if !self.is_ai_controlled(id) => Ok(id),
            _ => Err(IntentError::NotYourTurn),
        }
    }

    /// Log a failed action attempt and wrap it for the caller.
    fn reject(&mut self, error: ActionError) -> IntentError {
        self.log.push(error.to_string());
        IntentError::Action(error)
    }

    fn player_action(&mut self, actor: CharacterId, ability: Ability) -> Result<(), IntentError> {
        let target = match ability {
            Ability::LesserHeal { actions: 3 } => None,
            _ => self.target,
        };
        let mut ctx = CombatContext::new(self.roller.as_mut(), &mut self.log, &mut self.effects);
        let result = rules::resolve(&mut self.roster, actor, ability, target, &mut ctx);
        let outcome = result.map_err(|e| self.reject(e))?;
        tracing::debug!(?ability, ?outcome, "player action");
        self.after_player_action(actor, self.config.delays.player_action, 0);
        Ok(())
    }

    fn player_move(&mut self, actor: CharacterId, dest: GridPosition) -> Result<(), IntentError> {
        let mut ctx = CombatContext::new(self.roller.as_mut(), &mut self.log, &mut self.effects);
        let result = rules::stride(&mut self.roster, actor, dest, self.config.grid, &mut ctx);
        result.map_err(|e| self.reject(e))?;
        let delays = self.config.delays;
        self.after_player_action(actor, delays.player_move, delays.turn_end_after_move);
        Ok(())
    }

    /// Completion checks, then lock input until the delay passes.
    fn after_player_action(&mut self, actor: CharacterId, delay: u64, end_extra: u64) {
        if self.target.is_some_and(|id| !self.roster.get(id).is_some_and(|c| c.is_active())) {
            self.target = None;
        }
        if self.check_outcome() {
            return;
        }
        let spent = self.roster.get(actor).map_or(true, |c| c.actions_left == 0);
        if spent {
            self.schedule(delay + end_extra, Resume::EndTurn);
        } else {
            self.schedule(delay, Resume::Input);
        }
    }

    /// Throw everything away and go back to class selection.
    pub fn restart(&mut self) {
        tracing::info!("encounter restarted");
        self.roster = Roster::new();
        self.party.clear();
        self.waves = WaveController::new(self.config.waves.clone());
        self.log.clear();
        self.effects.clear();
        self.pending = None;
        self.phase = Phase::ClassSelect;
        self.round = 0;
        self.human = None;
        self.selected = None;
        self.target = None;
    }

    /// Build the party around the chosen class and deploy the first wave.
    fn start(&mut self, kind: ArchetypeKind) {
        let order = std::iter::once(kind).chain(ArchetypeKind::ALL.into_iter().filter(|k| *k != kind));
        self.party = order.map(|k| self.roster.push(Character::hero(k))).collect();
        self.human = if self.config.autopilot {
            None
        } else {
            self.party.first().copied()
        };
        self.waves.populate(&mut self.roster);
        tracing::info!(class = %kind, autopilot = self.config.autopilot, "encounter started");
        self.start_wave();
    }

    pub(crate) fn current_actor_id(&self) -> Option<CharacterId> {
        match self.phase {
            Phase::Combat(TurnSlot::Party(i)) => self.party.get(i).copied(),
            Phase::Combat(TurnSlot::Enemy(j)) => self.waves.current_enemies().get(j).copied(),
            _ => None,
        }
    }

    pub(crate) fn is_ai_controlled(&self, id: CharacterId) -> bool {
        self.human != Some(id)
    }
}
