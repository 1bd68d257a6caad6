//! Turn sequencing.
//!
//! The scheduler is a phase enum plus a single pending deadline. Every
//! [`Encounter::tick`] advances the clock, ages effects, and if the deadline
//! has passed fires exactly one [`Resume`] transition. AI characters act one
//! decision per transition, so the ability's effects play out before the
//! next decision is made.

use crate::ai::{self, Decision};
use crate::character::{CharacterId, Upgrade};
use crate::combat::CombatContext;
use crate::encounter::Encounter;
use crate::grid::{GridPosition, Placement};
use crate::rules::{self, ActionOutcome};
use serde::{Deserialize, Serialize};

/// Scheduler clock unit. Sixty ticks make one second.
pub type Tick = u64;

pub const TICKS_PER_SECOND: Tick = 60;

/// Whose turn it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnSlot {
    /// Index into the party, in turn order.
    Party(usize),
    /// Index into the current wave's enemies.
    Enemy(usize),
}

/// Where the encounter is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    ClassSelect,
    Combat(TurnSlot),
    /// The wave-complete pause before upgrades or victory.
    VictoryPause,
    /// Waiting for the upgrade of the party member at this index.
    Upgrade { member: usize },
    WaveConfirm,
    Victory,
    Defeat,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::ClassSelect => "class select",
            Phase::Combat(_) => "combat",
            Phase::VictoryPause => "victory pause",
            Phase::Upgrade { .. } => "upgrade",
            Phase::WaveConfirm => "wave confirm",
            Phase::Victory => "victory",
            Phase::Defeat => "defeat",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Victory | Phase::Defeat)
    }
}

/// What happens when the pending deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resume {
    /// Reopen human input.
    Input,
    /// Let the AI make its next choice.
    Decide,
    /// Hand the turn to the next character.
    EndTurn,
    /// Leave the wave-complete pause.
    FinishVictoryPause,
}

/// The one outstanding transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheduled {
    pub at: Tick,
    pub resume: Resume,
}

impl Encounter {
    /// Advance the clock by one tick.
    pub fn tick(&mut self) {
        self.now += 1;
        self.effects.tick();
        match self.pending {
            Some(scheduled) if self.now >= scheduled.at => {
                self.pending = None;
                self.fire(scheduled.resume);
            }
            _ => {}
        }
    }

    /// Tick until nothing is pending or `limit` ticks pass.
    ///
    /// Returns the number of ticks advanced.
    pub fn advance_until_idle(&mut self, limit: Tick) -> Tick {
        let start = self.now;
        while self.pending.is_some() && self.now - start < limit {
            self.tick();
        }
        self.now - start
    }

    pub(crate) fn schedule(&mut self, delay: Tick, resume: Resume) {
        let at = self.now + delay;
        tracing::debug!(now = self.now, at, ?resume, "scheduled");
        self.pending = Some(Scheduled { at, resume });
    }

    fn fire(&mut self, resume: Resume) {
        tracing::debug!(now = self.now, ?resume, phase = self.phase.name(), "fire");
        match resume {
            Resume::Input => {}
            Resume::Decide => self.decide(),
            Resume::EndTurn => self.end_turn(),
            Resume::FinishVictoryPause => self.finish_victory_pause(),
        }
    }

    // ========================================================================
    // Turns
    // ========================================================================

    fn begin_turn(&mut self, slot: TurnSlot) {
        self.phase = Phase::Combat(slot);
        self.selected = None;
        self.target = None;
        let Some(id) = self.current_actor_id() else {
            return;
        };
        if let Some(actor) = self.roster.get_mut(id) {
            actor.begin_turn();
            self.log.push(format!("{}'s turn!", actor.name));
        }
        if self.is_ai_controlled(id) {
            self.schedule(0, Resume::Decide);
        } else {
            self.selected = Some(id);
        }
    }

    /// End the current actor's turn and start the next one.
    pub(crate) fn end_turn(&mut self) {
        let Phase::Combat(slot) = self.phase else {
            return;
        };
        self.pending = None;
        if let Some(actor) = self.current_actor_id().and_then(|id| self.roster.get_mut(id)) {
            actor.actions_left = 0;
        }

        let next = match slot {
            TurnSlot::Party(i) => self
                .next_living_party(i + 1)
                .map(TurnSlot::Party)
                .or_else(|| self.next_living_enemy(0).map(TurnSlot::Enemy)),
            TurnSlot::Enemy(j) => self.next_living_enemy(j + 1).map(TurnSlot::Enemy),
        };
        match next {
            Some(slot) => self.begin_turn(slot),
            None => self.end_round(),
        }
    }

    fn next_living_party(&self, from: usize) -> Option<usize> {
        (from..self.party.len()).find(|i| {
            self.party
                .get(*i)
                .and_then(|id| self.roster.get(*id))
                .is_some_and(|c| c.is_alive())
        })
    }

    fn next_living_enemy(&self, from: usize) -> Option<usize> {
        let enemies = self.waves.current_enemies();
        (from..enemies.len()).find(|j| self.roster.get(enemies[*j]).is_some_and(|c| c.is_active()))
    }

    /// Tick conditions, drop round buffs, and hand the turn back to the party.
    fn end_round(&mut self) {
        let mut lines = Vec::new();
        for character in self.roster.iter_mut().filter(|c| c.is_active()) {
            for condition in character.conditions.tick() {
                lines.push(format!("{}'s {condition} condition expires.", character.name));
            }
            lines.extend(character.expire_round_buffs());
        }
        for line in lines {
            self.log.push(line);
        }
        self.round += 1;
        tracing::info!(round = self.round, wave = self.waves.number(), "round started");

        match self.next_living_party(0) {
            Some(i) => self.begin_turn(TurnSlot::Party(i)),
            None => self.defeat(),
        }
    }

    /// One AI step: upgrades and confirmation under autopilot, otherwise the
    /// current actor's next action.
    fn decide(&mut self) {
        match self.phase {
            Phase::Upgrade { member } => {
                let upgrade = self
                    .party
                    .get(member)
                    .and_then(|id| self.roster.get(*id))
                    .map_or(Upgrade::Vitality, ai::choose_upgrade);
                self.apply_upgrade(member, upgrade);
            }
            Phase::WaveConfirm => self.start_wave(),
            Phase::Combat(_) => self.decide_action(),
            _ => {}
        }
    }

    fn decide_action(&mut self) {
        let Some(actor) = self.current_actor_id() else {
            return;
        };
        let decision = ai::decide(&self.roster, actor, self.config.grid);
        let result = match decision {
            Decision::EndTurn => {
                self.end_turn();
                return;
            }
            Decision::Act { ability, target } => {
                let mut ctx = CombatContext::new(self.roller.as_mut(), &mut self.log, &mut self.effects);
                rules::resolve(&mut self.roster, actor, ability, target, &mut ctx)
            }
            Decision::Stride(dest) => {
                let mut ctx = CombatContext::new(self.roller.as_mut(), &mut self.log, &mut self.effects);
                rules::stride(&mut self.roster, actor, dest, self.config.grid, &mut ctx)
            }
        };

        match result {
            Ok(ActionOutcome { actions_used, .. }) if actions_used > 0 => {
                if !self.check_outcome() {
                    self.schedule(self.config.delays.ai_action, Resume::Decide);
                }
            }
            Ok(_) => self.end_turn(),
            Err(error) => {
                self.log.push(error.to_string());
                self.end_turn();
            }
        }
    }

    // ========================================================================
    // Waves
    // ========================================================================

    /// Defeat first, then wave completion. Returns true if combat stopped.
    pub(crate) fn check_outcome(&mut self) -> bool {
        if !self.party.is_empty() && self.next_living_party(0).is_none() {
            self.defeat();
            return true;
        }
        self.check_wave_complete()
    }

    /// If every enemy of the wave is down, stop combat and start the pause.
    pub fn check_wave_complete(&mut self) -> bool {
        if !matches!(self.phase, Phase::Combat(_)) || !self.waves.is_complete(&self.roster) {
            return false;
        }
        for character in self.roster.iter_mut() {
            character.actions_left = 0;
        }
        self.pending = None;
        self.target = None;
        self.selected = None;
        if !self.waves.is_last() {
            self.log.push("Wave complete! Time to rest and upgrade!");
        }
        tracing::info!(wave = self.waves.number(), "wave complete");
        self.phase = Phase::VictoryPause;
        self.schedule(self.config.delays.victory_pause, Resume::FinishVictoryPause);
        true
    }

    fn finish_victory_pause(&mut self) {
        if self.waves.is_last() {
            self.victory();
            return;
        }
        match self.next_living_party(0) {
            Some(member) => self.enter_upgrade(member),
            None => self.defeat(),
        }
    }

    fn enter_upgrade(&mut self, member: usize) {
        self.phase = Phase::Upgrade { member };
        if self.config.autopilot {
            self.schedule(self.config.delays.ai_action, Resume::Decide);
        }
    }

    pub(crate) fn apply_upgrade(&mut self, member: usize, upgrade: Upgrade) {
        if let Some(character) = self.party.get(member).and_then(|id| self.roster.get_mut(*id)) {
            character.apply_upgrade(upgrade);
            self.log.push(format!(
                "{} takes {upgrade}: {}",
                character.name,
                upgrade.description()
            ));
        }
        match self.next_living_party(member + 1) {
            Some(next) => self.enter_upgrade(next),
            None => {
                self.phase = Phase::WaveConfirm;
                if let Some(title) = self.waves.next_title() {
                    self.log.push(format!("Next up: {title}"));
                }
                if self.config.autopilot {
                    self.schedule(self.config.delays.ai_action, Resume::Decide);
                }
            }
        }
    }

    /// Line the party up and deploy the next wave.
    pub(crate) fn start_wave(&mut self) {
        self.pending = None;
        let row = self.config.party_row;
        for (i, id) in self.party.iter().enumerate() {
            if let Some(member) = self.roster.get_mut(*id).filter(|c| c.is_alive()) {
                member.placement = Placement::Deployed(GridPosition::new(i as i32 + 1, row));
                member.off_guard = false;
            }
        }

        let Some(title) = self
            .waves
            .deploy_next(&mut self.roster, self.config.grid)
            .map(|wave| wave.title.clone())
        else {
            self.victory();
            return;
        };
        self.log.push(title);
        self.log.push(format!(
            "--- Wave {}: {} enemies appear! ---",
            self.waves.number(),
            self.waves.current_enemies().len()
        ));
        self.round = 1;

        match self.next_living_party(0) {
            Some(i) => self.begin_turn(TurnSlot::Party(i)),
            None => self.defeat(),
        }
    }

    fn victory(&mut self) {
        self.finish(Phase::Victory, "Victory! All waves have been defeated!");
    }

    fn defeat(&mut self) {
        self.finish(Phase::Defeat, "Game Over - Your party was defeated...");
    }

    fn finish(&mut self, phase: Phase, message: &str) {
        self.phase = phase;
        self.pending = None;
        self.effects.clear();
        self.selected = None;
        self.target = None;
        self.log.push(message);
        tracing::info!(phase = phase.name(), now = self.now, "encounter finished");
    }

    /// Living party member ids, for callers that drive turns directly.
    pub fn living_party_ids(&self) -> Vec<CharacterId> {
        self.party
            .iter()
            .copied()
            .filter(|id| self.roster.get(*id).is_some_and(|c| c.is_alive()))
            .collect()
    }
}
