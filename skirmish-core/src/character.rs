//! Characters and the roster that holds them.
//!
//! A [`Character`] is either a party hero or an enemy. Archetype-specific
//! state lives in the [`Archetype`] variant; everything else (hit points,
//! armor, movement, conditions) is shared.

use crate::class_data::{ArchetypeKind, EnemyKind};
use crate::conditions::{Condition, ConditionLedger};
use crate::dice::DiceExpression;
use crate::error::ActionError;
use crate::grid::{GridBounds, GridPosition, Placement, FEET_PER_SQUARE};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Actions every character gets at the start of its turn.
pub const ACTIONS_PER_TURN: u8 = 3;
/// Potions every character starts with.
pub const STARTING_POTIONS: u32 = 3;
/// HP restored by one potion.
pub const POTION_HEALING: i32 = 15;

/// Unique identifier for a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub Uuid);

impl CharacterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which team a character fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Party,
    Enemy,
}

// ============================================================================
// Hit Points
// ============================================================================

/// Hit points, always within `[0, maximum]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HitPoints {
    current: i32,
    maximum: i32,
}

impl HitPoints {
    pub fn new(maximum: i32) -> Self {
        let maximum = maximum.max(1);
        Self {
            current: maximum,
            maximum,
        }
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn maximum(&self) -> i32 {
        self.maximum
    }

    /// Set current HP, clamped into range.
    pub fn set(&mut self, value: i32) {
        self.current = value.clamp(0, self.maximum);
    }

    pub fn take_damage(&mut self, amount: i32) -> DamageResult {
        let old = self.current;
        self.set(old - amount.max(0));
        DamageResult {
            damage_taken: old - self.current,
            dropped_to_zero: old > 0 && self.current == 0,
        }
    }

    /// Heal up to the maximum and return the HP actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let old = self.current;
        self.set(old + amount.max(0));
        self.current - old
    }

    /// Raise both maximum and current HP.
    pub fn raise_maximum(&mut self, amount: i32) {
        self.maximum = (self.maximum + amount).max(1);
        self.set(self.current + amount);
    }

    pub fn missing(&self) -> i32 {
        self.maximum - self.current
    }

    pub fn is_zero(&self) -> bool {
        self.current == 0
    }

    pub fn ratio(&self) -> f32 {
        self.current as f32 / self.maximum as f32
    }
}

impl fmt::Display for HitPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current, self.maximum)
    }
}

/// Result of taking damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageResult {
    pub damage_taken: i32,
    pub dropped_to_zero: bool,
}

// ============================================================================
// Archetypes and Upgrades
// ============================================================================

/// Archetype with its per-archetype combat state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Archetype {
    Fighter { shield_raised: bool },
    Rogue,
    Wizard { shield_up: bool },
    Cleric,
    Enemy { kind: EnemyKind, damage: DiceExpression },
}

impl Archetype {
    pub fn for_kind(kind: ArchetypeKind) -> Self {
        match kind {
            ArchetypeKind::Fighter => Archetype::Fighter {
                shield_raised: false,
            },
            ArchetypeKind::Rogue => Archetype::Rogue,
            ArchetypeKind::Wizard => Archetype::Wizard { shield_up: false },
            ArchetypeKind::Cleric => Archetype::Cleric,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Archetype::Fighter { .. } => "Fighter",
            Archetype::Rogue => "Rogue",
            Archetype::Wizard { .. } => "Wizard",
            Archetype::Cleric => "Cleric",
            Archetype::Enemy { kind, .. } => kind.name(),
        }
    }

    /// The playable archetype, if this is a hero.
    pub fn kind(&self) -> Option<ArchetypeKind> {
        match self {
            Archetype::Fighter { .. } => Some(ArchetypeKind::Fighter),
            Archetype::Rogue => Some(ArchetypeKind::Rogue),
            Archetype::Wizard { .. } => Some(ArchetypeKind::Wizard),
            Archetype::Cleric => Some(ArchetypeKind::Cleric),
            Archetype::Enemy { .. } => None,
        }
    }
}

/// Permanent improvement chosen between waves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Upgrade {
    Accuracy,
    Damage,
    Speed,
    Vitality,
}

impl Upgrade {
    pub const ALL: [Upgrade; 4] = [
        Upgrade::Accuracy,
        Upgrade::Damage,
        Upgrade::Speed,
        Upgrade::Vitality,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Upgrade::Accuracy => "Accuracy",
            Upgrade::Damage => "Damage",
            Upgrade::Speed => "Speed",
            Upgrade::Vitality => "Vitality",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Upgrade::Accuracy => "+1 to attack rolls",
            Upgrade::Damage => "+2 damage on hits",
            Upgrade::Speed => "+10 feet of movement",
            Upgrade::Vitality => "+10 maximum HP",
        }
    }
}

impl fmt::Display for Upgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Upgrade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Upgrade::ALL
            .into_iter()
            .find(|u| u.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown upgrade '{s}'"))
    }
}

// ============================================================================
// Character
// ============================================================================

/// A combatant on the grid.
#[derive(Debug, Clone, Serialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub archetype: Archetype,
    pub side: Side,
    pub hp: HitPoints,
    pub base_ac: i32,
    pub attack_bonus: i32,
    /// Flat damage added to every hit, from upgrades.
    pub bonus_damage: i32,
    /// Feet per Stride.
    pub speed: i32,
    pub potions: u32,
    pub placement: Placement,
    pub off_guard: bool,
    pub actions_left: u8,
    pub conditions: ConditionLedger,
}

impl Character {
    /// A fresh party hero with the archetype's default name.
    pub fn hero(kind: ArchetypeKind) -> Self {
        let data = kind.data();
        Self {
            id: CharacterId::new(),
            name: data.default_name.to_string(),
            archetype: Archetype::for_kind(kind),
            side: Side::Party,
            hp: HitPoints::new(data.max_hp),
            base_ac: data.base_ac,
            attack_bonus: data.attack_bonus,
            bonus_damage: 0,
            speed: data.speed,
            potions: STARTING_POTIONS,
            placement: Placement::NotDeployed,
            off_guard: false,
            actions_left: 0,
            conditions: ConditionLedger::new(),
        }
    }

    /// A fresh enemy of the given kind.
    pub fn enemy(kind: EnemyKind, name: impl Into<String>) -> Self {
        let data = kind.data();
        Self {
            id: CharacterId::new(),
            name: name.into(),
            archetype: Archetype::Enemy {
                kind,
                damage: data.damage,
            },
            side: Side::Enemy,
            hp: HitPoints::new(data.max_hp),
            base_ac: data.base_ac,
            attack_bonus: data.attack_bonus,
            bonus_damage: 0,
            speed: data.speed,
            potions: STARTING_POTIONS,
            placement: Placement::NotDeployed,
            off_guard: false,
            actions_left: 0,
            conditions: ConditionLedger::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn at(mut self, pos: GridPosition) -> Self {
        self.placement = Placement::Deployed(pos);
        self
    }

    pub fn with_hp(mut self, current: i32) -> Self {
        self.hp.set(current);
        self
    }

    /// Override an enemy's damage dice. No effect on heroes.
    pub fn with_damage(mut self, dice: DiceExpression) -> Self {
        if let Archetype::Enemy { damage, .. } = &mut self.archetype {
            *damage = dice;
        }
        self
    }

    pub fn is_alive(&self) -> bool {
        !self.hp.is_zero()
    }

    pub fn is_enemy(&self) -> bool {
        self.side == Side::Enemy
    }

    pub fn position(&self) -> Option<GridPosition> {
        self.placement.position()
    }

    /// Distance to another character, or `None` if either is off the grid.
    pub fn distance_to(&self, other: &Character) -> Option<i32> {
        Some(self.position()?.distance_to(other.position()?))
    }

    /// Alive and standing on the grid.
    pub fn is_active(&self) -> bool {
        self.is_alive() && self.placement.is_deployed()
    }

    pub fn shield_raised(&self) -> bool {
        matches!(self.archetype, Archetype::Fighter { shield_raised: true })
    }

    pub fn shield_spell_up(&self) -> bool {
        matches!(self.archetype, Archetype::Wizard { shield_up: true })
    }

    pub fn has_sanctuary(&self) -> bool {
        self.conditions.has(Condition::Sanctuary)
    }

    /// Effective armor class, computed from current state.
    pub fn ac(&self) -> i32 {
        let mut ac = self.base_ac;
        if self.off_guard {
            ac -= 2;
        }
        if self.shield_raised() {
            ac += 2;
        }
        if self.shield_spell_up() {
            ac += 2;
        }
        ac
    }

    pub fn take_damage(&mut self, amount: i32) -> DamageResult {
        self.hp.take_damage(amount)
    }

    pub fn heal(&mut self, amount: i32) -> i32 {
        self.hp.heal(amount)
    }

    /// Reset per-turn state at the start of this character's turn.
    pub fn begin_turn(&mut self) {
        self.actions_left = ACTIONS_PER_TURN;
        self.off_guard = false;
    }

    /// Drop self-buffs that last until the round ends.
    ///
    /// Returns a log line for each buff that was active.
    pub fn expire_round_buffs(&mut self) -> Vec<String> {
        let mut messages = Vec::new();
        match &mut self.archetype {
            Archetype::Fighter { shield_raised } if *shield_raised => {
                *shield_raised = false;
                messages.push(format!("{} lowers their shield", self.name));
            }
            Archetype::Wizard { shield_up } if *shield_up => {
                *shield_up = false;
                messages.push(format!("{}'s Shield spell fades", self.name));
            }
            _ => {}
        }
        messages
    }

    pub fn apply_upgrade(&mut self, upgrade: Upgrade) {
        match upgrade {
            Upgrade::Accuracy => self.attack_bonus += 1,
            Upgrade::Damage => self.bonus_damage += 2,
            Upgrade::Speed => self.speed += 10,
            Upgrade::Vitality => self.hp.raise_maximum(10),
        }
    }

    /// Squares this character may Stride across in one action.
    pub fn move_radius(&self) -> i32 {
        self.speed / FEET_PER_SQUARE
    }

    /// Validate a Stride destination.
    pub fn check_move(
        &self,
        dest: GridPosition,
        roster: &Roster,
        bounds: GridBounds,
    ) -> Result<(), ActionError> {
        let Some(from) = self.position() else {
            return Err(ActionError::InvalidMove(dest));
        };
        if !bounds.contains(dest) {
            return Err(ActionError::InvalidMove(dest));
        }
        if roster
            .occupant(dest)
            .is_some_and(|other| other.id != self.id)
        {
            return Err(ActionError::InvalidMove(dest));
        }
        if from.distance_to(dest) * FEET_PER_SQUARE > self.speed {
            return Err(ActionError::InvalidMove(dest));
        }
        Ok(())
    }

    pub fn can_move_to(&self, dest: GridPosition, roster: &Roster, bounds: GridBounds) -> bool {
        self.check_move(dest, roster, bounds).is_ok()
    }

    /// Every legal Stride destination other than the current square.
    pub fn valid_moves(&self, roster: &Roster, bounds: GridBounds) -> Vec<GridPosition> {
        let Some(from) = self.position() else {
            return Vec::new();
        };
        bounds
            .squares_within(from, self.move_radius())
            .into_iter()
            .filter(|pos| *pos != from && self.can_move_to(*pos, roster, bounds))
            .collect()
    }

    /// Whether an ally stands directly opposite this character across `target`.
    ///
    /// The ally must be alive, on our side, adjacent to the target, and the
    /// target must be the exact midpoint of the line between us: a shared
    /// row, a shared column, or a diagonal.
    pub fn is_flanking(&self, target: &Character, roster: &Roster) -> bool {
        let (Some(me), Some(t)) = (self.position(), target.position()) else {
            return false;
        };
        if me == t || !me.is_adjacent(t) {
            return false;
        }
        roster.iter().any(|ally| {
            ally.id != self.id
                && ally.id != target.id
                && ally.side == self.side
                && ally.is_alive()
                && ally.position().is_some_and(|b| {
                    b.is_adjacent(t) && me.x + b.x == 2 * t.x && me.y + b.y == 2 * t.y
                })
        })
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) HP {} AC {}",
            self.name,
            self.archetype.name(),
            self.hp,
            self.ac()
        )
    }
}

// ============================================================================
// Roster
// ============================================================================

/// Every character in the encounter, in creation order.
///
/// Fallen characters stay in the roster; they just stop blocking squares
/// and being valid targets.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Roster {
    characters: Vec<Character>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, character: Character) -> CharacterId {
        let id = character.id;
        self.characters.push(character);
        id
    }

    pub fn get(&self, id: CharacterId) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.id == id)
    }

    fn index_of(&self, id: CharacterId) -> Option<usize> {
        self.characters.iter().position(|c| c.id == id)
    }

    /// Borrow two distinct characters mutably.
    pub fn pair_mut(
        &mut self,
        a: CharacterId,
        b: CharacterId,
    ) -> Option<(&mut Character, &mut Character)> {
        let ia = self.index_of(a)?;
        let ib = self.index_of(b)?;
        if ia == ib {
            return None;
        }
        if ia < ib {
            let (left, right) = self.characters.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.characters.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Character> {
        self.characters.iter_mut()
    }

    /// Party members in roster order.
    pub fn party(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter().filter(|c| c.side == Side::Party)
    }

    pub fn party_ids(&self) -> Vec<CharacterId> {
        self.party().map(|c| c.id).collect()
    }

    pub fn living_party(&self) -> impl Iterator<Item = &Character> {
        self.party().filter(|c| c.is_alive())
    }

    /// The living character standing on `pos`, if any.
    pub fn occupant(&self, pos: GridPosition) -> Option<&Character> {
        self.characters
            .iter()
            .find(|c| c.is_active() && c.position() == Some(pos))
    }

    /// Stride a character to `dest`, validating first.
    pub fn move_character(
        &mut self,
        id: CharacterId,
        dest: GridPosition,
        bounds: GridBounds,
    ) -> Result<(), ActionError> {
        let mover = self.get(id).ok_or(ActionError::InvalidMove(dest))?;
        mover.check_move(dest, self, bounds)?;
        if let Some(mover) = self.get_mut(id) {
            mover.placement = Placement::Deployed(dest);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}
