//! Abilities and the per-turn action menu.
//!
//! [`available_actions`] lists what the acting character could do right
//! now. It is a pure query over character state: menu entries are plain
//! data carrying an [`Ability`] tag that the rules module interprets.

use crate::character::{Archetype, Character, CharacterId, Side};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reach of melee attacks and touch spells, in squares.
pub const MELEE_RANGE: i32 = 1;
pub const ARCANE_BLAST_RANGE: i32 = 4;
pub const MAGIC_MISSILE_RANGE: i32 = 24;
pub const SPIRIT_LINK_RANGE: i32 = 6;
pub const SANCTUARY_RANGE: i32 = 1;
/// Range of the two- and three-action Lesser Heal.
pub const LESSER_HEAL_RANGE: i32 = 6;

/// Everything a character can attempt on its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    Strike,
    PowerAttack,
    RaiseShield,
    TwinFeint,
    ArcaneBlast,
    MagicMissile { actions: u8 },
    ShieldSpell,
    SpiritLink,
    Sanctuary,
    LesserHeal { actions: u8 },
    DrinkPotion,
    Stride,
    EndTurn,
}

/// Who or what an ability must be aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    None,
    Opponent,
    Ally,
    Square,
}

impl Ability {
    pub fn name(&self) -> &'static str {
        match self {
            Ability::Strike => "Strike",
            Ability::PowerAttack => "Power Attack",
            Ability::RaiseShield => "Raise Shield",
            Ability::TwinFeint => "Twin Feint",
            Ability::ArcaneBlast => "Arcane Blast",
            Ability::MagicMissile { .. } => "Magic Missile",
            Ability::ShieldSpell => "Shield",
            Ability::SpiritLink => "Spirit Link",
            Ability::Sanctuary => "Sanctuary",
            Ability::LesserHeal { .. } => "Lesser Heal",
            Ability::DrinkPotion => "Potion",
            Ability::Stride => "Stride",
            Ability::EndTurn => "End Turn",
        }
    }

    /// Actions spent when the ability resolves.
    pub fn cost(&self) -> u8 {
        match self {
            Ability::PowerAttack | Ability::TwinFeint => 2,
            Ability::MagicMissile { actions } | Ability::LesserHeal { actions } => *actions,
            Ability::EndTurn => 0,
            _ => 1,
        }
    }

    /// Maximum distance to the target, in squares.
    pub fn range(&self) -> Option<i32> {
        match self {
            Ability::Strike | Ability::PowerAttack | Ability::TwinFeint => Some(MELEE_RANGE),
            Ability::ArcaneBlast => Some(ARCANE_BLAST_RANGE),
            Ability::MagicMissile { .. } => Some(MAGIC_MISSILE_RANGE),
            Ability::SpiritLink => Some(SPIRIT_LINK_RANGE),
            Ability::Sanctuary => Some(SANCTUARY_RANGE),
            Ability::LesserHeal { actions: 1 } => Some(MELEE_RANGE),
            Ability::LesserHeal { .. } => Some(LESSER_HEAL_RANGE),
            _ => None,
        }
    }

    pub fn target_kind(&self) -> TargetKind {
        match self {
            Ability::Strike
            | Ability::PowerAttack
            | Ability::TwinFeint
            | Ability::ArcaneBlast
            | Ability::MagicMissile { .. } => TargetKind::Opponent,
            Ability::SpiritLink | Ability::Sanctuary => TargetKind::Ally,
            Ability::LesserHeal { actions } if *actions < 3 => TargetKind::Ally,
            Ability::Stride => TargetKind::Square,
            _ => TargetKind::None,
        }
    }

    /// Menu label such as `Power Attack [2]`.
    pub fn label(&self) -> String {
        format!("{} [{}]", self.name(), self.cost())
    }

    /// Whether an archetype has this ability at all.
    pub fn usable_by(&self, archetype: &Archetype) -> bool {
        match self {
            Ability::DrinkPotion | Ability::Stride | Ability::EndTurn => true,
            Ability::Strike => !matches!(archetype, Archetype::Wizard { .. }),
            Ability::PowerAttack | Ability::RaiseShield => {
                matches!(archetype, Archetype::Fighter { .. })
            }
            Ability::TwinFeint => matches!(archetype, Archetype::Rogue),
            Ability::ArcaneBlast | Ability::ShieldSpell => {
                matches!(archetype, Archetype::Wizard { .. })
            }
            Ability::MagicMissile { actions } => {
                matches!(archetype, Archetype::Wizard { .. }) && (1..=3).contains(actions)
            }
            Ability::SpiritLink | Ability::Sanctuary => matches!(archetype, Archetype::Cleric),
            Ability::LesserHeal { actions } => {
                matches!(archetype, Archetype::Cleric) && (1..=3).contains(actions)
            }
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Ability {
    type Err = String;

    /// Parse names like `power attack` or `magic missile 2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let (name, count) = match s.rsplit_once(' ') {
            Some((head, tail)) if tail.chars().all(|c| c.is_ascii_digit()) => {
                (head.trim().to_string(), tail.parse::<u8>().ok())
            }
            _ => (s.clone(), None),
        };
        let actions = count.unwrap_or(1);
        let ability = match name.as_str() {
            "strike" | "attack" => Ability::Strike,
            "power attack" => Ability::PowerAttack,
            "raise shield" => Ability::RaiseShield,
            "twin feint" => Ability::TwinFeint,
            "arcane blast" => Ability::ArcaneBlast,
            "magic missile" => Ability::MagicMissile { actions },
            "shield" => Ability::ShieldSpell,
            "spirit link" => Ability::SpiritLink,
            "sanctuary" => Ability::Sanctuary,
            "lesser heal" | "heal" => Ability::LesserHeal { actions },
            "potion" | "drink potion" => Ability::DrinkPotion,
            "stride" | "move" => Ability::Stride,
            "end turn" | "end" => Ability::EndTurn,
            _ => return Err(format!("unknown ability '{s}'")),
        };
        Ok(ability)
    }
}

/// Where a menu entry will be aimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetRequirement {
    None,
    Character(CharacterId),
    Square,
}

/// One entry in the action menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableAction {
    pub label: String,
    pub cost: u8,
    pub ability: Ability,
    pub target: TargetRequirement,
}

impl AvailableAction {
    fn new(ability: Ability, target: TargetRequirement) -> Self {
        Self {
            label: ability.label(),
            cost: ability.cost(),
            ability,
            target,
        }
    }
}

/// Whether `target` is a legal aim for `ability` from `actor`.
pub fn target_allowed(ability: Ability, actor: &Character, target: &Character) -> bool {
    if !target.is_alive() {
        return false;
    }
    let side_ok = match ability.target_kind() {
        TargetKind::Opponent => target.side != actor.side,
        TargetKind::Ally => {
            target.side == actor.side && target.side == Side::Party
                && !(ability == Ability::SpiritLink && target.id == actor.id)
        }
        _ => return false,
    };
    let in_range = match (ability.range(), actor.distance_to(target)) {
        (Some(range), Some(distance)) => distance <= range,
        _ => false,
    };
    side_ok && in_range
}

/// The action menu for `actor` given the currently selected target.
pub fn available_actions(actor: &Character, selected: Option<&Character>) -> Vec<AvailableAction> {
    let mut actions = Vec::new();
    let left = actor.actions_left;

    if actor.is_alive() && left > 0 {
        let mut candidates = vec![
            Ability::Strike,
            Ability::PowerAttack,
            Ability::TwinFeint,
            Ability::ArcaneBlast,
        ];
        candidates.extend((1..=3).map(|n| Ability::MagicMissile { actions: n }));
        candidates.extend([Ability::SpiritLink, Ability::Sanctuary]);
        candidates.extend((1..=2).map(|n| Ability::LesserHeal { actions: n }));

        if let Some(target) = selected {
            for ability in candidates {
                if ability.usable_by(&actor.archetype)
                    && ability.cost() <= left
                    && target_allowed(ability, actor, target)
                    && !(ability == Ability::Sanctuary && target.has_sanctuary())
                {
                    actions.push(AvailableAction::new(
                        ability,
                        TargetRequirement::Character(target.id),
                    ));
                }
            }
        }

        match actor.archetype {
            Archetype::Fighter { shield_raised } if !shield_raised => {
                actions.push(AvailableAction::new(Ability::RaiseShield, TargetRequirement::None));
            }
            Archetype::Wizard { shield_up } if !shield_up => {
                actions.push(AvailableAction::new(Ability::ShieldSpell, TargetRequirement::None));
            }
            Archetype::Cleric if left >= 3 => {
                actions.push(AvailableAction::new(
                    Ability::LesserHeal { actions: 3 },
                    TargetRequirement::None,
                ));
            }
            _ => {}
        }

        if actor.potions > 0 {
            actions.push(AvailableAction::new(Ability::DrinkPotion, TargetRequirement::None));
        }
        actions.push(AvailableAction::new(Ability::Stride, TargetRequirement::Square));
    }

    actions.push(AvailableAction::new(Ability::EndTurn, TargetRequirement::None));
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_data::{ArchetypeKind, EnemyKind};
    use crate::conditions::Condition;
    use crate::grid::GridPosition;

    fn ready(mut c: Character) -> Character {
        c.begin_turn();
        c
    }

    fn labels(actions: &[AvailableAction]) -> Vec<&str> {
        actions.iter().map(|a| a.label.as_str()).collect()
    }

    #[test]
    fn test_costs_and_labels() {
        assert_eq!(Ability::PowerAttack.label(), "Power Attack [2]");
        assert_eq!(Ability::MagicMissile { actions: 3 }.cost(), 3);
        assert_eq!(Ability::EndTurn.label(), "End Turn [0]");
        assert_eq!(Ability::LesserHeal { actions: 1 }.range(), Some(1));
        assert_eq!(Ability::LesserHeal { actions: 2 }.range(), Some(6));
    }

    #[test]
    fn test_parse_ability() {
        assert_eq!("Power Attack".parse(), Ok(Ability::PowerAttack));
        assert_eq!("magic missile 2".parse(), Ok(Ability::MagicMissile { actions: 2 }));
        assert_eq!("heal 3".parse(), Ok(Ability::LesserHeal { actions: 3 }));
        assert_eq!("shield".parse(), Ok(Ability::ShieldSpell));
        assert!("fireball".parse::<Ability>().is_err());
    }

    #[test]
    fn test_fighter_menu_with_adjacent_enemy() {
        let fighter = ready(Character::hero(ArchetypeKind::Fighter).at(GridPosition::new(2, 2)));
        let goblin = Character::enemy(EnemyKind::Goblin, "Goblin").at(GridPosition::new(3, 2));
        let menu = available_actions(&fighter, Some(&goblin));
        assert_eq!(
            labels(&menu),
            vec![
                "Strike [1]",
                "Power Attack [2]",
                "Raise Shield [1]",
                "Potion [1]",
                "Stride [1]",
                "End Turn [0]"
            ]
        );
    }

    #[test]
    fn test_menu_respects_budget_and_range() {
        let mut fighter = ready(Character::hero(ArchetypeKind::Fighter).at(GridPosition::new(2, 2)));
        fighter.actions_left = 1;
        fighter.potions = 0;
        let far = Character::enemy(EnemyKind::Goblin, "Goblin").at(GridPosition::new(6, 2));
        let menu = available_actions(&fighter, Some(&far));
        assert_eq!(labels(&menu), vec!["Raise Shield [1]", "Stride [1]", "End Turn [0]"]);

        fighter.actions_left = 0;
        assert_eq!(labels(&available_actions(&fighter, None)), vec!["End Turn [0]"]);
    }

    #[test]
    fn test_wizard_missiles_scale_with_budget() {
        let mut wizard = ready(Character::hero(ArchetypeKind::Wizard).at(GridPosition::new(0, 0)));
        let ogre = Character::enemy(EnemyKind::Ogre, "Ogre").at(GridPosition::new(10, 5));
        let menu = available_actions(&wizard, Some(&ogre));
        let missiles: Vec<_> = menu
            .iter()
            .filter(|a| matches!(a.ability, Ability::MagicMissile { .. }))
            .collect();
        assert_eq!(missiles.len(), 3);
        assert!(!menu.iter().any(|a| a.ability == Ability::ArcaneBlast));

        wizard.actions_left = 2;
        let menu = available_actions(&wizard, Some(&ogre));
        assert!(!menu.iter().any(|a| a.ability == Ability::MagicMissile { actions: 3 }));
    }

    #[test]
    fn test_cleric_ally_menu() {
        let cleric = ready(Character::hero(ArchetypeKind::Cleric).at(GridPosition::new(2, 2)));
        let mut fighter = Character::hero(ArchetypeKind::Fighter).at(GridPosition::new(3, 2));
        let menu = available_actions(&cleric, Some(&fighter));
        assert_eq!(
            labels(&menu),
            vec![
                "Spirit Link [1]",
                "Sanctuary [1]",
                "Lesser Heal [1]",
                "Lesser Heal [2]",
                "Lesser Heal [3]",
                "Potion [1]",
                "Stride [1]",
                "End Turn [0]"
            ]
        );

        fighter.conditions.add(Condition::Sanctuary, 3);
        let menu = available_actions(&cleric, Some(&fighter));
        assert!(!menu.iter().any(|a| a.ability == Ability::Sanctuary));

        let menu = available_actions(&cleric, Some(&cleric));
        assert!(!menu.iter().any(|a| a.ability == Ability::SpiritLink));
        assert!(menu.iter().any(|a| a.ability == Ability::Sanctuary));
    }

    #[test]
    fn test_menu_is_a_pure_query() {
        let rogue = ready(Character::hero(ArchetypeKind::Rogue).at(GridPosition::new(2, 2)));
        let goblin = Character::enemy(EnemyKind::Goblin, "Goblin").at(GridPosition::new(3, 3));
        let first = available_actions(&rogue, Some(&goblin));
        let second = available_actions(&rogue, Some(&goblin));
        assert_eq!(first, second);
        assert_eq!(rogue.actions_left, 3);
    }

    #[test]
    fn test_dead_target_not_offered() {
        let rogue = ready(Character::hero(ArchetypeKind::Rogue).at(GridPosition::new(2, 2)));
        let goblin = Character::enemy(EnemyKind::Goblin, "Goblin")
            .at(GridPosition::new(3, 2))
            .with_hp(0);
        let menu = available_actions(&rogue, Some(&goblin));
        assert!(!menu.iter().any(|a| a.ability == Ability::Strike));
    }
}
