//! Base stat blocks for the playable archetypes and enemy kinds.

use crate::dice::{DiceExpression, DieType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Playable archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchetypeKind {
    Fighter,
    Rogue,
    Wizard,
    Cleric,
}

impl ArchetypeKind {
    pub const ALL: [ArchetypeKind; 4] = [
        ArchetypeKind::Fighter,
        ArchetypeKind::Rogue,
        ArchetypeKind::Wizard,
        ArchetypeKind::Cleric,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ArchetypeKind::Fighter => "Fighter",
            ArchetypeKind::Rogue => "Rogue",
            ArchetypeKind::Wizard => "Wizard",
            ArchetypeKind::Cleric => "Cleric",
        }
    }

    /// Base stats for a fresh character of this archetype.
    pub fn data(&self) -> ClassData {
        match self {
            ArchetypeKind::Fighter => ClassData {
                default_name: "Valeros",
                max_hp: 50,
                base_ac: 18,
                attack_bonus: 9,
                speed: 25,
            },
            ArchetypeKind::Rogue => ClassData {
                default_name: "Merisiel",
                max_hp: 38,
                base_ac: 17,
                attack_bonus: 8,
                speed: 30,
            },
            ArchetypeKind::Wizard => ClassData {
                default_name: "Ezren",
                max_hp: 32,
                base_ac: 16,
                attack_bonus: 6,
                speed: 25,
            },
            ArchetypeKind::Cleric => ClassData {
                default_name: "Kyra",
                max_hp: 32,
                base_ac: 16,
                attack_bonus: 6,
                speed: 25,
            },
        }
    }
}

impl fmt::Display for ArchetypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ArchetypeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArchetypeKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown class '{s}'"))
    }
}

/// Stat block for a playable archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassData {
    pub default_name: &'static str,
    pub max_hp: i32,
    pub base_ac: i32,
    pub attack_bonus: i32,
    /// Movement per Stride, in feet.
    pub speed: i32,
}

/// Monster kinds that appear in waves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Goblin,
    Ogre,
    Wyvern,
}

impl EnemyKind {
    pub fn name(&self) -> &'static str {
        match self {
            EnemyKind::Goblin => "Goblin",
            EnemyKind::Ogre => "Ogre",
            EnemyKind::Wyvern => "Wyvern",
        }
    }

    pub fn data(&self) -> EnemyData {
        match self {
            EnemyKind::Goblin => EnemyData {
                max_hp: 20,
                base_ac: 15,
                attack_bonus: 5,
                speed: 25,
                damage: DiceExpression::new(1, DieType::D8),
            },
            EnemyKind::Ogre => EnemyData {
                max_hp: 40,
                base_ac: 17,
                attack_bonus: 7,
                speed: 30,
                damage: DiceExpression::new(2, DieType::D6),
            },
            EnemyKind::Wyvern => EnemyData {
                max_hp: 55,
                base_ac: 19,
                attack_bonus: 9,
                speed: 35,
                damage: DiceExpression::new(2, DieType::D8),
            },
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Stat block for an enemy kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyData {
    pub max_hp: i32,
    pub base_ac: i32,
    pub attack_bonus: i32,
    pub speed: i32,
    pub damage: DiceExpression,
}
