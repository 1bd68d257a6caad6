//! The wave table and the controller that deploys it.

use crate::character::{Character, CharacterId, Roster};
use crate::class_data::EnemyKind;
use crate::dice::DiceExpression;
use crate::grid::{GridBounds, GridPosition, Placement};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One enemy in a wave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    pub position: GridPosition,
    /// Overrides the kind's damage dice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<DiceExpression>,
    /// Overrides the generated "Goblin 1" style name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EnemySpawn {
    pub fn new(kind: EnemyKind, position: GridPosition) -> Self {
        Self {
            kind,
            position,
            damage: None,
            name: None,
        }
    }

    pub fn with_damage(mut self, damage: DiceExpression) -> Self {
        self.damage = Some(damage);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A titled group of enemies deployed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveDefinition {
    pub title: String,
    pub spawns: Vec<EnemySpawn>,
}

impl WaveDefinition {
    pub fn new(title: impl Into<String>, spawns: Vec<EnemySpawn>) -> Self {
        Self {
            title: title.into(),
            spawns,
        }
    }
}

/// Goblins, then Ogres, then Wyverns.
pub fn default_waves() -> Vec<WaveDefinition> {
    let p = GridPosition::new;
    vec![
        WaveDefinition::new(
            "Wave 1: Goblins",
            vec![
                EnemySpawn::new(EnemyKind::Goblin, p(12, 1)),
                EnemySpawn::new(EnemyKind::Goblin, p(14, 1)),
                EnemySpawn::new(EnemyKind::Goblin, p(15, 2)),
            ],
        ),
        WaveDefinition::new(
            "Wave 2: Ogres' Fury",
            vec![
                EnemySpawn::new(EnemyKind::Ogre, p(13, 1)),
                EnemySpawn::new(EnemyKind::Ogre, p(15, 1)),
            ],
        ),
        WaveDefinition::new(
            "Wave 3: Wyvern Assault!",
            vec![
                EnemySpawn::new(EnemyKind::Wyvern, p(13, 1)),
                EnemySpawn::new(EnemyKind::Wyvern, p(15, 2)),
            ],
        ),
    ]
}

/// Tracks which wave is on the field.
///
/// Every wave's enemies are created up front by [`populate`](Self::populate)
/// and wait in the roster as [`Placement::NotDeployed`] until their wave
/// arrives.
#[derive(Debug, Clone, Default)]
pub struct WaveController {
    waves: Vec<WaveDefinition>,
    pools: Vec<Vec<CharacterId>>,
    number: usize,
    current: Vec<CharacterId>,
}

impl WaveController {
    pub fn new(waves: Vec<WaveDefinition>) -> Self {
        Self {
            waves,
            ..Self::default()
        }
    }

    /// Add every wave's enemies to the roster, undeployed.
    pub fn populate(&mut self, roster: &mut Roster) {
        self.pools.clear();
        self.current.clear();
        self.number = 0;
        for wave in &self.waves {
            let mut counts: HashMap<EnemyKind, u32> = HashMap::new();
            let pool = wave
                .spawns
                .iter()
                .map(|spawn| {
                    let n = counts.entry(spawn.kind).or_default();
                    *n += 1;
                    let name = spawn
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("{} {n}", spawn.kind.name()));
                    let mut enemy = Character::enemy(spawn.kind, name);
                    if let Some(dice) = spawn.damage {
                        enemy = enemy.with_damage(dice);
                    }
                    roster.push(enemy)
                })
                .collect();
            self.pools.push(pool);
        }
    }

    /// Place the next wave's enemies on the board.
    ///
    /// A spawn square that is already taken falls back to the nearest free
    /// square. Returns `None` once the table is exhausted.
    pub fn deploy_next(&mut self, roster: &mut Roster, bounds: GridBounds) -> Option<&WaveDefinition> {
        let index = self.number;
        let wave = self.waves.get(index)?;
        let pool = self.pools.get(index)?;
        for (spawn, id) in wave.spawns.iter().zip(pool) {
            let square = nearest_free(roster, bounds, spawn.position);
            if let (Some(square), Some(enemy)) = (square, roster.get_mut(*id)) {
                enemy.placement = Placement::Deployed(square);
            }
        }
        self.current = pool
            .iter()
            .copied()
            .filter(|id| roster.get(*id).is_some_and(|c| c.is_active()))
            .collect();
        self.number += 1;
        tracing::info!(wave = self.number, title = %wave.title, enemies = self.current.len(), "wave deployed");
        Some(wave)
    }

    /// One-based number of the wave on the field, 0 before the first.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn len(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    pub fn is_last(&self) -> bool {
        self.number >= self.waves.len()
    }

    pub fn current_title(&self) -> Option<&str> {
        self.number
            .checked_sub(1)
            .and_then(|i| self.waves.get(i))
            .map(|w| w.title.as_str())
    }

    /// Title of the wave that [`deploy_next`](Self::deploy_next) would deploy.
    pub fn next_title(&self) -> Option<&str> {
        self.waves.get(self.number).map(|w| w.title.as_str())
    }

    /// Enemies deployed for the current wave, dead or alive.
    pub fn current_enemies(&self) -> &[CharacterId] {
        &self.current
    }

    /// Whether every enemy of the current wave has fallen.
    pub fn is_complete(&self, roster: &Roster) -> bool {
        !self.current.is_empty()
            && self
                .current
                .iter()
                .all(|id| roster.get(*id).map_or(true, |c| !c.is_alive()))
    }
}

/// The free square closest to `wanted`, scanning outward ring by ring.
pub fn nearest_free(roster: &Roster, bounds: GridBounds, wanted: GridPosition) -> Option<GridPosition> {
    let max_radius = bounds.width.max(bounds.height);
    (0..=max_radius).find_map(|radius| {
        bounds
            .squares_within(wanted, radius)
            .into_iter()
            .filter(|pos| pos.distance_to(wanted) == radius)
            .find(|pos| roster.occupant(*pos).is_none())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_data::ArchetypeKind;

    fn setup() -> (Roster, WaveController) {
        let mut roster = Roster::new();
        let mut waves = WaveController::new(default_waves());
        waves.populate(&mut roster);
        (roster, waves)
    }

    #[test]
    fn test_populate_creates_undeployed_pool() {
        let (roster, waves) = setup();
        assert_eq!(roster.len(), 7);
        assert!(roster.iter().all(|c| !c.placement.is_deployed()));
        assert_eq!(waves.number(), 0);
        assert!(!waves.is_complete(&roster));
        let names: Vec<&str> = roster.iter().take(3).map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Goblin 1", "Goblin 2", "Goblin 3"]);
    }

    #[test]
    fn test_deploy_waves_in_order() {
        let (mut roster, mut waves) = setup();
        let bounds = GridBounds::default();

        let title = waves.deploy_next(&mut roster, bounds).map(|w| w.title.clone());
        assert_eq!(title.as_deref(), Some("Wave 1: Goblins"));
        assert_eq!(waves.current_enemies().len(), 3);
        let first = roster.get(waves.current_enemies()[0]).unwrap();
        assert_eq!(first.position(), Some(GridPosition::new(12, 1)));
        assert!(!waves.is_last());

        waves.deploy_next(&mut roster, bounds);
        assert_eq!(waves.current_title(), Some("Wave 2: Ogres' Fury"));
        waves.deploy_next(&mut roster, bounds);
        assert!(waves.is_last());
        assert!(waves.deploy_next(&mut roster, bounds).is_none());
    }

    #[test]
    fn test_complete_when_all_current_dead() {
        let (mut roster, mut waves) = setup();
        waves.deploy_next(&mut roster, GridBounds::default());
        let ids = waves.current_enemies().to_vec();
        for id in &ids[..2] {
            roster.get_mut(*id).unwrap().take_damage(100);
        }
        assert!(!waves.is_complete(&roster));
        roster.get_mut(ids[2]).unwrap().take_damage(100);
        assert!(waves.is_complete(&roster));
    }

    #[test]
    fn test_occupied_spawn_falls_back() {
        let mut roster = Roster::new();
        roster.push(Character::hero(ArchetypeKind::Fighter).at(GridPosition::new(12, 1)));
        let mut waves = WaveController::new(default_waves());
        waves.populate(&mut roster);
        waves.deploy_next(&mut roster, GridBounds::default());
        let goblin = roster.get(waves.current_enemies()[0]).unwrap();
        let pos = goblin.position().unwrap();
        assert_ne!(pos, GridPosition::new(12, 1));
        assert_eq!(pos.distance_to(GridPosition::new(12, 1)), 1);
    }

    #[test]
    fn test_spawn_overrides() {
        let mut roster = Roster::new();
        let dice: DiceExpression = "1d4".parse().unwrap();
        let mut waves = WaveController::new(vec![WaveDefinition::new(
            "Boss",
            vec![EnemySpawn::new(EnemyKind::Ogre, GridPosition::new(5, 5))
                .with_name("Grolm")
                .with_damage(dice)],
        )]);
        waves.populate(&mut roster);
        let ogre = roster.iter().next().unwrap();
        assert_eq!(ogre.name, "Grolm");
        assert!(matches!(ogre.archetype, crate::character::Archetype::Enemy { damage, .. } if damage == dice));
    }
}
