//! Dice rolling.
//!
//! Supports simple `XdY+Z` notation. All randomness flows through the
//! [`DiceRoller`] trait so encounters can run on a seeded RNG and tests can
//! script exact rolls.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
}

/// Die types used by the combat rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            20 => Some(DieType::D20),
            100 => Some(DieType::D100),
            _ => None,
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// Source of die results.
///
/// Implementations must return a value in `1..=die.sides()`.
pub trait DiceRoller {
    fn roll_die(&mut self, die: DieType) -> u32;
}

/// A [`DiceRoller`] backed by any `rand` RNG.
#[derive(Debug, Clone)]
pub struct RngRoller<R> {
    rng: R,
}

impl<R: Rng> RngRoller<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngRoller<StdRng> {
    /// A reproducible roller for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> DiceRoller for RngRoller<R> {
    fn roll_die(&mut self, die: DieType) -> u32 {
        self.rng.gen_range(1..=die.sides())
    }
}

/// A dice expression such as `2d10+2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceExpression {
    pub count: u32,
    pub die: DieType,
    pub modifier: i32,
}

impl DiceExpression {
    pub const fn new(count: u32, die: DieType) -> Self {
        Self {
            count,
            die,
            modifier: 0,
        }
    }

    pub const fn with_modifier(mut self, modifier: i32) -> Self {
        self.modifier = modifier;
        self
    }

    /// The same expression with its dice count doubled, as on a critical hit.
    pub fn doubled(&self) -> Self {
        Self {
            count: self.count * 2,
            ..*self
        }
    }

    /// Parse a dice notation string.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation: String = notation
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }

        let d_pos = notation
            .find('d')
            .ok_or_else(|| DiceError::InvalidNotation(notation.clone()))?;
        let count_str = &notation[..d_pos];
        let rest = &notation[d_pos + 1..];

        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| DiceError::InvalidNotation(notation.clone()))?
        };
        if count == 0 {
            return Err(DiceError::NoDice);
        }

        let (sides_str, modifier) = match rest.find(['+', '-']) {
            Some(pos) => {
                let value: i32 = rest[pos + 1..]
                    .parse()
                    .map_err(|_| DiceError::InvalidNotation(notation.clone()))?;
                let sign = if rest.as_bytes()[pos] == b'-' { -1 } else { 1 };
                (&rest[..pos], sign * value)
            }
            None => (rest, 0),
        };

        let sides: u32 = sides_str
            .parse()
            .map_err(|_| DiceError::InvalidNotation(notation.clone()))?;
        let die = DieType::from_sides(sides).ok_or(DiceError::InvalidDieSize(sides))?;

        Ok(Self {
            count,
            die,
            modifier,
        })
    }

    /// Roll the expression using the supplied roller.
    pub fn roll(&self, roller: &mut dyn DiceRoller) -> RollResult {
        let rolls: Vec<u32> = (0..self.count).map(|_| roller.roll_die(self.die)).collect();
        let dice_total: i32 = rolls.iter().map(|r| *r as i32).sum();
        RollResult {
            expression: *self,
            rolls,
            total: dice_total + self.modifier,
        }
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.die)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DiceExpression {
    type Error = DiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DiceExpression> for String {
    fn from(value: DiceExpression) -> Self {
        value.to_string()
    }
}

/// Result of rolling a dice expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollResult {
    pub expression: DiceExpression,
    pub rolls: Vec<u32>,
    pub total: i32,
}

impl RollResult {
    /// Individual dice joined as `a + b + c`.
    pub fn rolls_display(&self) -> String {
        self.rolls
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = [{}] = {}", self.expression, self.rolls_display(), self.total)
    }
}

/// Roll a single d20.
pub fn roll_d20(roller: &mut dyn DiceRoller) -> u32 {
    roller.roll_die(DieType::D20)
}

/// Percentile check: true with `percent`% probability.
pub fn chance(roller: &mut dyn DiceRoller, percent: u32) -> bool {
    roller.roll_die(DieType::D100) <= percent
}
