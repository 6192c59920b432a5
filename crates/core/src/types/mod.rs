//! Shared type definitions and newtypes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

/// Upper bound of the global market sentiment scalar
pub const MAX_SENTIMENT: u32 = 100_000;

/// Amount of the fungible currency (gold pieces)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Gold(pub u64);

impl Gold {
    pub const ZERO: Gold = Gold(0);

    pub fn new(amount: u64) -> Self {
        Gold(amount)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_sub(self, rhs: Gold) -> Option<Gold> {
        self.0.checked_sub(rhs.0).map(Gold)
    }

    pub fn saturating_sub(self, rhs: Gold) -> Gold {
        Gold(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Gold {
    type Output = Gold;

    fn add(self, rhs: Gold) -> Gold {
        Gold(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Gold {
    fn add_assign(&mut self, rhs: Gold) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Gold {
    type Output = Gold;

    fn sub(self, rhs: Gold) -> Gold {
        self.saturating_sub(rhs)
    }
}

impl Mul<u64> for Gold {
    type Output = Gold;

    fn mul(self, rhs: u64) -> Gold {
        Gold(self.0.saturating_mul(rhs))
    }
}

impl fmt::Display for Gold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}gp", self.0)
    }
}

/// Skill value in fixed-point tenths (e.g. 35.7 is stored as 357)
///
/// Skills only ever move in increments of 0.1, so storing tenths keeps
/// every sum and comparison exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SkillValue(pub u32);

impl SkillValue {
    pub const ZERO: SkillValue = SkillValue(0);

    pub fn from_tenths(tenths: u32) -> Self {
        SkillValue(tenths)
    }

    /// Convert from a decimal point value, rounding to the nearest tenth
    pub fn from_points(points: f64) -> Self {
        if points.is_nan() || points <= 0.0 {
            return SkillValue(0);
        }
        SkillValue((points * 10.0).round() as u32)
    }

    pub fn tenths(&self) -> u32 {
        self.0
    }

    pub fn as_points(&self) -> f64 {
        self.0 as f64 / 10.0
    }

    /// Whole points, truncated (used where the economy reads skills as integers)
    pub fn whole_points(&self) -> u32 {
        self.0 / 10
    }

    pub fn saturating_sub(self, rhs: SkillValue) -> SkillValue {
        SkillValue(self.0.saturating_sub(rhs.0))
    }
}

impl Add for SkillValue {
    type Output = SkillValue;

    fn add(self, rhs: SkillValue) -> SkillValue {
        SkillValue(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for SkillValue {
    fn add_assign(&mut self, rhs: SkillValue) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl fmt::Display for SkillValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

/// Global market sentiment, clamped to `0..=MAX_SENTIMENT`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sentiment(u32);

impl Sentiment {
    pub fn new(value: u32) -> Self {
        Sentiment(value.min(MAX_SENTIMENT))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// The same reading seen from the opposite side of the market
    pub fn inverted(&self) -> Self {
        Sentiment(MAX_SENTIMENT - self.0)
    }
}

/// Stable identity of an actor (player or NPC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a concrete item instance held by an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// Identity of a lot archived on a vendor's resale shelf
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LotId(pub u64);

/// Item template / item type identifier (e.g. "iron_ingot", "pack_horse")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        TemplateId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TemplateId {
    fn from(id: &str) -> Self {
        TemplateId(id.to_string())
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
