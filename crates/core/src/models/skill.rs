//! Skill models

use crate::types::SkillValue;
use serde::{Deserialize, Serialize};

/// What the actor intends for a skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkillLock {
    /// Skill may grow
    #[default]
    RaiseIntent,
    /// Skill may be lowered automatically to make room under the skill cap
    AllowReduction,
    /// Skill must not change
    Frozen,
}

/// A named skill of an actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRecord {
    pub name: String,
    pub value: SkillValue,
    #[serde(default)]
    pub lock: SkillLock,
}

impl SkillRecord {
    pub fn new(name: impl Into<String>, value: SkillValue, lock: SkillLock) -> Self {
        Self {
            name: name.into(),
            value,
            lock,
        }
    }
}

/// Sum of all skill values; compared against the server skill cap
pub fn skill_total(skills: &[SkillRecord]) -> SkillValue {
    skills
        .iter()
        .fold(SkillValue::ZERO, |acc, s| acc + s.value)
}
