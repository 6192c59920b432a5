//! Vendor and trading-party profiles

use crate::types::{ActorId, SkillValue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What a vendor instance is able to do, populated at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorCapabilities {
    pub sells: bool,
    pub buys: bool,
    pub teaches: bool,
    /// Only members of the vendor's affiliation may trade
    #[serde(default)]
    pub guild_only: bool,
    /// Item categories this vendor buys; empty means every category
    #[serde(default)]
    pub accepts: BTreeSet<String>,
}

impl Default for VendorCapabilities {
    fn default() -> Self {
        Self {
            sells: true,
            buys: true,
            teaches: true,
            guild_only: false,
            accepts: BTreeSet::new(),
        }
    }
}

impl VendorCapabilities {
    pub fn accepts_category(&self, category: Option<&str>) -> bool {
        if self.accepts.is_empty() {
            return true;
        }
        category.is_some_and(|c| self.accepts.contains(c))
    }
}

/// A vendor's identity as seen by the economy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorProfile {
    pub id: ActorId,
    pub name: String,
    /// Good vendors read sentiment as-is, bad vendors read it inverted
    pub favorable: bool,
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub capabilities: VendorCapabilities,
    /// Skills this vendor can teach and its own proficiency in each
    #[serde(default)]
    pub proficiencies: BTreeMap<String, SkillValue>,
}

impl VendorProfile {
    pub fn proficiency(&self, skill: &str) -> SkillValue {
        self.proficiencies
            .get(skill)
            .copied()
            .unwrap_or(SkillValue::ZERO)
    }

    pub fn shares_affiliation(&self, other: Option<&str>) -> bool {
        match (self.affiliation.as_deref(), other) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => false,
        }
    }
}

/// The actor on the other side of the counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trader {
    pub id: ActorId,
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub barter: SkillValue,
    #[serde(default)]
    pub begging: SkillValue,
    /// Currently in a begging posture
    #[serde(default)]
    pub begging_posture: bool,
}

impl Trader {
    pub fn new(id: ActorId) -> Self {
        Self {
            id,
            affiliation: None,
            barter: SkillValue::ZERO,
            begging: SkillValue::ZERO,
            begging_posture: false,
        }
    }
}
