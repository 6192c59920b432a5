//! Skill training session models

use crate::types::{ActorId, Gold, SkillValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pricing/limit regime, picked from the trainee's current skill value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrainingTier {
    Beginner,
    Advanced,
}

/// A skill lowered to make room under the skill cap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillReduction {
    pub skill: String,
    pub amount: SkillValue,
}

/// Open training session, waiting for the actor's deposit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSession {
    pub actor: ActorId,
    pub skill: String,
    pub tier: TrainingTier,
    /// Price of one 0.1 increment, fixed for the life of the session
    pub cost_per_increment: Gold,
    pub started_at: DateTime<Utc>,
    /// Filled once the deposit is applied
    #[serde(default)]
    pub reductions: Vec<SkillReduction>,
}

/// Answer to a training request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingOffer {
    pub skill: String,
    pub tier: TrainingTier,
    pub current: SkillValue,
    pub cost_per_increment: Gold,
    /// Skill of the pending session this request replaced, if any
    pub replaced: Option<String>,
}

/// Why a deposit was refunded in full
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectReason {
    DepositTooSmall,
    SkillCapReached,
    NoReducibleSkills,
    SkillFrozen,
    TrainingCapReached,
    DailyLimitReached,
}

/// Applied training, itemized for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReceipt {
    pub skill: String,
    pub tier: TrainingTier,
    pub points: SkillValue,
    pub new_value: SkillValue,
    pub cost: Gold,
    pub change: Gold,
    pub reductions: Vec<SkillReduction>,
}

/// Resolution of an open session by a deposit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrainingResolution {
    Applied(TrainingReceipt),
    Rejected { reason: RejectReason, refund: Gold },
}
