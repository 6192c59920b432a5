//! Deposit-based skill training
//!
//! A request opens a session that fixes the price per 0.1 point. The
//! actor's next deposit resolves it: the engine works out how many points
//! the money buys, fits them under the skill budget, the training cap and
//! the daily limit, and either applies them or refunds everything.

mod sessions;

pub use sessions::SessionStore;

use crate::config::TrainingConfig;
use crate::ports::{Funds, SkillBook};
use crate::transactions::check_access;
use bazaar_core::{
    skill_total, ActorId, Error, FundSource, Gold, Payout, RejectReason, Result, SkillLock,
    SkillRecord, SkillReduction, SkillValue, TradeType, Trader, TrainingOffer, TrainingReceipt,
    TrainingResolution, TrainingSession, TrainingTier, VendorProfile,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct TrainingEngine {
    config: TrainingConfig,
    sessions: SessionStore,
}

impl TrainingEngine {
    pub fn new(config: TrainingConfig) -> Self {
        let sessions = SessionStore::with_capacity(config.session_ttl(), config.max_sessions);
        Self { config, sessions }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let purged = self.sessions.purge_expired(now);
        if purged > 0 {
            debug!("Dropped {} idle training session(s)", purged);
        }
        purged
    }

    /// Ask a vendor to train a skill. A pending session of the same actor
    /// is replaced, and the offer names the skill it was for.
    pub fn request_training<H: SkillBook>(
        &mut self,
        vendor: &VendorProfile,
        trader: &Trader,
        skill: &str,
        host: &H,
        now: DateTime<Utc>,
    ) -> Result<TrainingOffer> {
        check_access(vendor, trader, TradeType::Train)?;

        let proficiency = vendor.proficiency(skill);
        if proficiency == SkillValue::ZERO {
            return Err(Error::TrainingUnavailable(format!(
                "{} cannot teach {}",
                vendor.name, skill
            )));
        }

        let current = find_skill(&host.skills(trader.id), skill)
            .map(|s| s.value)
            .unwrap_or(SkillValue::ZERO);
        if current >= proficiency {
            return Err(Error::TrainingUnavailable(format!(
                "{} already knows as much {} as {}",
                trader.id, skill, vendor.name
            )));
        }
        if current >= self.config.training_cap() {
            return Err(Error::TrainingUnavailable(format!(
                "{} is at the training cap",
                skill
            )));
        }

        let (tier, cost_per_increment) = if current < self.config.advanced_threshold() {
            (TrainingTier::Beginner, self.config.beginner_cost)
        } else {
            (TrainingTier::Advanced, self.config.advanced_cost)
        };
        if cost_per_increment.is_zero() {
            return Err(Error::InvalidConfig(format!(
                "{:?} training has no price",
                tier
            )));
        }

        let session = TrainingSession {
            actor: trader.id,
            skill: skill.to_string(),
            tier,
            cost_per_increment,
            started_at: now,
            reductions: Vec::new(),
        };
        let replaced = self.sessions.open(session, now).map(|prev| {
            info!(
                "{} replaced pending {} training with {}",
                trader.id, prev.skill, skill
            );
            prev.skill
        });

        info!(
            "{} opened {:?} training in {} at {} per 0.1",
            trader.id, tier, skill, cost_per_increment
        );

        Ok(TrainingOffer {
            skill: skill.to_string(),
            tier,
            current,
            cost_per_increment,
            replaced,
        })
    }

    /// Resolve an actor's pending session with a deposit.
    ///
    /// The deposit is withdrawn from the actor's primary funds. Without a
    /// live session the call fails with `SessionConflict`, and if the actor
    /// cannot cover the deposit the session stays open; in both cases no
    /// money moves. Otherwise the session is closed and any unspent part of
    /// the deposit is paid back.
    pub fn deposit<H: Funds + SkillBook>(
        &mut self,
        actor: ActorId,
        deposit: Gold,
        host: &mut H,
        now: DateTime<Utc>,
    ) -> Result<TrainingResolution> {
        let mut session = self
            .sessions
            .take(actor, now)
            .ok_or(Error::SessionConflict(actor))?;

        // the handed-over coins leave the actor before anything is decided
        if let Err(e) = host.withdraw(actor, FundSource::Primary, deposit) {
            warn!("{} cannot hand over {}: {}", actor, deposit, e);
            self.sessions.open(session, now);
            return Err(e);
        }

        let plan = match self.plan(&session, deposit, &*host, now) {
            Ok(plan) => plan,
            Err(reason) => return Ok(reject(&session, reason, deposit, host)),
        };

        for reduction in &plan.reductions {
            host.set_skill(actor, &reduction.skill, reduction.remaining);
        }
        let new_value = plan.current + plan.points;
        host.set_skill(actor, &session.skill, new_value);
        if session.tier == TrainingTier::Advanced {
            host.record_training(actor, &session.skill, now.date_naive(), plan.points);
        }

        let cost = session.cost_per_increment * plan.points.tenths() as u64;
        let change = deposit.saturating_sub(cost);
        if !change.is_zero() {
            host.pay(actor, Payout::Coins(change));
        }

        session.reductions = plan
            .reductions
            .into_iter()
            .map(|r| SkillReduction {
                skill: r.skill,
                amount: r.amount,
            })
            .collect();
        for r in &session.reductions {
            info!("{} lowered {} by {} to make room", actor, r.skill, r.amount);
        }
        info!(
            "{} trained {} {} -> {} for {} (change {})",
            actor, session.skill, plan.current, new_value, cost, change
        );

        Ok(TrainingResolution::Applied(TrainingReceipt {
            skill: session.skill,
            tier: session.tier,
            points: plan.points,
            new_value,
            cost,
            change,
            reductions: session.reductions,
        }))
    }

    /// Work out what a deposit buys. Reads only.
    fn plan<H: SkillBook>(
        &self,
        session: &TrainingSession,
        deposit: Gold,
        host: &H,
        now: DateTime<Utc>,
    ) -> std::result::Result<Plan, RejectReason> {
        let cost_per = session.cost_per_increment;
        if deposit < cost_per {
            return Err(RejectReason::DepositTooSmall);
        }
        let Some(increments) = deposit.as_u64().checked_div(cost_per.as_u64()) else {
            return Err(RejectReason::DepositTooSmall);
        };
        let increments = increments.min(u32::MAX as u64) as u32;
        let mut points = SkillValue::from_tenths(increments);

        let skills = host.skills(session.actor);
        let total = skill_total(&skills);
        let cap = self.config.server_skill_cap();
        if total >= cap {
            return Err(RejectReason::SkillCapReached);
        }

        let mut reducible: Vec<&SkillRecord> = skills
            .iter()
            .filter(|s| s.lock == SkillLock::AllowReduction && s.name != session.skill)
            .filter(|s| s.value > SkillValue::ZERO)
            .collect();
        let room = cap.saturating_sub(total);
        if points > room {
            if reducible.is_empty() {
                return Err(RejectReason::NoReducibleSkills);
            }
            let freeable = skill_total_of(&reducible);
            points = points.min(room + freeable);
        }

        let target = find_skill(&skills, &session.skill);
        if target.map(|s| s.lock) == Some(SkillLock::Frozen) {
            return Err(RejectReason::SkillFrozen);
        }
        let current = target.map(|s| s.value).unwrap_or(SkillValue::ZERO);

        points = points.min(self.config.training_cap().saturating_sub(current));
        if points == SkillValue::ZERO {
            return Err(RejectReason::TrainingCapReached);
        }

        if session.tier == TrainingTier::Advanced {
            let trained = host.trained_on(session.actor, &session.skill, now.date_naive());
            let remaining = self.config.daily_advanced_cap().saturating_sub(trained);
            if remaining == SkillValue::ZERO {
                return Err(RejectReason::DailyLimitReached);
            }
            points = points.min(remaining);
        }

        // largest skills give way first
        reducible.sort_by(|a, b| b.value.cmp(&a.value));
        let mut need = (total + points).saturating_sub(cap);
        let mut reductions = Vec::new();
        for skill in reducible {
            if need == SkillValue::ZERO {
                break;
            }
            let amount = need.min(skill.value);
            need = need.saturating_sub(amount);
            reductions.push(PlannedReduction {
                skill: skill.name.clone(),
                amount,
                remaining: skill.value.saturating_sub(amount),
            });
        }
        if need > SkillValue::ZERO {
            warn!(
                "Reductions for {} fall short by {}",
                session.actor, need
            );
            return Err(RejectReason::NoReducibleSkills);
        }

        Ok(Plan {
            current,
            points,
            reductions,
        })
    }
}

struct PlannedReduction {
    skill: String,
    amount: SkillValue,
    remaining: SkillValue,
}

struct Plan {
    current: SkillValue,
    points: SkillValue,
    reductions: Vec<PlannedReduction>,
}

fn find_skill<'a>(skills: &'a [SkillRecord], name: &str) -> Option<&'a SkillRecord> {
    skills.iter().find(|s| s.name == name)
}

fn skill_total_of(skills: &[&SkillRecord]) -> SkillValue {
    skills.iter().fold(SkillValue::ZERO, |acc, s| acc + s.value)
}

fn reject<H: Funds>(
    session: &TrainingSession,
    reason: RejectReason,
    deposit: Gold,
    host: &mut H,
) -> TrainingResolution {
    host.pay(session.actor, Payout::Coins(deposit));
    info!(
        "{} training in {} rejected ({:?}), refunded {}",
        session.actor, session.skill, reason, deposit
    );
    TrainingResolution::Rejected {
        reason,
        refund: deposit,
    }
}
