//! Host services the economy consumes
//!
//! The engine never owns money, items or skills. It asks the host through
//! these traits. Mutating calls that cannot fail from the economy's point of
//! view return nothing; the only fallible one is a withdrawal.

use crate::catalog::ShelfLot;
use bazaar_core::{
    ActorId, FundSource, Gold, ItemId, Payout, Result, SkillRecord, SkillValue, TemplateId,
};
use chrono::NaiveDate;

/// An actor's primary and reserve fund stores
pub trait Funds {
    fn balance(&self, actor: ActorId, source: FundSource) -> Gold;

    /// Withdraw from exactly one source, all or nothing
    fn withdraw(&mut self, actor: ActorId, source: FundSource, amount: Gold) -> Result<()>;

    /// Hand currency or a bank check to the actor
    fn pay(&mut self, actor: ActorId, payout: Payout);
}

/// Item and creature storage
pub trait World {
    /// Remaining control slots (e.g. follower capacity) of an actor
    fn free_control_slots(&self, actor: ActorId) -> u32;

    fn spawn_goods(&mut self, owner: ActorId, template: &TemplateId, amount: u32, stackable: bool);

    /// Create a companion and bind it to its new controller
    fn spawn_companion(&mut self, controller: ActorId, template: &TemplateId);

    /// Materialize units of a shelf lot back into an actor's possession
    fn deliver_lot(&mut self, owner: ActorId, lot: &ShelfLot, amount: u32);

    /// Remove units of an item from an actor's possession
    fn take_item(&mut self, owner: ActorId, item: ItemId, amount: u32);
}

/// Skill storage and the per-day training counter
pub trait SkillBook {
    fn skills(&self, actor: ActorId) -> Vec<SkillRecord>;

    fn set_skill(&mut self, actor: ActorId, skill: &str, value: SkillValue);

    /// Points trained at the advanced tier on `day`
    fn trained_on(&self, actor: ActorId, skill: &str, day: NaiveDate) -> SkillValue;

    fn record_training(&mut self, actor: ActorId, skill: &str, day: NaiveDate, points: SkillValue);
}
