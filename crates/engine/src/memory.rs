//! In-memory host used by tests and the simulator

use crate::catalog::ShelfLot;
use crate::ports::{Funds, SkillBook, World};
use bazaar_core::{
    ActorId, FundSource, Gold, ItemId, Payout, Result, SkillLock, SkillRecord, SkillValue,
    TemplateId, Wallet,
};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Goods an actor received from a vendor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holding {
    pub template: TemplateId,
    pub amount: u32,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    wallets: HashMap<ActorId, Wallet>,
    /// Coins and checks handed out, in order
    payouts: HashMap<ActorId, Vec<Payout>>,
    control_slots: HashMap<ActorId, u32>,
    holdings: HashMap<ActorId, Vec<Holding>>,
    companions: HashMap<ActorId, Vec<TemplateId>>,
    removed: Vec<(ActorId, ItemId, u32)>,
    skills: HashMap<ActorId, Vec<SkillRecord>>,
    /// Last advanced-tier training day and points per actor and skill
    daily: HashMap<(ActorId, String), (NaiveDate, SkillValue)>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wallet(mut self, actor: ActorId, wallet: Wallet) -> Self {
        self.wallets.insert(actor, wallet);
        self
    }

    pub fn with_control_slots(mut self, actor: ActorId, slots: u32) -> Self {
        self.control_slots.insert(actor, slots);
        self
    }

    pub fn with_skill(mut self, actor: ActorId, name: &str, points: f64, lock: SkillLock) -> Self {
        self.skills
            .entry(actor)
            .or_default()
            .push(SkillRecord::new(name, SkillValue::from_points(points), lock));
        self
    }

    pub fn wallet(&self, actor: ActorId) -> Wallet {
        self.wallets.get(&actor).copied().unwrap_or_default()
    }

    pub fn payouts(&self, actor: ActorId) -> &[Payout] {
        self.payouts.get(&actor).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sum of every coin payout (bank checks excluded)
    pub fn coins_paid(&self, actor: ActorId) -> Gold {
        self.payouts(actor)
            .iter()
            .filter_map(|p| match p {
                Payout::Coins(g) => Some(*g),
                Payout::BankCheck(_) => None,
            })
            .fold(Gold::ZERO, |acc, g| acc + g)
    }

    pub fn holdings(&self, actor: ActorId) -> &[Holding] {
        self.holdings.get(&actor).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total units of a template an actor received
    pub fn held(&self, actor: ActorId, template: &str) -> u32 {
        self.holdings(actor)
            .iter()
            .filter(|h| h.template.as_str() == template)
            .map(|h| h.amount)
            .sum()
    }

    pub fn companions(&self, actor: ActorId) -> &[TemplateId] {
        self.companions.get(&actor).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn removed_items(&self) -> &[(ActorId, ItemId, u32)] {
        &self.removed
    }

    pub fn skill(&self, actor: ActorId, name: &str) -> SkillValue {
        self.skills
            .get(&actor)
            .and_then(|skills| skills.iter().find(|s| s.name == name))
            .map(|s| s.value)
            .unwrap_or(SkillValue::ZERO)
    }

    /// Seed the daily counter as if training already happened on `day`
    pub fn set_trained(&mut self, actor: ActorId, skill: &str, day: NaiveDate, points: SkillValue) {
        self.daily.insert((actor, skill.to_string()), (day, points));
    }
}

impl Funds for MemoryHost {
    fn balance(&self, actor: ActorId, source: FundSource) -> Gold {
        self.wallet(actor).balance(source)
    }

    fn withdraw(&mut self, actor: ActorId, source: FundSource, amount: Gold) -> Result<()> {
        self.wallets
            .entry(actor)
            .or_default()
            .withdraw(source, amount)
    }

    /// Coins land in the primary store; bank checks are only recorded
    fn pay(&mut self, actor: ActorId, payout: Payout) {
        if let Payout::Coins(amount) = payout {
            self.wallets.entry(actor).or_default().primary += amount;
        }
        self.payouts.entry(actor).or_default().push(payout);
    }
}

impl World for MemoryHost {
    fn free_control_slots(&self, actor: ActorId) -> u32 {
        self.control_slots.get(&actor).copied().unwrap_or(0)
    }

    fn spawn_goods(&mut self, owner: ActorId, template: &TemplateId, amount: u32, stackable: bool) {
        let holdings = self.holdings.entry(owner).or_default();
        if stackable {
            holdings.push(Holding {
                template: template.clone(),
                amount,
            });
        } else {
            holdings.extend((0..amount).map(|_| Holding {
                template: template.clone(),
                amount: 1,
            }));
        }
    }

    fn spawn_companion(&mut self, controller: ActorId, template: &TemplateId) {
        if let Some(slots) = self.control_slots.get_mut(&controller) {
            *slots = slots.saturating_sub(1);
        }
        self.companions
            .entry(controller)
            .or_default()
            .push(template.clone());
    }

    fn deliver_lot(&mut self, owner: ActorId, lot: &ShelfLot, amount: u32) {
        self.holdings.entry(owner).or_default().push(Holding {
            template: lot.template.clone(),
            amount,
        });
    }

    fn take_item(&mut self, owner: ActorId, item: ItemId, amount: u32) {
        self.removed.push((owner, item, amount));
    }
}

impl SkillBook for MemoryHost {
    fn skills(&self, actor: ActorId) -> Vec<SkillRecord> {
        self.skills.get(&actor).cloned().unwrap_or_default()
    }

    fn set_skill(&mut self, actor: ActorId, skill: &str, value: SkillValue) {
        let skills = self.skills.entry(actor).or_default();
        match skills.iter_mut().find(|s| s.name == skill) {
            Some(record) => record.value = value,
            None => skills.push(SkillRecord::new(skill, value, SkillLock::default())),
        }
    }

    fn trained_on(&self, actor: ActorId, skill: &str, day: NaiveDate) -> SkillValue {
        match self.daily.get(&(actor, skill.to_string())) {
            Some((recorded, points)) if *recorded == day => *points,
            _ => SkillValue::ZERO,
        }
    }

    fn record_training(&mut self, actor: ActorId, skill: &str, day: NaiveDate, points: SkillValue) {
        let total = self.trained_on(actor, skill, day) + points;
        self.daily.insert((actor, skill.to_string()), (day, total));
    }
}
