//! Resale shelf: display-only store for resold goods the catalog could not absorb

use bazaar_core::{Gold, LotId, TemplateId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Goods sold to the vendor and put back on display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelfLot {
    pub id: LotId,
    pub template: TemplateId,
    pub name: String,
    pub amount: u32,
    /// Sell-table base price of the goods; buy-back is derived from it
    pub sell_price: Gold,
    pub archived_at: DateTime<Utc>,
}

impl ShelfLot {
    fn is_expired(&self, now: DateTime<Utc>, decay: Duration) -> bool {
        self.archived_at + decay <= now
    }

    /// What the vendor charges to sell this lot back
    pub fn buy_back_price(&self, multiplier: f64) -> Gold {
        let price = (self.sell_price.as_u64() as f64 * multiplier).round() as u64;
        Gold(price.max(1))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResaleShelf {
    lots: BTreeMap<LotId, ShelfLot>,
    next_id: u64,
}

impl ResaleShelf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put goods on display and return the new lot id
    pub fn archive(
        &mut self,
        template: TemplateId,
        name: String,
        amount: u32,
        sell_price: Gold,
        now: DateTime<Utc>,
    ) -> LotId {
        self.next_id += 1;
        let id = LotId(self.next_id);
        self.lots.insert(
            id,
            ShelfLot {
                id,
                template,
                name,
                amount,
                sell_price,
                archived_at: now,
            },
        );
        id
    }

    pub fn get(&self, lot: LotId) -> Option<&ShelfLot> {
        self.lots.get(&lot)
    }

    /// Remove `amount` units from a lot, returning the taken portion.
    /// Empty lots are dropped from the shelf.
    pub fn take(&mut self, lot: LotId, amount: u32) -> Option<ShelfLot> {
        let entry = self.lots.get_mut(&lot)?;
        if amount == 0 || amount > entry.amount {
            return None;
        }

        entry.amount -= amount;
        let mut taken = entry.clone();
        taken.amount = amount;

        if entry.amount == 0 {
            self.lots.remove(&lot);
        }
        Some(taken)
    }

    /// Drop lots that sat on the shelf past the decay time
    pub fn purge_expired(&mut self, now: DateTime<Utc>, decay: Duration) -> usize {
        let before = self.lots.len();
        self.lots.retain(|_, lot| !lot.is_expired(now, decay));
        before - self.lots.len()
    }

    pub fn lots(&self) -> impl Iterator<Item = &ShelfLot> {
        self.lots.values()
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }
}
