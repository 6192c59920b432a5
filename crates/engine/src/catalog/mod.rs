//! Per-vendor stock catalog and sell table
//!
//! Effective prices are never stored: they are derived from the base price
//! and the current sentiment multiplier whenever they are needed, so a
//! sentiment change applies catalog-wide without touching any entry.

mod shelf;

pub use shelf::{ResaleShelf, ShelfLot};

use crate::pricing::Multiplier;
use bazaar_core::{
    BuyTarget, CatalogSnapshot, Error, Gold, Result, SellEntry, ShopDefinition, StockEntry,
    StockTemplate, TemplateId,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// One row of a buy listing, as a vendor would show it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRow {
    pub target: BuyTarget,
    pub name: String,
    pub unit_price: Gold,
    pub available: u32,
}

#[derive(Debug, Clone)]
pub struct StockCatalog {
    version: u32,
    entries: Vec<StockEntry>,
    index: HashMap<TemplateId, usize>,
    sell_table: BTreeMap<TemplateId, SellEntry>,
    shelf: ResaleShelf,
}

impl StockCatalog {
    /// Build a catalog from a shop definition, scaling starting stock by
    /// the sentiment quantity factor
    pub fn load(definition: &ShopDefinition, multiplier: Multiplier) -> Self {
        let entries = definition
            .stock
            .iter()
            .map(|t| entry_from_template(t, t.price, t.amount, multiplier))
            .collect();
        Self::assemble(1, entries, definition.buys.clone())
    }

    /// Like [`StockCatalog::load`], with a random variation on every price
    /// and starting amount
    pub fn load_with_jitter<R: Rng + ?Sized>(
        definition: &ShopDefinition,
        multiplier: Multiplier,
        rng: &mut R,
    ) -> Self {
        let entries = definition
            .stock
            .iter()
            .map(|t| {
                let price = Gold(jitter(t.price.as_u64(), rng));
                let amount = jitter(t.amount as u64, rng).min(u32::MAX as u64) as u32;
                entry_from_template(t, price, amount, multiplier)
            })
            .collect();
        Self::assemble(1, entries, definition.buys.clone())
    }

    /// Rebuild a catalog from a persisted snapshot. Any corrupt entry
    /// rejects the whole snapshot.
    pub fn from_snapshot(snapshot: CatalogSnapshot, sell_table: Vec<SellEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in &snapshot.entries {
            if !entry.is_consistent() {
                return Err(Error::CatalogCorruption(format!(
                    "{}: quantity {} exceeds max {}",
                    entry.template, entry.quantity, entry.max_quantity
                )));
            }
            if !seen.insert(entry.template.clone()) {
                return Err(Error::CatalogCorruption(format!(
                    "duplicate entry for {}",
                    entry.template
                )));
            }
        }
        Ok(Self::assemble(snapshot.version, snapshot.entries, sell_table))
    }

    /// Throw away every entry and rebuild from the definition. The resale
    /// shelf survives a reload.
    pub fn reload(&mut self, definition: &ShopDefinition, multiplier: Multiplier) {
        let shelf = std::mem::take(&mut self.shelf);
        let version = self.version + 1;
        *self = Self::load(definition, multiplier);
        self.version = version;
        self.shelf = shelf;
        debug!("Catalog reloaded at version {}", version);
    }

    fn assemble(version: u32, entries: Vec<StockEntry>, sells: Vec<SellEntry>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.template.clone(), i))
            .collect();
        let sell_table = sells.into_iter().map(|s| (s.template.clone(), s)).collect();

        Self {
            version,
            entries,
            index,
            sell_table,
            shelf: ResaleShelf::new(),
        }
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            version: self.version,
            entries: self.entries.clone(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn lookup(&self, template: &TemplateId) -> Option<&StockEntry> {
        self.index.get(template).map(|&i| &self.entries[i])
    }

    fn lookup_mut(&mut self, template: &TemplateId) -> Option<&mut StockEntry> {
        let i = *self.index.get(template)?;
        self.entries.get_mut(i)
    }

    pub fn entries(&self) -> &[StockEntry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [StockEntry] {
        &mut self.entries
    }

    /// Remove `qty` units from an entry. Fails if `qty` exceeds what is left.
    pub fn consume(&mut self, template: &TemplateId, qty: u32) -> bool {
        match self.lookup_mut(template) {
            Some(entry) => entry.consume(qty),
            None => false,
        }
    }

    /// Merge returned goods back into a resellable entry, all or nothing
    pub fn restock(&mut self, template: &TemplateId, qty: u32) -> bool {
        match self.lookup_mut(template) {
            Some(entry) if entry.resellable && entry.headroom() >= qty => {
                entry.quantity += qty;
                true
            }
            _ => false,
        }
    }

    /// Merge as many returned units as capacity allows; returns how many fit
    pub fn restock_up_to(&mut self, template: &TemplateId, qty: u32) -> u32 {
        match self.lookup_mut(template) {
            Some(entry) if entry.resellable => {
                let accepted = qty.min(entry.headroom());
                entry.quantity += accepted;
                accepted
            }
            _ => 0,
        }
    }

    pub fn sell_entry(&self, template: &TemplateId) -> Option<&SellEntry> {
        self.sell_table.get(template)
    }

    pub fn sell_table(&self) -> impl Iterator<Item = &SellEntry> {
        self.sell_table.values()
    }

    pub fn shelf(&self) -> &ResaleShelf {
        &self.shelf
    }

    pub fn shelf_mut(&mut self) -> &mut ResaleShelf {
        &mut self.shelf
    }

    /// Effective price of one unit of an entry right now
    pub fn effective_price(entry: &StockEntry, multiplier: Multiplier) -> Gold {
        multiplier.apply_price(entry.base_price)
    }

    /// What the vendor shows to a buyer: in-stock entries at their effective
    /// price followed by shelf lots, capped at `max_rows`
    pub fn listing(
        &self,
        multiplier: Multiplier,
        buy_back_multiplier: f64,
        max_rows: usize,
    ) -> Vec<ListingRow> {
        let stock = self
            .entries
            .iter()
            .filter(|e| !e.is_sold_out())
            .filter(|e| {
                if e.is_consistent() {
                    true
                } else {
                    warn!("Skipping corrupt catalog entry {} in listing", e.template);
                    false
                }
            })
            .map(|e| ListingRow {
                target: BuyTarget::Stock(e.template.clone()),
                name: e.name.clone(),
                unit_price: Self::effective_price(e, multiplier),
                available: e.quantity,
            });

        let lots = self.shelf.lots().map(|lot| ListingRow {
            target: BuyTarget::Shelf(lot.id),
            name: lot.name.clone(),
            unit_price: lot.buy_back_price(buy_back_multiplier),
            available: lot.amount,
        });

        stock.chain(lots).take(max_rows).collect()
    }
}

fn entry_from_template(
    template: &StockTemplate,
    price: Gold,
    amount: u32,
    multiplier: Multiplier,
) -> StockEntry {
    let quantity = multiplier.apply_quantity(amount);
    StockEntry {
        template: template.template.clone(),
        name: template.name.clone(),
        base_price: price,
        quantity,
        max_quantity: quantity,
        control_cost: template.control_cost,
        resellable: template.resellable,
        kind: template.kind,
    }
}

/// Average of three rolls in 75..=125 percent, applied to `value` (floor 1)
fn jitter<R: Rng + ?Sized>(value: u64, rng: &mut R) -> u64 {
    let total: u64 = (0..3).map(|_| rng.gen_range(75..=125u64)).sum();
    let percent = (total / 3).max(1);
    ((value as f64 * percent as f64 / 100.0).round() as u64).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::{GoodsKind, LotId};
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn definition() -> ShopDefinition {
        ShopDefinition {
            stock: vec![
                StockTemplate {
                    template: "bread".into(),
                    name: "loaf of bread".into(),
                    price: Gold(6),
                    amount: 20,
                    control_cost: 0,
                    resellable: true,
                    kind: GoodsKind::Item { stackable: true },
                },
                StockTemplate {
                    template: "horse".into(),
                    name: "horse".into(),
                    price: Gold(550),
                    amount: 4,
                    control_cost: 1,
                    resellable: false,
                    kind: GoodsKind::Companion,
                },
            ],
            buys: vec![SellEntry {
                template: "bread".into(),
                name: "loaf of bread".into(),
                base_price: Gold(3),
                resellable: true,
            }],
        }
    }

    #[test]
    fn test_load_scales_quantity_by_sentiment() {
        let catalog = StockCatalog::load(
            &definition(),
            Multiplier {
                price: 0.55,
                quantity: 1.45,
            },
        );
        let bread = catalog.lookup(&"bread".into()).unwrap();
        assert_eq!(bread.quantity, 29);
        assert_eq!(bread.max_quantity, 29);
        // prices are not stored scaled
        assert_eq!(bread.base_price, Gold(6));
    }

    #[test]
    fn test_consume_and_restock() {
        let mut catalog = StockCatalog::load(&definition(), Multiplier::NEUTRAL);
        let bread = TemplateId::from("bread");

        assert!(!catalog.consume(&bread, 21));
        assert!(catalog.consume(&bread, 5));
        assert_eq!(catalog.lookup(&bread).unwrap().quantity, 15);

        assert!(!catalog.restock(&bread, 6));
        assert!(catalog.restock(&bread, 5));
        assert_eq!(catalog.restock_up_to(&bread, 3), 0);

        catalog.consume(&bread, 2);
        assert_eq!(catalog.restock_up_to(&bread, 3), 2);
        assert_eq!(catalog.lookup(&bread).unwrap().quantity, 20);
    }

    #[test]
    fn test_non_resellable_entry_refuses_restock() {
        let mut catalog = StockCatalog::load(&definition(), Multiplier::NEUTRAL);
        let horse = TemplateId::from("horse");
        catalog.consume(&horse, 1);
        assert!(!catalog.restock(&horse, 1));
        assert_eq!(catalog.restock_up_to(&horse, 1), 0);
    }

    #[test]
    fn test_snapshot_rebuilds_and_rejects_corruption() {
        let mut catalog = StockCatalog::load(&definition(), Multiplier::NEUTRAL);
        catalog.consume(&"bread".into(), 7);
        let snap = catalog.snapshot();

        let rebuilt = StockCatalog::from_snapshot(snap.clone(), definition().buys).unwrap();
        assert_eq!(rebuilt.lookup(&"bread".into()).unwrap().quantity, 13);
        assert_eq!(rebuilt.version(), 1);

        let mut bad = snap;
        bad.entries[0].quantity = bad.entries[0].max_quantity + 1;
        assert!(matches!(
            StockCatalog::from_snapshot(bad, Vec::new()),
            Err(Error::CatalogCorruption(_))
        ));
    }

    #[test]
    fn test_reload_bumps_version_and_keeps_shelf() {
        let mut catalog = StockCatalog::load(&definition(), Multiplier::NEUTRAL);
        catalog.consume(&"bread".into(), 20);
        catalog
            .shelf_mut()
            .archive("bread".into(), "loaf of bread".into(), 3, Gold(3), Utc::now());

        catalog.reload(&definition(), Multiplier::NEUTRAL);
        assert_eq!(catalog.version(), 2);
        assert_eq!(catalog.lookup(&"bread".into()).unwrap().quantity, 20);
        assert_eq!(catalog.shelf().len(), 1);
    }

    #[test]
    fn test_listing_hides_sold_out_and_appends_shelf() {
        let mut catalog = StockCatalog::load(&definition(), Multiplier::NEUTRAL);
        catalog.consume(&"horse".into(), 4);
        catalog
            .shelf_mut()
            .archive("bread".into(), "loaf of bread".into(), 3, Gold(3), Utc::now());

        let rows = catalog.listing(
            Multiplier {
                price: 0.5,
                quantity: 1.0,
            },
            1.9,
            250,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].unit_price, Gold(3));
        assert_eq!(rows[1].target, BuyTarget::Shelf(LotId(1)));
        assert_eq!(rows[1].unit_price, Gold(6));

        assert_eq!(catalog.listing(Multiplier::NEUTRAL, 1.9, 1).len(), 1);
    }

    #[test]
    fn test_jitter_stays_within_band() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let v = jitter(100, &mut rng);
            assert!((75..=125).contains(&v));
        }
        let catalog = StockCatalog::load_with_jitter(&definition(), Multiplier::NEUTRAL, &mut rng);
        assert!(catalog.entries().iter().all(|e| e.is_consistent() && e.quantity >= 1));
    }
}
