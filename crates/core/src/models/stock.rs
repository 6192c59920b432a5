//! Vendor stock models

use crate::types::{Gold, TemplateId};
use serde::{Deserialize, Serialize};

/// What a purchased unit materializes as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoodsKind {
    /// Plain item; stackable goods are delivered as a single stack
    Item { stackable: bool },
    /// A creature bound to the buyer as its new controller
    Companion,
}

impl Default for GoodsKind {
    fn default() -> Self {
        GoodsKind::Item { stackable: true }
    }
}

/// A buyable, finite, restockable row of a vendor's catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockEntry {
    pub template: TemplateId,
    pub name: String,
    pub base_price: Gold,
    pub quantity: u32,
    pub max_quantity: u32,
    /// Control slots consumed from the buyer per unit (companions)
    #[serde(default)]
    pub control_cost: u32,
    #[serde(default)]
    pub resellable: bool,
    #[serde(default)]
    pub kind: GoodsKind,
}

impl StockEntry {
    /// Invariant `quantity <= max_quantity`
    pub fn is_consistent(&self) -> bool {
        self.quantity <= self.max_quantity
    }

    pub fn is_sold_out(&self) -> bool {
        self.quantity == 0
    }

    /// Remove `qty` units. Fails without change if not enough remain.
    pub fn consume(&mut self, qty: u32) -> bool {
        if qty > self.quantity {
            return false;
        }
        self.quantity -= qty;
        true
    }

    /// Free capacity left before `max_quantity` is reached
    pub fn headroom(&self) -> u32 {
        self.max_quantity.saturating_sub(self.quantity)
    }
}

/// A row of the vendor's sell table: what it pays for an item type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellEntry {
    pub template: TemplateId,
    pub name: String,
    pub base_price: Gold,
    /// Whether sold goods go back on sale (restock or resale shelf)
    #[serde(default)]
    pub resellable: bool,
}

/// Static stock row provided by a shop definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTemplate {
    pub template: TemplateId,
    pub name: String,
    pub price: Gold,
    pub amount: u32,
    #[serde(default)]
    pub control_cost: u32,
    #[serde(default)]
    pub resellable: bool,
    #[serde(default)]
    pub kind: GoodsKind,
}

/// Static catalog of a vendor "type" (what it sells and what it buys)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopDefinition {
    pub stock: Vec<StockTemplate>,
    #[serde(default)]
    pub buys: Vec<SellEntry>,
}

/// Persistable catalog state; enough to rebuild quantities after a restart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub version: u32,
    pub entries: Vec<StockEntry>,
}
