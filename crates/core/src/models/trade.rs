//! Trade-related models

use crate::models::wallet::{FundSource, Payout};
use crate::types::{Gold, ItemId, LotId, TemplateId};
use serde::{Deserialize, Serialize};

/// Trade type, as recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeType {
    Buy,
    Sell,
    Train,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Buy => "BUY",
            TradeType::Sell => "SELL",
            TradeType::Train => "TRAIN",
        }
    }
}

/// What a buy line points at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuyTarget {
    /// A catalog stock entry
    Stock(TemplateId),
    /// A previously sold lot on the resale shelf
    Shelf(LotId),
}

/// One requested line of a purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyLine {
    pub target: BuyTarget,
    pub amount: u32,
}

impl BuyLine {
    pub fn stock(template: impl Into<TemplateId>, amount: u32) -> Self {
        Self {
            target: BuyTarget::Stock(template.into()),
            amount,
        }
    }

    pub fn shelf(lot: LotId, amount: u32) -> Self {
        Self {
            target: BuyTarget::Shelf(lot),
            amount,
        }
    }
}

/// A line that survived validation and was delivered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoughtLine {
    pub target: BuyTarget,
    pub name: String,
    pub amount: u32,
    pub unit_price: Gold,
    pub subtotal: Gold,
}

/// How much of a purchase request was honoured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FillStatus {
    Full,
    Partial,
    /// Every line was dropped; nothing was charged
    Nothing,
}

/// Result of a purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyOutcome {
    pub lines: Vec<BoughtLine>,
    pub total_cost: Gold,
    pub fully_filled: bool,
    /// `None` when nothing was charged
    pub paid_from: Option<FundSource>,
}

impl BuyOutcome {
    pub fn status(&self) -> FillStatus {
        if self.lines.is_empty() {
            FillStatus::Nothing
        } else if self.fully_filled {
            FillStatus::Full
        } else {
            FillStatus::Partial
        }
    }

    pub fn paid_from_reserve(&self) -> bool {
        self.paid_from == Some(FundSource::Reserve)
    }
}

/// Host-side description of an item an actor offers to a vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub id: ItemId,
    pub template: TemplateId,
    /// Item category, checked against vendors that only accept some
    #[serde(default)]
    pub category: Option<String>,
    /// Units in the stack
    pub amount: u32,
    /// Locked for trade, or sitting in a locked container
    #[serde(default)]
    pub trade_locked: bool,
    /// Number of items inside, when the item is a container
    #[serde(default)]
    pub contained_items: u32,
    /// Whether the item is actually in the seller's possession
    #[serde(default = "default_true")]
    pub owned_by_seller: bool,
}

fn default_true() -> bool {
    true
}

/// One offered line of a sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellLine {
    pub item: ItemView,
    pub amount: u32,
}

/// Where sold goods ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Settlement {
    /// Returned to the matching stock entry, with any overflow on the shelf
    Resold { restocked: u32, shelved: u32 },
    /// Removed from the world
    Destroyed,
}

/// A settled sale line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoldLine {
    pub item: ItemId,
    pub template: TemplateId,
    pub amount: u32,
    pub unit_price: Gold,
    pub subtotal: Gold,
    pub settlement: Settlement,
}

/// Result of a sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellOutcome {
    pub lines: Vec<SoldLine>,
    pub total_payment: Gold,
    /// `None` when nothing was sold
    pub payout: Option<Payout>,
    /// Seller was begging (and not a guild member) during the sale
    pub begging_applied: bool,
}

impl SellOutcome {
    pub fn nothing_sold() -> Self {
        Self {
            lines: Vec::new(),
            total_payment: Gold::ZERO,
            payout: None,
            begging_applied: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// What a vendor would pay for an offered item, without selling it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellQuote {
    pub item: ItemId,
    pub name: String,
    pub unit_price: Gold,
    pub amount: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_outcome_status() {
        let mut outcome = BuyOutcome {
            lines: Vec::new(),
            total_cost: Gold::ZERO,
            fully_filled: true,
            paid_from: None,
        };
        assert_eq!(outcome.status(), FillStatus::Nothing);

        outcome.lines.push(BoughtLine {
            target: BuyTarget::Stock("apple".into()),
            name: "apple".into(),
            amount: 4,
            unit_price: Gold(3),
            subtotal: Gold(12),
        });
        outcome.fully_filled = false;
        outcome.paid_from = Some(FundSource::Reserve);
        assert_eq!(outcome.status(), FillStatus::Partial);
        assert!(outcome.paid_from_reserve());
    }
}
