//! A small trading day: one provisioner, three customers

use bazaar_core::{
    ActorId, BuyLine, Gold, GoodsKind, ItemId, ItemView, SellEntry, SellLine, ShopDefinition,
    SkillLock, SkillValue, StockTemplate, Trader, VendorCapabilities, VendorProfile, Wallet,
};
use bazaar_engine::memory::MemoryHost;
use bazaar_engine::VendorEvent;
use chrono::{DateTime, Duration, Utc};

pub const VENDOR: ActorId = ActorId(100);
pub const MERCHANT: ActorId = ActorId(1);
pub const ANGLER: ActorId = ActorId(2);
pub const BEGGAR: ActorId = ActorId(3);

pub fn vendor_profile() -> VendorProfile {
    VendorProfile {
        id: VENDOR,
        name: "Hald the provisioner".into(),
        favorable: true,
        affiliation: Some("merchants".into()),
        capabilities: VendorCapabilities::default(),
        proficiencies: [
            ("fishing".to_string(), SkillValue::from_points(60.0)),
            ("camping".to_string(), SkillValue::from_points(45.0)),
        ]
        .into_iter()
        .collect(),
    }
}

fn stock(template: &str, name: &str, price: u64, amount: u32) -> StockTemplate {
    StockTemplate {
        template: template.into(),
        name: name.into(),
        price: Gold(price),
        amount,
        control_cost: 0,
        resellable: true,
        kind: GoodsKind::default(),
    }
}

fn buys(template: &str, name: &str, price: u64, resellable: bool) -> SellEntry {
    SellEntry {
        template: template.into(),
        name: name.into(),
        base_price: Gold(price),
        resellable,
    }
}

pub fn shop_definition() -> ShopDefinition {
    ShopDefinition {
        stock: vec![
            stock("bread", "loaf of bread", 6, 40),
            stock("fishing_pole", "fishing pole", 25, 8),
            stock("bedroll", "bedroll", 12, 15),
            StockTemplate {
                control_cost: 1,
                resellable: false,
                kind: GoodsKind::Companion,
                ..stock("pack_llama", "pack llama", 565, 4)
            },
        ],
        buys: vec![
            buys("fishing_pole", "fishing pole", 25, true),
            buys("raw_fish", "raw fish", 4, false),
            buys("bedroll", "bedroll", 12, true),
        ],
    }
}

pub fn host() -> MemoryHost {
    MemoryHost::new()
        .with_wallet(MERCHANT, Wallet::new(Gold(2_000), Gold(250_000)))
        .with_control_slots(MERCHANT, 2)
        .with_wallet(ANGLER, Wallet::new(Gold(1_500), Gold::ZERO))
        .with_skill(ANGLER, "fishing", 20.0, SkillLock::RaiseIntent)
        .with_skill(ANGLER, "camping", 38.0, SkillLock::RaiseIntent)
        .with_skill(ANGLER, "lumberjacking", 12.0, SkillLock::AllowReduction)
        .with_wallet(BEGGAR, Wallet::default())
}

pub fn merchant() -> Trader {
    Trader {
        affiliation: Some("merchants".into()),
        barter: SkillValue::from_points(40.0),
        ..Trader::new(MERCHANT)
    }
}

pub fn angler() -> Trader {
    Trader {
        barter: SkillValue::from_points(15.0),
        ..Trader::new(ANGLER)
    }
}

pub fn beggar() -> Trader {
    Trader {
        begging: SkillValue::from_points(30.0),
        begging_posture: true,
        ..Trader::new(BEGGAR)
    }
}

fn offered(id: u64, template: &str, amount: u32) -> SellLine {
    SellLine {
        item: ItemView {
            id: ItemId(id),
            template: template.into(),
            category: None,
            amount,
            trade_locked: false,
            contained_items: 0,
            owned_by_seller: true,
        },
        amount,
    }
}

/// Events for the day; deferred ones carry their due time
pub fn events(start: DateTime<Utc>) -> Vec<(VendorEvent, Option<DateTime<Utc>>)> {
    let mut locked_pole = offered(12, "fishing_pole", 1);
    locked_pole.item.trade_locked = true;

    vec![
        (VendorEvent::Listing, None),
        (
            VendorEvent::Buy {
                trader: merchant(),
                lines: vec![
                    BuyLine::stock("bread", 12),
                    BuyLine::stock("pack_llama", 3),
                    BuyLine::stock("fishing_pole", 10),
                ],
            },
            None,
        ),
        (
            VendorEvent::QuoteSell {
                trader: angler(),
                lines: vec![offered(10, "raw_fish", 30), offered(11, "fishing_pole", 2)],
            },
            None,
        ),
        (
            VendorEvent::Sell {
                trader: angler(),
                lines: vec![
                    offered(10, "raw_fish", 30),
                    offered(11, "fishing_pole", 2),
                    locked_pole,
                ],
            },
            None,
        ),
        (
            VendorEvent::Sell {
                trader: beggar(),
                lines: vec![offered(20, "bedroll", 1)],
            },
            None,
        ),
        (
            VendorEvent::RequestTraining {
                trader: angler(),
                skill: "fishing".into(),
            },
            None,
        ),
        (
            VendorEvent::Deposit {
                actor: ANGLER,
                amount: Gold(237),
            },
            Some(start + Duration::seconds(30)),
        ),
        (
            VendorEvent::RequestTraining {
                trader: angler(),
                skill: "camping".into(),
            },
            Some(start + Duration::seconds(45)),
        ),
        (
            VendorEvent::Deposit {
                actor: ANGLER,
                amount: Gold(700),
            },
            Some(start + Duration::seconds(60)),
        ),
        (VendorEvent::Restock, Some(start + Duration::hours(2) + Duration::minutes(1))),
        (VendorEvent::Listing, Some(start + Duration::hours(2) + Duration::minutes(2))),
    ]
}

/// Actors whose training counters matter today
pub fn trainees() -> Vec<(ActorId, &'static str)> {
    vec![(ANGLER, "fishing"), (ANGLER, "camping")]
}
