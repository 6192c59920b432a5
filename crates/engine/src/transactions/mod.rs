//! Buy and sell processing against a vendor's catalog and an actor's funds

mod buy;
mod sell;

use crate::config::EconomyConfig;
use bazaar_core::{Error, Result, TradeType, Trader, VendorProfile};
use tracing::warn;

/// Validates and executes trades. Holds no state of its own; the catalog
/// and the host are passed in per call.
#[derive(Debug, Clone)]
pub struct TransactionProcessor {
    config: EconomyConfig,
}

impl TransactionProcessor {
    pub fn new(config: EconomyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }
}

/// Check that a vendor does this kind of business with this trader
pub fn check_access(vendor: &VendorProfile, trader: &Trader, trade: TradeType) -> Result<()> {
    let caps = &vendor.capabilities;

    if caps.guild_only && !vendor.shares_affiliation(trader.affiliation.as_deref()) {
        warn!(
            "Vendor {} refused {} from non-member {}",
            vendor.name,
            trade.as_str(),
            trader.id
        );
        return Err(Error::VendorAccessDenied(format!(
            "{} only deals with its own guild",
            vendor.name
        )));
    }

    let offered = match trade {
        TradeType::Buy => caps.sells,
        TradeType::Sell => caps.buys,
        TradeType::Train => caps.teaches,
    };
    if !offered {
        return Err(Error::VendorAccessDenied(format!(
            "{} does not {}",
            vendor.name,
            match trade {
                TradeType::Buy => "sell goods",
                TradeType::Sell => "buy goods",
                TradeType::Train => "teach",
            }
        )));
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod testkit {
    use crate::catalog::StockCatalog;
    use crate::pricing::Multiplier;
    use bazaar_core::{
        ActorId, Gold, GoodsKind, SellEntry, ShopDefinition, StockTemplate, Trader,
        VendorCapabilities, VendorProfile,
    };

    pub const BUYER: ActorId = ActorId(7);

    pub fn vendor() -> VendorProfile {
        VendorProfile {
            id: ActorId(1),
            name: "Hald the provisioner".into(),
            favorable: true,
            affiliation: Some("merchants".into()),
            capabilities: VendorCapabilities::default(),
            proficiencies: Default::default(),
        }
    }

    pub fn trader() -> Trader {
        Trader::new(BUYER)
    }

    fn stock(template: &str, price: u64, amount: u32) -> StockTemplate {
        StockTemplate {
            template: template.into(),
            name: template.replace('_', " "),
            price: Gold(price),
            amount,
            control_cost: 0,
            resellable: true,
            kind: GoodsKind::default(),
        }
    }

    pub fn definition() -> ShopDefinition {
        ShopDefinition {
            stock: vec![
                stock("torch", 5, 4),
                stock("iron_ingot", 40, 100),
                StockTemplate {
                    control_cost: 2,
                    resellable: false,
                    kind: GoodsKind::Companion,
                    ..stock("pack_horse", 600, 5)
                },
                StockTemplate {
                    kind: GoodsKind::Item { stackable: false },
                    ..stock("war_axe", 60_000, 10)
                },
            ],
            buys: vec![
                SellEntry {
                    template: "iron_ingot".into(),
                    name: "iron ingot".into(),
                    base_price: Gold(20),
                    resellable: true,
                },
                SellEntry {
                    template: "wolf_pelt".into(),
                    name: "wolf pelt".into(),
                    base_price: Gold(30),
                    resellable: false,
                },
                SellEntry {
                    template: "gold_bar".into(),
                    name: "gold bar".into(),
                    base_price: Gold(30_000),
                    resellable: false,
                },
            ],
        }
    }

    pub fn catalog() -> StockCatalog {
        StockCatalog::load(&definition(), Multiplier::NEUTRAL)
    }
}

#[cfg(test)]
mod tests {
    use super::testkit::*;
    use super::*;

    #[test]
    fn test_guild_only_vendor_denies_outsiders() {
        let mut v = vendor();
        v.capabilities.guild_only = true;
        let mut t = trader();

        assert!(matches!(
            check_access(&v, &t, TradeType::Buy),
            Err(Error::VendorAccessDenied(_))
        ));

        t.affiliation = Some("merchants".into());
        assert!(check_access(&v, &t, TradeType::Buy).is_ok());
    }

    #[test]
    fn test_missing_capability_denies_trade() {
        let mut v = vendor();
        v.capabilities.buys = false;
        assert!(check_access(&v, &trader(), TradeType::Sell).is_err());
        assert!(check_access(&v, &trader(), TradeType::Buy).is_ok());
    }
}
