use super::{check_access, TransactionProcessor};
use crate::catalog::StockCatalog;
use crate::ports::{Funds, World};
use crate::pricing::Multiplier;
use bazaar_core::{
    BoughtLine, BuyLine, BuyOutcome, BuyTarget, Error, FundSource, Gold, GoodsKind, Payout,
    Result, TradeType, Trader, VendorProfile,
};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// A line that survived validation, waiting for payment
struct PlannedLine {
    target: BuyTarget,
    name: String,
    amount: u32,
    unit_price: Gold,
    kind: GoodsKind,
}

impl PlannedLine {
    fn subtotal(&self) -> Gold {
        self.unit_price * self.amount as u64
    }
}

impl TransactionProcessor {
    /// Buy goods from a vendor.
    ///
    /// Lines are clamped to available stock and the buyer's control slots;
    /// a line that clamps to zero is dropped. Nothing is taken from stock
    /// until the whole payment has been withdrawn from a single fund source.
    pub fn buy<H: Funds + World>(
        &self,
        vendor: &VendorProfile,
        trader: &Trader,
        catalog: &mut StockCatalog,
        multiplier: Multiplier,
        lines: &[BuyLine],
        host: &mut H,
    ) -> Result<BuyOutcome> {
        check_access(vendor, trader, TradeType::Buy)?;

        let (planned, mut fully_filled) =
            self.plan_purchase(trader, &*catalog, multiplier, lines, &*host);
        if planned.is_empty() {
            debug!("Nothing to buy for {} at {}", trader.id, vendor.name);
            return Ok(BuyOutcome {
                lines: Vec::new(),
                total_cost: Gold::ZERO,
                fully_filled: fully_filled && lines.is_empty(),
                paid_from: None,
            });
        }

        let total = planned
            .iter()
            .fold(Gold::ZERO, |acc, line| acc + line.subtotal());
        let source = self.choose_fund_source(trader, total, &*host)?;
        host.withdraw(trader.id, source, total)?;

        let mut bought = Vec::with_capacity(planned.len());
        let mut refund = Gold::ZERO;
        for line in planned {
            if !Self::deliver(trader, catalog, &line, host) {
                refund += line.subtotal();
                fully_filled = false;
                continue;
            }
            bought.push(BoughtLine {
                subtotal: line.subtotal(),
                target: line.target,
                name: line.name,
                amount: line.amount,
                unit_price: line.unit_price,
            });
        }

        if !refund.is_zero() {
            host.pay(trader.id, Payout::Coins(refund));
        }

        let total_cost = total.saturating_sub(refund);
        info!(
            "{} bought {} line(s) from {} for {} ({:?}{})",
            trader.id,
            bought.len(),
            vendor.name,
            total_cost,
            source,
            if fully_filled { "" } else { ", partial" }
        );

        Ok(BuyOutcome {
            lines: bought,
            total_cost,
            fully_filled,
            paid_from: Some(source),
        })
    }

    /// Validation pass. Reads the catalog and the host, mutates neither.
    fn plan_purchase<H: World>(
        &self,
        trader: &Trader,
        catalog: &StockCatalog,
        multiplier: Multiplier,
        lines: &[BuyLine],
        host: &H,
    ) -> (Vec<PlannedLine>, bool) {
        let mut slots = host.free_control_slots(trader.id);
        let mut reserved: HashMap<BuyTarget, u32> = HashMap::new();
        let mut planned = Vec::new();
        let mut fully_filled = true;

        for line in lines {
            if line.amount == 0 {
                continue;
            }
            let already = reserved.get(&line.target).copied().unwrap_or(0);

            let (template, name, available, unit_price, control_cost, kind) = match &line.target {
                BuyTarget::Stock(template) => match catalog.lookup(template) {
                    Some(entry) if entry.is_consistent() => (
                        template.clone(),
                        entry.name.clone(),
                        entry.quantity,
                        StockCatalog::effective_price(entry, multiplier),
                        entry.control_cost,
                        entry.kind,
                    ),
                    Some(entry) => {
                        warn!(
                            "Refusing corrupt entry {} ({} > {})",
                            template, entry.quantity, entry.max_quantity
                        );
                        fully_filled = false;
                        continue;
                    }
                    None => {
                        debug!("{} is not on sale", template);
                        fully_filled = false;
                        continue;
                    }
                },
                BuyTarget::Shelf(lot_id) => match catalog.shelf().get(*lot_id) {
                    Some(lot) => (
                        lot.template.clone(),
                        lot.name.clone(),
                        lot.amount,
                        lot.buy_back_price(self.config.buy_back_multiplier),
                        0,
                        GoodsKind::default(),
                    ),
                    None => {
                        debug!("Shelf lot {:?} is gone", lot_id);
                        fully_filled = false;
                        continue;
                    }
                },
            };

            let mut amount = line.amount.min(available.saturating_sub(already));
            if amount < line.amount {
                debug!(
                    "{}",
                    Error::InsufficientStock {
                        template,
                        requested: line.amount,
                        available: available.saturating_sub(already),
                    }
                );
                fully_filled = false;
            }

            if control_cost > 0 {
                let affordable = slots / control_cost;
                if amount > affordable {
                    debug!(
                        "{}",
                        Error::BudgetExceeded(format!(
                            "{} needs {} control slot(s) per unit, {} free",
                            name, control_cost, slots
                        ))
                    );
                    amount = affordable;
                    fully_filled = false;
                }
                slots -= amount * control_cost;
            }

            if amount == 0 {
                continue;
            }

            *reserved.entry(line.target.clone()).or_insert(0) += amount;
            planned.push(PlannedLine {
                target: line.target.clone(),
                name,
                amount,
                unit_price,
                kind,
            });
        }

        (planned, fully_filled)
    }

    /// Primary covers it, or the total is large enough to fall back to the
    /// reserve and the reserve covers it. Never split across both.
    fn choose_fund_source<H: Funds>(
        &self,
        trader: &Trader,
        total: Gold,
        host: &H,
    ) -> Result<FundSource> {
        let primary = host.balance(trader.id, FundSource::Primary);
        if primary >= total {
            return Ok(FundSource::Primary);
        }

        if total > self.config.reserve_threshold {
            let reserve = host.balance(trader.id, FundSource::Reserve);
            if reserve >= total {
                debug!("{} pays {} from the reserve", trader.id, total);
                return Ok(FundSource::Reserve);
            }
            return Err(Error::InsufficientFunds {
                required: total,
                available: primary.max(reserve),
            });
        }

        Err(Error::InsufficientFunds {
            required: total,
            available: primary,
        })
    }

    /// Execution pass for one paid line. Returns false if the goods could
    /// not be taken from the vendor.
    fn deliver<H: World>(
        trader: &Trader,
        catalog: &mut StockCatalog,
        line: &PlannedLine,
        host: &mut H,
    ) -> bool {
        match &line.target {
            BuyTarget::Stock(template) => {
                if !catalog.consume(template, line.amount) {
                    error!("Stock for {} vanished after payment", template);
                    return false;
                }
                match line.kind {
                    GoodsKind::Companion => {
                        for _ in 0..line.amount {
                            host.spawn_companion(trader.id, template);
                        }
                    }
                    GoodsKind::Item { stackable } => {
                        host.spawn_goods(trader.id, template, line.amount, stackable);
                    }
                }
                true
            }
            BuyTarget::Shelf(lot_id) => match catalog.shelf_mut().take(*lot_id, line.amount) {
                Some(taken) => {
                    host.deliver_lot(trader.id, &taken, line.amount);
                    true
                }
                None => {
                    error!("Shelf lot {:?} vanished after payment", lot_id);
                    false
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testkit::*;
    use super::*;
    use crate::config::EconomyConfig;
    use crate::memory::MemoryHost;
    use bazaar_core::{FillStatus, LotId, Wallet};
    use chrono::Utc;

    fn processor() -> TransactionProcessor {
        TransactionProcessor::new(EconomyConfig::default())
    }

    fn host(primary: u64, reserve: u64) -> MemoryHost {
        MemoryHost::new().with_wallet(BUYER, Wallet::new(Gold(primary), Gold(reserve)))
    }

    #[test]
    fn test_request_above_stock_is_clamped() {
        let mut catalog = catalog();
        let mut host = host(1_000, 0);

        let outcome = processor()
            .buy(
                &vendor(),
                &trader(),
                &mut catalog,
                Multiplier::NEUTRAL,
                &[BuyLine::stock("torch", 10)],
                &mut host,
            )
            .unwrap();

        assert_eq!(outcome.lines.len(), 1);
        assert_eq!(outcome.lines[0].amount, 4);
        assert_eq!(outcome.total_cost, Gold(20));
        assert!(!outcome.fully_filled);
        assert_eq!(outcome.status(), FillStatus::Partial);
        assert_eq!(catalog.lookup(&"torch".into()).unwrap().quantity, 0);
        assert_eq!(host.wallet(BUYER).primary, Gold(980));
        assert_eq!(host.held(BUYER, "torch"), 4);
    }

    #[test]
    fn test_duplicate_lines_share_stock() {
        let mut catalog = catalog();
        let mut host = host(1_000, 0);

        let outcome = processor()
            .buy(
                &vendor(),
                &trader(),
                &mut catalog,
                Multiplier::NEUTRAL,
                &[BuyLine::stock("torch", 3), BuyLine::stock("torch", 3)],
                &mut host,
            )
            .unwrap();

        let amounts: Vec<u32> = outcome.lines.iter().map(|l| l.amount).collect();
        assert_eq!(amounts, vec![3, 1]);
        assert!(!outcome.fully_filled);
        assert_eq!(catalog.lookup(&"torch".into()).unwrap().quantity, 0);
    }

    #[test]
    fn test_control_slots_clamp_companions() {
        let mut catalog = catalog();
        let mut host = host(10_000, 0).with_control_slots(BUYER, 5);

        let outcome = processor()
            .buy(
                &vendor(),
                &trader(),
                &mut catalog,
                Multiplier::NEUTRAL,
                &[BuyLine::stock("pack_horse", 3)],
                &mut host,
            )
            .unwrap();

        assert_eq!(outcome.lines[0].amount, 2);
        assert_eq!(outcome.total_cost, Gold(1_200));
        assert!(!outcome.fully_filled);
        assert_eq!(host.companions(BUYER).len(), 2);
    }

    #[test]
    fn test_no_control_slots_drops_line() {
        let mut catalog = catalog();
        let mut host = host(10_000, 0).with_control_slots(BUYER, 1);

        let outcome = processor()
            .buy(
                &vendor(),
                &trader(),
                &mut catalog,
                Multiplier::NEUTRAL,
                &[BuyLine::stock("pack_horse", 1)],
                &mut host,
            )
            .unwrap();

        assert_eq!(outcome.status(), FillStatus::Nothing);
        assert_eq!(outcome.paid_from, None);
        assert_eq!(host.wallet(BUYER).primary, Gold(10_000));
        assert_eq!(catalog.lookup(&"pack_horse".into()).unwrap().quantity, 5);
    }

    #[test]
    fn test_reserve_untouched_below_threshold() {
        let mut catalog = catalog();
        let mut host = host(100, 1_000_000);

        let err = processor()
            .buy(
                &vendor(),
                &trader(),
                &mut catalog,
                Multiplier::NEUTRAL,
                &[BuyLine::stock("iron_ingot", 50)],
                &mut host,
            )
            .unwrap_err();

        assert_eq!(
            err,
            Error::InsufficientFunds {
                required: Gold(2_000),
                available: Gold(100)
            }
        );
        assert_eq!(host.wallet(BUYER), Wallet::new(Gold(100), Gold(1_000_000)));
        assert_eq!(catalog.lookup(&"iron_ingot".into()).unwrap().quantity, 100);
    }

    #[test]
    fn test_reserve_pays_large_purchases() {
        let mut catalog = catalog();
        let mut host = host(100, 1_000_000);

        let outcome = processor()
            .buy(
                &vendor(),
                &trader(),
                &mut catalog,
                Multiplier::NEUTRAL,
                &[BuyLine::stock("war_axe", 2)],
                &mut host,
            )
            .unwrap();

        assert_eq!(outcome.total_cost, Gold(120_000));
        assert!(outcome.paid_from_reserve());
        assert!(outcome.fully_filled);
        assert_eq!(host.wallet(BUYER), Wallet::new(Gold(100), Gold(880_000)));
        // not stackable, one holding per unit
        assert_eq!(host.holdings(BUYER).len(), 2);
    }

    #[test]
    fn test_exactly_at_threshold_never_uses_reserve() {
        let mut catalog = catalog();
        let mut host = host(0, 1_000_000);
        let mut config = EconomyConfig::default();
        config.reserve_threshold = Gold(120_000);

        let err = TransactionProcessor::new(config)
            .buy(
                &vendor(),
                &trader(),
                &mut catalog,
                Multiplier::NEUTRAL,
                &[BuyLine::stock("war_axe", 2)],
                &mut host,
            )
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { .. }));
        assert_eq!(host.wallet(BUYER).reserve, Gold(1_000_000));
    }

    #[test]
    fn test_sentiment_price_applies_per_unit() {
        let mut catalog = catalog();
        let mut host = host(1_000, 0);
        let m = Multiplier {
            price: 0.55,
            quantity: 1.45,
        };

        let outcome = processor()
            .buy(
                &vendor(),
                &trader(),
                &mut catalog,
                m,
                &[BuyLine::stock("iron_ingot", 3)],
                &mut host,
            )
            .unwrap();
        assert_eq!(outcome.lines[0].unit_price, Gold(22));
        assert_eq!(outcome.total_cost, Gold(66));
    }

    #[test]
    fn test_buy_back_from_shelf() {
        let mut catalog = catalog();
        let lot = catalog.shelf_mut().archive(
            "wolf_pelt".into(),
            "wolf pelt".into(),
            3,
            Gold(30),
            Utc::now(),
        );
        assert_eq!(lot, LotId(1));
        let mut host = host(1_000, 0);

        let outcome = processor()
            .buy(
                &vendor(),
                &trader(),
                &mut catalog,
                Multiplier::NEUTRAL,
                &[BuyLine::shelf(lot, 2)],
                &mut host,
            )
            .unwrap();

        assert_eq!(outcome.lines[0].unit_price, Gold(57));
        assert_eq!(outcome.total_cost, Gold(114));
        assert_eq!(catalog.shelf().get(lot).unwrap().amount, 1);
        assert_eq!(host.held(BUYER, "wolf_pelt"), 2);
    }

    #[test]
    fn test_unknown_template_is_skipped() {
        let mut catalog = catalog();
        let mut host = host(1_000, 0);

        let outcome = processor()
            .buy(
                &vendor(),
                &trader(),
                &mut catalog,
                Multiplier::NEUTRAL,
                &[BuyLine::stock("dragon_egg", 1), BuyLine::stock("torch", 1)],
                &mut host,
            )
            .unwrap();
        assert_eq!(outcome.lines.len(), 1);
        assert!(!outcome.fully_filled);
        assert_eq!(outcome.total_cost, Gold(5));
    }
}
