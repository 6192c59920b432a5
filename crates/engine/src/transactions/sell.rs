use super::{check_access, TransactionProcessor};
use crate::catalog::StockCatalog;
use crate::ports::{Funds, World};
use crate::pricing::Multiplier;
use bazaar_core::{
    Error, Gold, ItemId, Payout, Result, SellEntry, SellLine, SellOutcome, SellQuote,
    Settlement, SoldLine, TradeType, Trader, VendorProfile,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info};

/// An offered line that passed the eligibility checks
struct EligibleLine<'a> {
    line: &'a SellLine,
    entry: SellEntry,
    amount: u32,
}

impl TransactionProcessor {
    /// Sell items to a vendor.
    ///
    /// Ineligible lines are skipped. Offering more eligible lines than the
    /// per-call limit fails the whole call before anything changes. An empty
    /// (or fully ineligible) offer succeeds with nothing sold.
    #[allow(clippy::too_many_arguments)]
    pub fn sell<H: Funds + World>(
        &self,
        vendor: &VendorProfile,
        trader: &Trader,
        catalog: &mut StockCatalog,
        multiplier: Multiplier,
        lines: &[SellLine],
        host: &mut H,
        now: DateTime<Utc>,
    ) -> Result<SellOutcome> {
        check_access(vendor, trader, TradeType::Sell)?;

        let eligible = self.eligible_lines(vendor, catalog, lines)?;
        if eligible.is_empty() {
            debug!("{} offered nothing {} will buy", trader.id, vendor.name);
            return Ok(SellOutcome::nothing_sold());
        }

        let (barter, begging_applied) = self.effective_barter(vendor, trader);

        let mut sold = Vec::with_capacity(eligible.len());
        let mut total = Gold::ZERO;
        for EligibleLine {
            line,
            entry,
            amount,
        } in eligible
        {
            let unit_price = self.sell_unit_price(entry.base_price, barter, multiplier);
            let subtotal = unit_price * amount as u64;

            host.take_item(trader.id, line.item.id, amount);
            let settlement = if entry.resellable {
                let restocked = catalog.restock_up_to(&entry.template, amount);
                let shelved = amount - restocked;
                if shelved > 0 {
                    let lot = catalog.shelf_mut().archive(
                        entry.template.clone(),
                        entry.name.clone(),
                        shelved,
                        entry.base_price,
                        now,
                    );
                    debug!("Shelved {} x {} as lot {:?}", shelved, entry.template, lot);
                }
                Settlement::Resold {
                    restocked,
                    shelved,
                }
            } else {
                Settlement::Destroyed
            };

            total += subtotal;
            sold.push(SoldLine {
                item: line.item.id,
                template: entry.template,
                amount,
                unit_price,
                subtotal,
                settlement,
            });
        }

        let payout = if total > self.config.bank_check_threshold {
            Payout::BankCheck(total)
        } else {
            Payout::Coins(total)
        };
        host.pay(trader.id, payout);

        info!(
            "{} sold {} line(s) to {} for {}{}",
            trader.id,
            sold.len(),
            vendor.name,
            total,
            if matches!(payout, Payout::BankCheck(_)) {
                " (bank check)"
            } else {
                ""
            }
        );

        Ok(SellOutcome {
            lines: sold,
            total_payment: total,
            payout: Some(payout),
            begging_applied,
        })
    }

    /// What the vendor would pay for each eligible offered line, without
    /// selling anything
    pub fn quote_sell(
        &self,
        vendor: &VendorProfile,
        trader: &Trader,
        catalog: &StockCatalog,
        multiplier: Multiplier,
        lines: &[SellLine],
    ) -> Result<Vec<SellQuote>> {
        check_access(vendor, trader, TradeType::Sell)?;
        let (barter, _) = self.effective_barter(vendor, trader);

        Ok(self
            .eligible_lines(vendor, catalog, lines)?
            .into_iter()
            .map(|e| SellQuote {
                item: e.line.item.id,
                name: e.entry.name.clone(),
                unit_price: self.sell_unit_price(e.entry.base_price, barter, multiplier),
                amount: e.amount,
            })
            .collect())
    }

    /// Lines the vendor will buy. Repeated offers of one item merge into
    /// its first line, capped at the units the item holds.
    fn eligible_lines<'a>(
        &self,
        vendor: &VendorProfile,
        catalog: &StockCatalog,
        lines: &'a [SellLine],
    ) -> Result<Vec<EligibleLine<'a>>> {
        let mut eligible: Vec<EligibleLine<'a>> = Vec::new();
        let mut by_item: HashMap<ItemId, usize> = HashMap::new();

        for line in lines {
            let entry = match check_eligible(vendor, catalog, line) {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping item {:?}: {}", line.item.id, e);
                    continue;
                }
            };

            match by_item.get(&line.item.id) {
                Some(&i) => {
                    let merged = &mut eligible[i];
                    let cap = merged.line.item.amount;
                    merged.amount = merged.amount.saturating_add(line.amount).min(cap);
                    debug!("Merged repeated offer of item {:?}", line.item.id);
                }
                None => {
                    by_item.insert(line.item.id, eligible.len());
                    eligible.push(EligibleLine {
                        line,
                        entry: entry.clone(),
                        amount: line.amount.min(line.item.amount),
                    });
                }
            }
        }

        if eligible.len() > self.config.max_sell_lines {
            return Err(Error::SellLimitExceeded {
                offered: eligible.len(),
                limit: self.config.max_sell_lines,
            });
        }
        Ok(eligible)
    }

    /// Barter points used for pricing, and whether begging replaced barter.
    /// Guild membership wins over begging.
    fn effective_barter(&self, vendor: &VendorProfile, trader: &Trader) -> (u32, bool) {
        let (points, begging) = if vendor.shares_affiliation(trader.affiliation.as_deref()) {
            (
                trader.barter.whole_points().max(self.config.guild_barter_cap),
                false,
            )
        } else if trader.begging_posture {
            (trader.begging.whole_points(), true)
        } else {
            (trader.barter.whole_points(), false)
        };
        (points.min(self.config.max_barter), begging)
    }

    /// `base / divisor`, raised by barter, scaled by sentiment, at least 1
    fn sell_unit_price(&self, base: Gold, barter: u32, multiplier: Multiplier) -> Gold {
        let mut unit = base.as_u64() as f64 / self.config.sell_price_divisor;
        unit *= 1.0 + barter as f64 * self.config.barter_rate;
        unit *= multiplier.price;
        Gold((unit.round() as u64).max(1))
    }
}

fn check_eligible<'c>(
    vendor: &VendorProfile,
    catalog: &'c StockCatalog,
    line: &SellLine,
) -> Result<&'c SellEntry> {
    let item = &line.item;
    if !item.owned_by_seller {
        return Err(Error::IneligibleItem("not in the seller's possession".into()));
    }
    if line.amount == 0 || item.amount == 0 {
        return Err(Error::IneligibleItem("nothing offered".into()));
    }
    if item.trade_locked {
        return Err(Error::IneligibleItem("locked for trade".into()));
    }
    if item.contained_items > 0 {
        return Err(Error::IneligibleItem(format!(
            "container holds {} item(s)",
            item.contained_items
        )));
    }
    if !vendor.capabilities.accepts_category(item.category.as_deref()) {
        return Err(Error::IneligibleItem(format!(
            "{} does not take {}",
            vendor.name,
            item.category.as_deref().unwrap_or("uncategorized goods")
        )));
    }
    catalog
        .sell_entry(&item.template)
        .ok_or_else(|| Error::IneligibleItem(format!("{} is not bought here", item.template)))
}
