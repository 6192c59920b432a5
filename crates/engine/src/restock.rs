//! Time-gated stock refresh

use crate::catalog::StockCatalog;
use crate::config::EconomyConfig;
use bazaar_core::StockEntry;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

/// Thresholds for the per-entry refresh policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestockPolicy {
    pub stock_ceiling: u32,
    pub large_stock_half: u32,
    pub small_stock_threshold: u32,
}

impl RestockPolicy {
    pub fn from_config(config: &EconomyConfig) -> Self {
        Self {
            stock_ceiling: config.stock_ceiling,
            large_stock_half: config.large_stock_half,
            small_stock_threshold: config.small_stock_threshold,
        }
    }

    /// Demand threshold for an entry: remaining stock at or above it means
    /// the entry sold poorly
    fn half(&self, max_quantity: u32) -> u32 {
        if max_quantity >= self.stock_ceiling {
            (max_quantity / 2).min(self.large_stock_half)
        } else if max_quantity > self.small_stock_threshold {
            max_quantity / 2
        } else {
            max_quantity
        }
    }

    /// Refresh one entry. Sold-out entries double their capacity, entries
    /// that kept more than half their stock shrink to half, then the
    /// quantity is refilled to the (new) maximum.
    pub fn apply(&self, entry: &mut StockEntry) {
        if entry.quantity == 0 {
            entry.max_quantity = entry
                .max_quantity
                .saturating_mul(2)
                .clamp(1, self.stock_ceiling.max(1));
        } else {
            let half = self.half(entry.max_quantity);
            if entry.quantity >= half {
                entry.max_quantity = half.max(1);
            }
        }
        entry.quantity = entry.max_quantity;
    }
}

impl Default for RestockPolicy {
    fn default() -> Self {
        Self::from_config(&EconomyConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct RestockScheduler {
    delay: Duration,
    last_restock: DateTime<Utc>,
    policy: RestockPolicy,
}

impl RestockScheduler {
    pub fn new(config: &EconomyConfig, last_restock: DateTime<Utc>) -> Self {
        Self {
            delay: config.restock_delay(),
            last_restock,
            policy: RestockPolicy::from_config(config),
        }
    }

    pub fn last_restock(&self) -> DateTime<Utc> {
        self.last_restock
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now - self.last_restock > self.delay
    }

    /// Refresh every entry of the catalog if the delay has elapsed.
    /// Returns whether a restock happened.
    pub fn maybe_restock(&mut self, catalog: &mut StockCatalog, now: DateTime<Utc>) -> bool {
        if !self.is_due(now) {
            debug!(
                "Restock not due, {}s since last",
                (now - self.last_restock).num_seconds()
            );
            return false;
        }

        for entry in catalog.entries_mut() {
            if !entry.is_consistent() {
                warn!(
                    "Repairing corrupt entry {} ({} > {}) during restock",
                    entry.template, entry.quantity, entry.max_quantity
                );
                entry.quantity = entry.max_quantity;
            }
            let before = entry.max_quantity;
            self.policy.apply(entry);
            if before != entry.max_quantity {
                debug!(
                    "Restock {}: max {} -> {}",
                    entry.template, before, entry.max_quantity
                );
            }
        }

        self.last_restock = now;
        info!("Restocked {} catalog entries", catalog.entries().len());
        true
    }
}
