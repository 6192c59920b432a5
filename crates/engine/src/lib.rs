//! Bazaar Engine - vendor pricing, stock, trading and skill training

pub mod catalog;
pub mod config;
pub mod executor;
pub mod memory;
pub mod ports;
pub mod pricing;
pub mod restock;
pub mod training;
pub mod transactions;
pub mod vendor;

pub use catalog::{ListingRow, ResaleShelf, ShelfLot, StockCatalog};
pub use config::{EconomyConfig, TrainingConfig};
pub use executor::{EventQueue, VendorEvent};
pub use ports::{Funds, SkillBook, World};
pub use pricing::{
    FixedSentiment, MarketSentimentProvider, Multiplier, PriceModifier, SharedSentiment,
};
pub use restock::{RestockPolicy, RestockScheduler};
pub use training::TrainingEngine;
pub use transactions::TransactionProcessor;
pub use vendor::{Handled, Vendor, VendorReply};
