//! A vendor: catalog, pricing, trade and training wired together

use crate::catalog::{ListingRow, StockCatalog};
use crate::config::EconomyConfig;
use crate::executor::{EventQueue, VendorEvent};
use crate::ports::{Funds, SkillBook, World};
use crate::pricing::{MarketSentimentProvider, Multiplier, PriceModifier};
use crate::restock::RestockScheduler;
use crate::training::TrainingEngine;
use crate::transactions::TransactionProcessor;
use bazaar_core::{
    ActorId, BuyOutcome, CatalogSnapshot, Result, SellOutcome, SellQuote, ShopDefinition,
    TrainingOffer, TrainingResolution, VendorProfile,
};
use chrono::{DateTime, Utc};
use tracing::{debug, error};

/// What handling an event produced
#[derive(Debug, Clone, PartialEq)]
pub enum VendorReply {
    Bought(BuyOutcome),
    Sold(SellOutcome),
    Quoted(Vec<SellQuote>),
    Listing(Vec<ListingRow>),
    Offered(TrainingOffer),
    Trained(TrainingResolution),
    Restocked(bool),
    Reloaded { version: u32 },
}

/// One drained event and how it went
#[derive(Debug)]
pub struct Handled {
    pub kind: &'static str,
    pub actor: Option<ActorId>,
    pub reply: Result<VendorReply>,
}

pub struct Vendor<P> {
    profile: VendorProfile,
    definition: ShopDefinition,
    config: EconomyConfig,
    pricing: PriceModifier<P>,
    catalog: StockCatalog,
    processor: TransactionProcessor,
    restock: RestockScheduler,
    training: TrainingEngine,
}

impl<P: MarketSentimentProvider> Vendor<P> {
    /// Open a vendor with a fresh catalog built from its shop definition
    pub fn new(
        profile: VendorProfile,
        definition: ShopDefinition,
        config: EconomyConfig,
        provider: P,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        config.validate()?;
        let pricing = PriceModifier::new(provider, config.sentiment_pricing);
        let catalog = StockCatalog::load(&definition, pricing.current(profile.favorable));
        Ok(Self::assemble(profile, definition, config, pricing, catalog, now))
    }

    /// Reopen a vendor from a saved catalog snapshot
    pub fn restore(
        profile: VendorProfile,
        definition: ShopDefinition,
        config: EconomyConfig,
        provider: P,
        snapshot: CatalogSnapshot,
        last_restock: DateTime<Utc>,
    ) -> Result<Self> {
        config.validate()?;
        let pricing = PriceModifier::new(provider, config.sentiment_pricing);
        let catalog = StockCatalog::from_snapshot(snapshot, definition.buys.clone())?;
        Ok(Self::assemble(
            profile,
            definition,
            config,
            pricing,
            catalog,
            last_restock,
        ))
    }

    fn assemble(
        profile: VendorProfile,
        definition: ShopDefinition,
        config: EconomyConfig,
        pricing: PriceModifier<P>,
        catalog: StockCatalog,
        last_restock: DateTime<Utc>,
    ) -> Self {
        Self {
            restock: RestockScheduler::new(&config, last_restock),
            training: TrainingEngine::new(config.training.clone()),
            processor: TransactionProcessor::new(config.clone()),
            profile,
            definition,
            config,
            pricing,
            catalog,
        }
    }

    pub fn profile(&self) -> &VendorProfile {
        &self.profile
    }

    pub fn catalog(&self) -> &StockCatalog {
        &self.catalog
    }

    pub fn training(&self) -> &TrainingEngine {
        &self.training
    }

    pub fn last_restock(&self) -> DateTime<Utc> {
        self.restock.last_restock()
    }

    /// Sentiment is read once per event
    fn multiplier(&self) -> Multiplier {
        self.pricing.current(self.profile.favorable)
    }

    pub fn handle<H: Funds + World + SkillBook>(
        &mut self,
        event: VendorEvent,
        host: &mut H,
        now: DateTime<Utc>,
    ) -> Result<VendorReply> {
        let multiplier = self.multiplier();
        debug!("{} handling {}", self.profile.name, event.kind());

        match event {
            VendorEvent::Buy { trader, lines } => self
                .processor
                .buy(&self.profile, &trader, &mut self.catalog, multiplier, &lines, host)
                .map(VendorReply::Bought),
            VendorEvent::Sell { trader, lines } => self
                .processor
                .sell(
                    &self.profile,
                    &trader,
                    &mut self.catalog,
                    multiplier,
                    &lines,
                    host,
                    now,
                )
                .map(VendorReply::Sold),
            VendorEvent::QuoteSell { trader, lines } => self
                .processor
                .quote_sell(&self.profile, &trader, &self.catalog, multiplier, &lines)
                .map(VendorReply::Quoted),
            VendorEvent::Listing => Ok(VendorReply::Listing(self.catalog.listing(
                multiplier,
                self.config.buy_back_multiplier,
                self.config.max_listing_rows,
            ))),
            VendorEvent::RequestTraining { trader, skill } => self
                .training
                .request_training(&self.profile, &trader, &skill, &*host, now)
                .map(VendorReply::Offered),
            VendorEvent::Deposit { actor, amount } => self
                .training
                .deposit(actor, amount, host, now)
                .map(VendorReply::Trained),
            VendorEvent::Restock => {
                let restocked = self.restock.maybe_restock(&mut self.catalog, now);
                let shelved = self
                    .catalog
                    .shelf_mut()
                    .purge_expired(now, self.config.shelf_decay());
                if shelved > 0 {
                    debug!("{} discarded {} stale shelf lot(s)", self.profile.name, shelved);
                }
                self.training.purge_expired(now);
                Ok(VendorReply::Restocked(restocked))
            }
            VendorEvent::Reload => {
                self.catalog.reload(&self.definition, multiplier);
                Ok(VendorReply::Reloaded {
                    version: self.catalog.version(),
                })
            }
        }
    }

    /// Release due deferred events, then handle everything queued in order
    pub fn drain<H: Funds + World + SkillBook>(
        &mut self,
        queue: &mut EventQueue,
        host: &mut H,
        now: DateTime<Utc>,
    ) -> Vec<Handled> {
        queue.release_due(now);

        let mut handled = Vec::with_capacity(queue.len());
        while let Some(event) = queue.next_event() {
            let kind = event.kind();
            let actor = event.actor();
            let reply = self.handle(event, host, now);
            if let Err(e) = &reply {
                error!("{} failed {}: {}", self.profile.name, kind, e);
            }
            handled.push(Handled { kind, actor, reply });
        }
        handled
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        self.catalog.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHost;
    use crate::pricing::{FixedSentiment, SharedSentiment};
    use bazaar_core::{
        ActorId, BuyLine, Error, Gold, GoodsKind, Sentiment, SkillLock, SkillValue, StockTemplate,
        Trader, VendorCapabilities, Wallet,
    };
    use chrono::Duration;

    const SHOPPER: ActorId = ActorId(11);

    fn shop() -> ShopDefinition {
        ShopDefinition {
            stock: vec![StockTemplate {
                template: "lantern".into(),
                name: "lantern".into(),
                price: Gold(100),
                amount: 20,
                control_cost: 0,
                resellable: true,
                kind: GoodsKind::default(),
            }],
            buys: Vec::new(),
        }
    }

    fn profile() -> VendorProfile {
        VendorProfile {
            id: ActorId(2),
            name: "Brann the tinker".into(),
            favorable: true,
            affiliation: None,
            capabilities: VendorCapabilities::default(),
            proficiencies: [("tinkering".to_string(), SkillValue::from_points(50.0))]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn test_sentiment_change_reprices_catalog() {
        let now = Utc::now();
        let sentiment = SharedSentiment::new(Sentiment::new(0));
        let mut vendor = Vendor::new(
            profile(),
            shop(),
            EconomyConfig::default(),
            sentiment.clone(),
            now,
        )
        .unwrap();
        let mut host =
            MemoryHost::new().with_wallet(SHOPPER, Wallet::new(Gold(1_000), Gold::ZERO));
        let buy = || VendorEvent::Buy {
            trader: Trader::new(SHOPPER),
            lines: vec![BuyLine::stock("lantern", 1)],
        };

        let cheap = vendor.handle(buy(), &mut host, now).unwrap();
        sentiment.set(Sentiment::new(100_000));
        let dear = vendor.handle(buy(), &mut host, now).unwrap();

        match (cheap, dear) {
            (VendorReply::Bought(a), VendorReply::Bought(b)) => {
                assert_eq!(a.total_cost, Gold(55));
                assert_eq!(b.total_cost, Gold(100));
            }
            other => panic!("unexpected replies {:?}", other),
        }
        // quantity was scaled once, at load time
        assert_eq!(vendor.catalog().lookup(&"lantern".into()).unwrap().max_quantity, 29);
    }

    #[test]
    fn test_drain_handles_queue_in_order() {
        let now = Utc::now();
        let mut vendor = Vendor::new(
            profile(),
            shop(),
            EconomyConfig::default(),
            FixedSentiment(Sentiment::new(100_000)),
            now,
        )
        .unwrap();
        let mut host = MemoryHost::new()
            .with_wallet(SHOPPER, Wallet::new(Gold(1_000), Gold::ZERO))
            .with_skill(SHOPPER, "tinkering", 10.0, SkillLock::RaiseIntent);
        let mut queue = EventQueue::new();

        queue.push(VendorEvent::Deposit {
            actor: SHOPPER,
            amount: Gold(50),
        });
        queue.push(VendorEvent::RequestTraining {
            trader: Trader::new(SHOPPER),
            skill: "tinkering".into(),
        });
        queue.defer(
            VendorEvent::Deposit {
                actor: SHOPPER,
                amount: Gold(50),
            },
            now + Duration::seconds(5),
        );

        let replies = vendor.drain(&mut queue, &mut host, now);
        assert_eq!(replies.len(), 2);
        assert!(matches!(replies[0].reply, Err(Error::SessionConflict(_))));
        assert_eq!(replies[0].actor, Some(SHOPPER));
        assert_eq!(replies[1].kind, "request_training");
        assert!(matches!(replies[1].reply, Ok(VendorReply::Offered(_))));

        let replies = vendor.drain(&mut queue, &mut host, now + Duration::seconds(5));
        assert_eq!(replies.len(), 1);
        assert!(matches!(
            replies[0].reply,
            Ok(VendorReply::Trained(TrainingResolution::Applied(_)))
        ));
        assert_eq!(host.skill(SHOPPER, "tinkering"), SkillValue::from_points(10.5));
        assert_eq!(host.wallet(SHOPPER).primary, Gold(950));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let now = Utc::now();
        let snapshot = Vendor::new(
            profile(),
            shop(),
            EconomyConfig::default(),
            FixedSentiment(Sentiment::new(0)),
            now,
        )
        .unwrap()
        .snapshot();
        let mut config = EconomyConfig::default();
        config.training.beginner_cost = Gold::ZERO;

        let opened = Vendor::new(
            profile(),
            shop(),
            config.clone(),
            FixedSentiment(Sentiment::new(0)),
            now,
        );
        assert!(matches!(opened, Err(Error::InvalidConfig(_))));

        let restored = Vendor::restore(
            profile(),
            shop(),
            config,
            FixedSentiment(Sentiment::new(0)),
            snapshot,
            now,
        );
        assert!(matches!(restored, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_restock_event_and_snapshot_restore() {
        let now = Utc::now();
        let mut config = EconomyConfig::default();
        config.sentiment_pricing = false;
        let mut vendor = Vendor::new(
            profile(),
            shop(),
            config.clone(),
            FixedSentiment(Sentiment::new(0)),
            now,
        )
        .unwrap();
        let mut host = MemoryHost::new().with_wallet(SHOPPER, Wallet::new(Gold(5_000), Gold::ZERO));

        vendor
            .handle(
                VendorEvent::Buy {
                    trader: Trader::new(SHOPPER),
                    lines: vec![BuyLine::stock("lantern", 20)],
                },
                &mut host,
                now,
            )
            .unwrap();

        let later = now + Duration::hours(3);
        let reply = vendor.handle(VendorEvent::Restock, &mut host, later).unwrap();
        assert_eq!(reply, VendorReply::Restocked(true));
        assert_eq!(vendor.catalog().lookup(&"lantern".into()).unwrap().quantity, 40);

        let restored = Vendor::restore(
            profile(),
            shop(),
            config,
            FixedSentiment(Sentiment::new(0)),
            vendor.snapshot(),
            vendor.last_restock(),
        )
        .unwrap();
        assert_eq!(restored.snapshot(), vendor.snapshot());
        assert_eq!(restored.last_restock(), later);
    }
}
