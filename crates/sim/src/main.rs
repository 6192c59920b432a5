//! Bazaar simulator - runs a trading day against one vendor and persists the results

mod scenario;

use anyhow::Context;
use bazaar_core::{ActorId, Sentiment, TrainingResolution, TrainingTier, MAX_SENTIMENT};
use bazaar_engine::memory::MemoryHost;
use bazaar_engine::{EconomyConfig, EventQueue, SharedSentiment, Vendor, VendorReply};
use bazaar_persistence::sqlite::{self, TradeRecord, ECONOMY_CONFIG_KEY};
use bazaar_persistence::Database;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bazaar_sim=debug,bazaar_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting bazaar simulator");

    let mut args = std::env::args().skip(1);
    let db_path = args.next().map(PathBuf::from).unwrap_or_else(|| {
        dirs_next::data_local_dir()
            .map(|p| p.join("Bazaar"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bazaar.db")
    });
    let config_path = args.next().map(PathBuf::from);

    let db = Database::connect(&db_path)
        .await
        .with_context(|| format!("opening {}", db_path.display()))?;

    let config = match config_path {
        Some(path) => EconomyConfig::load(&path)?,
        None => sqlite::load_setting::<EconomyConfig>(db.pool(), ECONOMY_CONFIG_KEY)
            .await?
            .unwrap_or_default(),
    };
    config.validate()?;
    sqlite::save_setting(db.pool(), ECONOMY_CONFIG_KEY, &config).await?;

    let start = Utc::now();
    let sentiment = SharedSentiment::new(random_sentiment());
    let profile = scenario::vendor_profile();
    let vendor_id = profile.id;

    let mut vendor = match sqlite::load_snapshot(db.pool(), vendor_id).await? {
        Some(stored) => {
            tracing::info!(
                "Restoring {} from catalog version {}",
                profile.name,
                stored.snapshot.version
            );
            Vendor::restore(
                profile,
                scenario::shop_definition(),
                config,
                sentiment.clone(),
                stored.snapshot,
                stored.last_restock,
            )?
        }
        None => Vendor::new(
            profile,
            scenario::shop_definition(),
            config,
            sentiment.clone(),
            start,
        )?,
    };

    let mut host = scenario::host();
    let today = start.date_naive();
    sqlite::prune_ledger_before(db.pool(), today).await?;
    for (actor, skill) in scenario::trainees() {
        let points = sqlite::trained_on(db.pool(), actor, skill, today).await?;
        host.set_trained(actor, skill, today, points);
    }

    let mut queue = EventQueue::new();
    let mut ticks = vec![start];
    for (event, due) in scenario::events(start) {
        match due {
            Some(due) => {
                queue.defer(event, due);
                ticks.push(due);
            }
            None => queue.push(event),
        }
    }
    ticks.sort();
    ticks.dedup();

    let mut records = Vec::new();
    for now in ticks {
        // Sentiment drifts between ticks
        sentiment.set(random_sentiment());

        for handled in vendor.drain(&mut queue, &mut host, now) {
            let Ok(reply) = &handled.reply else {
                continue;
            };
            report(&vendor, reply);
            if let Some(actor) = handled.actor {
                collect(&db, vendor_id, actor, reply, now, &mut records).await?;
            }
        }
    }

    let logged = sqlite::log_trades(db.pool(), &records).await?;
    sqlite::save_snapshot(db.pool(), vendor_id, &vendor.snapshot(), vendor.last_restock()).await?;

    tracing::info!(
        "Day closed: {} trade line(s) logged, catalog version {}",
        logged,
        vendor.catalog().version()
    );
    for actor in [scenario::MERCHANT, scenario::ANGLER, scenario::BEGGAR] {
        report_actor(&host, actor);
    }

    Ok(())
}

fn random_sentiment() -> Sentiment {
    Sentiment::new(rand::thread_rng().gen_range(0..=MAX_SENTIMENT))
}

fn report(vendor: &Vendor<SharedSentiment>, reply: &VendorReply) {
    let name = &vendor.profile().name;
    match reply {
        VendorReply::Bought(outcome) => tracing::info!(
            "{} sold {} line(s) for {} ({:?})",
            name,
            outcome.lines.len(),
            outcome.total_cost,
            outcome.status()
        ),
        VendorReply::Sold(outcome) => tracing::info!(
            "{} bought {} line(s) for {}{}",
            name,
            outcome.lines.len(),
            outcome.total_payment,
            if outcome.begging_applied { " (begging)" } else { "" }
        ),
        VendorReply::Quoted(quotes) => {
            for quote in quotes {
                tracing::info!("{} would pay {} each for {} x{}", name, quote.unit_price, quote.name, quote.amount);
            }
        }
        VendorReply::Listing(rows) => {
            for row in rows {
                tracing::debug!("  {:<16} {:>8} x{}", row.name, row.unit_price, row.available);
            }
            tracing::info!("{} lists {} row(s)", name, rows.len());
        }
        VendorReply::Offered(offer) => tracing::info!(
            "{} offers {} at {} per 0.1 (currently {})",
            name,
            offer.skill,
            offer.cost_per_increment,
            offer.current
        ),
        VendorReply::Trained(TrainingResolution::Applied(receipt)) => tracing::info!(
            "{} trained {} by {} to {} for {}, change {}",
            name,
            receipt.skill,
            receipt.points,
            receipt.new_value,
            receipt.cost,
            receipt.change
        ),
        VendorReply::Trained(TrainingResolution::Rejected { reason, refund }) => {
            tracing::info!("{} refused training ({:?}), refunded {}", name, reason, refund)
        }
        VendorReply::Restocked(true) => tracing::info!("{} restocked", name),
        VendorReply::Restocked(false) => tracing::debug!("{} restock not due", name),
        VendorReply::Reloaded { version } => {
            tracing::info!("{} reloaded catalog v{}", name, version)
        }
    }
}

/// Turn a reply into audit records; advanced training also lands in the daily ledger
async fn collect(
    db: &Database,
    vendor: ActorId,
    actor: ActorId,
    reply: &VendorReply,
    now: DateTime<Utc>,
    records: &mut Vec<TradeRecord>,
) -> anyhow::Result<()> {
    match reply {
        VendorReply::Bought(outcome) => records.extend(TradeRecord::from_buy(vendor, actor, outcome)),
        VendorReply::Sold(outcome) => records.extend(TradeRecord::from_sell(vendor, actor, outcome)),
        VendorReply::Trained(TrainingResolution::Applied(receipt)) => {
            if receipt.tier == TrainingTier::Advanced {
                sqlite::record_training(
                    db.pool(),
                    actor,
                    &receipt.skill,
                    now.date_naive(),
                    receipt.points,
                )
                .await?;
            }
            records.push(TradeRecord::from_training(vendor, actor, receipt));
        }
        _ => {}
    }
    Ok(())
}

fn report_actor(host: &MemoryHost, actor: ActorId) {
    let wallet = host.wallet(actor);
    tracing::info!(
        "{}: {} on hand, {} banked, {} received, {} companion(s)",
        actor,
        wallet.primary,
        wallet.reserve,
        host.coins_paid(actor),
        host.companions(actor).len()
    );
    for holding in host.holdings(actor) {
        tracing::debug!("{} holds {} x{}", actor, holding.template, holding.amount);
    }
}
