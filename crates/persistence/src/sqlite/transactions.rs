//! Trade audit log

use bazaar_core::{
    ActorId, BuyOutcome, BuyTarget, Error, Result, SellOutcome, Settlement, TradeType,
    TrainingReceipt,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// One line of a trade, ready to be logged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRecord {
    pub vendor: ActorId,
    pub actor: ActorId,
    pub trade_type: TradeType,
    /// Template, shelf lot or trained skill
    pub subject: String,
    /// Units traded, or tenths of a point for training
    pub amount: u64,
    pub unit_price: u64,
    pub total: u64,
    pub settlement: String,
}

impl TradeRecord {
    pub fn from_buy(vendor: ActorId, actor: ActorId, outcome: &BuyOutcome) -> Vec<Self> {
        outcome
            .lines
            .iter()
            .map(|line| TradeRecord {
                vendor,
                actor,
                trade_type: TradeType::Buy,
                subject: match &line.target {
                    BuyTarget::Stock(template) => template.to_string(),
                    BuyTarget::Shelf(lot) => format!("lot:{}", lot.0),
                },
                amount: line.amount as u64,
                unit_price: line.unit_price.as_u64(),
                total: line.subtotal.as_u64(),
                settlement: match outcome.paid_from {
                    Some(source) => format!("{:?}", source).to_lowercase(),
                    None => String::new(),
                },
            })
            .collect()
    }

    pub fn from_sell(vendor: ActorId, actor: ActorId, outcome: &SellOutcome) -> Vec<Self> {
        outcome
            .lines
            .iter()
            .map(|line| TradeRecord {
                vendor,
                actor,
                trade_type: TradeType::Sell,
                subject: line.template.to_string(),
                amount: line.amount as u64,
                unit_price: line.unit_price.as_u64(),
                total: line.subtotal.as_u64(),
                settlement: match line.settlement {
                    Settlement::Resold {
                        restocked,
                        shelved,
                    } => format!("resold:{}+{}", restocked, shelved),
                    Settlement::Destroyed => "destroyed".to_string(),
                },
            })
            .collect()
    }

    pub fn from_training(vendor: ActorId, actor: ActorId, receipt: &TrainingReceipt) -> Self {
        let tenths = receipt.points.tenths() as u64;
        TradeRecord {
            vendor,
            actor,
            trade_type: TradeType::Train,
            subject: receipt.skill.clone(),
            amount: tenths,
            unit_price: receipt.cost.as_u64().checked_div(tenths).unwrap_or(0),
            total: receipt.cost.as_u64(),
            settlement: format!("{:?}", receipt.tier).to_lowercase(),
        }
    }
}

/// Trade record stored in database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TradeRow {
    pub id: i64,
    pub vendor_id: i64,
    pub actor_id: i64,
    pub trade_type: String,
    pub subject: String,
    pub amount: i64,
    pub unit_price: i64,
    pub total: i64,
    pub settlement: String,
    pub created_at: Option<String>,
}

/// Log a trade line
pub async fn log_trade(pool: &SqlitePool, record: &TradeRecord) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO trade_log (vendor_id, actor_id, trade_type, subject, amount, unit_price, total, settlement)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.vendor.0 as i64)
    .bind(record.actor.0 as i64)
    .bind(record.trade_type.as_str())
    .bind(&record.subject)
    .bind(record.amount as i64)
    .bind(record.unit_price as i64)
    .bind(record.total as i64)
    .bind(&record.settlement)
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.last_insert_rowid())
}

/// Log several lines in one transaction
pub async fn log_trades(pool: &SqlitePool, records: &[TradeRecord]) -> Result<usize> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    for record in records {
        sqlx::query(
            r#"
            INSERT INTO trade_log (vendor_id, actor_id, trade_type, subject, amount, unit_price, total, settlement)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.vendor.0 as i64)
        .bind(record.actor.0 as i64)
        .bind(record.trade_type.as_str())
        .bind(&record.subject)
        .bind(record.amount as i64)
        .bind(record.unit_price as i64)
        .bind(record.total as i64)
        .bind(&record.settlement)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;
    }

    tx.commit()
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(records.len())
}

/// Get trades of a vendor, newest first, optionally of one type
pub async fn get_trades(
    pool: &SqlitePool,
    vendor: ActorId,
    limit: u32,
    trade_type: Option<TradeType>,
) -> Result<Vec<TradeRow>> {
    let mut query = String::from(
        r#"
        SELECT id, vendor_id, actor_id, trade_type, subject, amount, unit_price, total, settlement, created_at
        FROM trade_log
        WHERE vendor_id = ?
        "#,
    );

    if trade_type.is_some() {
        query.push_str(" AND trade_type = ?");
    }
    query.push_str(" ORDER BY id DESC LIMIT ?");

    let mut builder = sqlx::query_as::<_, TradeRow>(&query).bind(vendor.0 as i64);
    if let Some(tt) = trade_type {
        builder = builder.bind(tt.as_str());
    }

    let rows = builder
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(rows)
}

/// Total currency that changed hands for one trade type at a vendor
pub async fn trade_volume(pool: &SqlitePool, vendor: ActorId, trade_type: TradeType) -> Result<u64> {
    let row: (Option<i64>,) =
        sqlx::query_as("SELECT SUM(total) FROM trade_log WHERE vendor_id = ? AND trade_type = ?")
            .bind(vendor.0 as i64)
            .bind(trade_type.as_str())
            .fetch_one(pool)
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(row.0.unwrap_or(0).max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use bazaar_core::{
        BoughtLine, FundSource, Gold, ItemId, Payout, SkillValue, SoldLine, TrainingTier,
    };

    const VENDOR: ActorId = ActorId(1);
    const ACTOR: ActorId = ActorId(9);

    #[tokio::test]
    async fn test_log_and_filter_trades() {
        let db = Database::connect_in_memory().await.unwrap();

        let bought = BuyOutcome {
            lines: vec![BoughtLine {
                target: BuyTarget::Stock("rope".into()),
                name: "coil of rope".into(),
                amount: 3,
                unit_price: Gold(12),
                subtotal: Gold(36),
            }],
            total_cost: Gold(36),
            fully_filled: true,
            paid_from: Some(FundSource::Primary),
        };
        let sold = SellOutcome {
            lines: vec![SoldLine {
                item: ItemId(5),
                template: "wolf_pelt".into(),
                amount: 2,
                unit_price: Gold(15),
                subtotal: Gold(30),
                settlement: Settlement::Destroyed,
            }],
            total_payment: Gold(30),
            payout: Some(Payout::Coins(Gold(30))),
            begging_applied: false,
        };

        let mut records = TradeRecord::from_buy(VENDOR, ACTOR, &bought);
        records.extend(TradeRecord::from_sell(VENDOR, ACTOR, &sold));
        assert_eq!(log_trades(db.pool(), &records).await.unwrap(), 2);

        let all = get_trades(db.pool(), VENDOR, 10, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].trade_type, "SELL");
        assert_eq!(all[0].settlement, "destroyed");
        assert_eq!(all[1].subject, "rope");
        assert_eq!(all[1].settlement, "primary");

        let buys = get_trades(db.pool(), VENDOR, 10, Some(TradeType::Buy))
            .await
            .unwrap();
        assert_eq!(buys.len(), 1);
        assert_eq!(trade_volume(db.pool(), VENDOR, TradeType::Sell).await.unwrap(), 30);
        assert!(get_trades(db.pool(), ActorId(2), 10, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_training_receipt_is_logged_in_tenths() {
        let db = Database::connect_in_memory().await.unwrap();
        let receipt = TrainingReceipt {
            skill: "fishing".into(),
            tier: TrainingTier::Beginner,
            points: SkillValue::from_tenths(23),
            new_value: SkillValue::from_tenths(223),
            cost: Gold(230),
            change: Gold(7),
            reductions: Vec::new(),
        };

        let id = log_trade(db.pool(), &TradeRecord::from_training(VENDOR, ACTOR, &receipt))
            .await
            .unwrap();
        assert!(id > 0);

        let rows = get_trades(db.pool(), VENDOR, 1, Some(TradeType::Train))
            .await
            .unwrap();
        assert_eq!(rows[0].amount, 23);
        assert_eq!(rows[0].unit_price, 10);
        assert_eq!(rows[0].settlement, "beginner");
    }
}
