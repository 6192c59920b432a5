//! Per-vendor catalog snapshots

use bazaar_core::{ActorId, CatalogSnapshot, Error, Result, StockEntry};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// A saved catalog and when it was last restocked
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCatalog {
    pub snapshot: CatalogSnapshot,
    pub last_restock: DateTime<Utc>,
}

/// Replace the saved catalog of a vendor
pub async fn save_snapshot(
    pool: &SqlitePool,
    vendor: ActorId,
    snapshot: &CatalogSnapshot,
    last_restock: DateTime<Utc>,
) -> Result<()> {
    let entries = serde_json::to_string(&snapshot.entries)?;

    sqlx::query(
        r#"
        INSERT INTO catalog_snapshots (vendor_id, version, entries, last_restock)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(vendor_id) DO UPDATE SET
            version = ?2,
            entries = ?3,
            last_restock = ?4,
            saved_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(vendor.0 as i64)
    .bind(snapshot.version as i64)
    .bind(&entries)
    .bind(last_restock.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

/// Load the saved catalog of a vendor, `None` if there is none
pub async fn load_snapshot(pool: &SqlitePool, vendor: ActorId) -> Result<Option<StoredCatalog>> {
    let row: Option<(i64, String, String)> = sqlx::query_as(
        "SELECT version, entries, last_restock FROM catalog_snapshots WHERE vendor_id = ?",
    )
    .bind(vendor.0 as i64)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    let Some((version, entries, last_restock)) = row else {
        return Ok(None);
    };

    let entries: Vec<StockEntry> = serde_json::from_str(&entries)?;
    let last_restock = DateTime::parse_from_rfc3339(&last_restock)
        .map_err(|e| Error::InvalidData(format!("last_restock: {}", e)))?
        .with_timezone(&Utc);
    let version = u32::try_from(version)
        .map_err(|_| Error::InvalidData(format!("catalog version {}", version)))?;

    Ok(Some(StoredCatalog {
        snapshot: CatalogSnapshot { version, entries },
        last_restock,
    }))
}

/// Forget a vendor's saved catalog
pub async fn delete_snapshot(pool: &SqlitePool, vendor: ActorId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM catalog_snapshots WHERE vendor_id = ?")
        .bind(vendor.0 as i64)
        .execute(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use bazaar_core::{Gold, GoodsKind};
    use chrono::TimeZone;

    fn snapshot(version: u32, quantity: u32) -> CatalogSnapshot {
        CatalogSnapshot {
            version,
            entries: vec![StockEntry {
                template: "rope".into(),
                name: "coil of rope".into(),
                base_price: Gold(12),
                quantity,
                max_quantity: 40,
                control_cost: 0,
                resellable: true,
                kind: GoodsKind::default(),
            }],
        }
    }

    #[tokio::test]
    async fn test_snapshot_save_and_load() {
        let db = Database::connect_in_memory().await.unwrap();
        let vendor = ActorId(4);
        let restocked = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        assert!(load_snapshot(db.pool(), vendor).await.unwrap().is_none());

        save_snapshot(db.pool(), vendor, &snapshot(1, 30), restocked)
            .await
            .unwrap();
        save_snapshot(db.pool(), vendor, &snapshot(2, 12), restocked)
            .await
            .unwrap();

        let stored = load_snapshot(db.pool(), vendor).await.unwrap().unwrap();
        assert_eq!(stored.snapshot, snapshot(2, 12));
        assert_eq!(stored.last_restock, restocked);

        assert!(delete_snapshot(db.pool(), vendor).await.unwrap());
        assert!(load_snapshot(db.pool(), vendor).await.unwrap().is_none());
    }
}
