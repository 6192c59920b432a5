//! JSON settings stored by key

use bazaar_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

/// Key under which the economy configuration is stored
pub const ECONOMY_CONFIG_KEY: &str = "economy_config";

/// Insert or replace a setting
pub async fn save_setting<T: Serialize>(pool: &SqlitePool, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = ?2",
    )
    .bind(key)
    .bind(&json)
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

/// Load a setting, `None` if it was never saved
pub async fn load_setting<T: DeserializeOwned>(pool: &SqlitePool, key: &str) -> Result<Option<T>> {
    let raw = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    match raw {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_setting_round_trip_and_overwrite() {
        let db = Database::connect_in_memory().await.unwrap();

        let missing: Option<BTreeMap<String, u32>> = load_setting(db.pool(), "limits").await.unwrap();
        assert!(missing.is_none());

        let mut limits = BTreeMap::new();
        limits.insert("maxSellLines".to_string(), 1000u32);
        save_setting(db.pool(), "limits", &limits).await.unwrap();

        limits.insert("maxSellLines".to_string(), 50);
        save_setting(db.pool(), "limits", &limits).await.unwrap();

        let loaded: BTreeMap<String, u32> = load_setting(db.pool(), "limits").await.unwrap().unwrap();
        assert_eq!(loaded["maxSellLines"], 50);
    }

    #[tokio::test]
    async fn test_malformed_setting_is_invalid_data() {
        let db = Database::connect_in_memory().await.unwrap();
        sqlx::query("INSERT INTO settings (key, value) VALUES ('broken', 'not json')")
            .execute(db.pool())
            .await
            .unwrap();

        let result: Result<Option<u32>> = load_setting(db.pool(), "broken").await;
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }
}
