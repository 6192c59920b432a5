//! Daily advanced-training ledger

use bazaar_core::{ActorId, Error, Result, SkillValue};
use chrono::NaiveDate;
use sqlx::SqlitePool;

/// Add points trained on `day` to an actor's counter for a skill
pub async fn record_training(
    pool: &SqlitePool,
    actor: ActorId,
    skill: &str,
    day: NaiveDate,
    points: SkillValue,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO training_ledger (actor_id, skill, day, points)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(actor_id, skill, day) DO UPDATE SET points = points + ?4
        "#,
    )
    .bind(actor.0 as i64)
    .bind(skill)
    .bind(day.to_string())
    .bind(points.tenths() as i64)
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

/// Points an actor trained in a skill on `day`
pub async fn trained_on(
    pool: &SqlitePool,
    actor: ActorId,
    skill: &str,
    day: NaiveDate,
) -> Result<SkillValue> {
    let points: Option<i64> = sqlx::query_scalar(
        "SELECT points FROM training_ledger WHERE actor_id = ? AND skill = ? AND day = ?",
    )
    .bind(actor.0 as i64)
    .bind(skill)
    .bind(day.to_string())
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(SkillValue::from_tenths(
        points.unwrap_or(0).clamp(0, u32::MAX as i64) as u32,
    ))
}

/// Drop rows older than `day`; only the current day is ever consulted
pub async fn prune_ledger_before(pool: &SqlitePool, day: NaiveDate) -> Result<u64> {
    let result = sqlx::query("DELETE FROM training_ledger WHERE day < ?")
        .bind(day.to_string())
        .execute(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected())
}
