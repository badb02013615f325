use {
    crate::{AuctionId, PgTransaction},
    chrono::{DateTime, Utc},
    serde_json::Value as JsonValue,
    sqlx::{types::Json, PgConnection},
    std::ops::DerefMut,
};

/// Row shape of the `auctions` table. `queue_state` and
/// `outcry_increment_rules` are opaque JSON blobs from this crate's point of
/// view; `auction-engine` owns their schema.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuctionRow {
    pub id: AuctionId,
    pub bidding_mode: String,
    pub budget_per_team: bigdecimal::BigDecimal,
    pub squad_size: i32,
    pub currency: String,
    pub outcry_increment_rules: JsonValue,
    pub timer_seconds: Option<i32>,
    pub status: String,
    pub queue_state: JsonValue,
    pub queue_version: i64,
    pub created_at: DateTime<Utc>,
}

pub async fn insert(ex: &mut PgConnection, row: &AuctionRow) -> Result<(), sqlx::Error> {
    const QUERY: &str = r#"
INSERT INTO auctions (
    id, bidding_mode, budget_per_team, squad_size, currency,
    outcry_increment_rules, timer_seconds, status, queue_state, queue_version, created_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
    ;"#;
    sqlx::query(QUERY)
        .bind(row.id)
        .bind(&row.bidding_mode)
        .bind(&row.budget_per_team)
        .bind(row.squad_size)
        .bind(&row.currency)
        .bind(&row.outcry_increment_rules)
        .bind(row.timer_seconds)
        .bind(&row.status)
        .bind(&row.queue_state)
        .bind(row.queue_version)
        .bind(row.created_at)
        .execute(ex)
        .await?;
    Ok(())
}

pub async fn load(ex: &mut PgConnection, id: AuctionId) -> Result<Option<AuctionRow>, sqlx::Error> {
    const QUERY: &str = r#"
SELECT id, bidding_mode, budget_per_team, squad_size, currency,
       outcry_increment_rules, timer_seconds, status, queue_state, queue_version, created_at
FROM auctions
WHERE id = $1
    ;"#;
    sqlx::query_as(QUERY).bind(id).fetch_optional(ex).await
}

pub async fn set_status(
    ex: &mut PgTransaction<'_>,
    id: AuctionId,
    status: &str,
) -> Result<(), sqlx::Error> {
    const QUERY: &str = "UPDATE auctions SET status = $2 WHERE id = $1;";
    sqlx::query(QUERY)
        .bind(id)
        .bind(status)
        .execute(ex.deref_mut())
        .await?;
    Ok(())
}

/// Optimistic-concurrency write of the queue state blob (§6, §4.9
/// `updateQueueState(expectedVersion)`). Returns `Ok(false)` instead of an
/// error when the expected version no longer matches, so callers can
/// distinguish "stale write" from "infrastructure failure".
pub async fn update_queue_state(
    ex: &mut PgTransaction<'_>,
    id: AuctionId,
    new_state: &JsonValue,
    expected_version: i64,
) -> Result<bool, sqlx::Error> {
    const QUERY: &str = r#"
UPDATE auctions
SET queue_state = $3, queue_version = queue_version + 1
WHERE id = $1 AND queue_version = $2
    ;"#;
    let result = sqlx::query(QUERY)
        .bind(id)
        .bind(expected_version)
        .bind(new_state)
        .execute(ex.deref_mut())
        .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn load_queue_state(
    ex: &mut PgConnection,
    id: AuctionId,
) -> Result<Option<(JsonValue, i64)>, sqlx::Error> {
    const QUERY: &str = "SELECT queue_state, queue_version FROM auctions WHERE id = $1;";
    let row: Option<(Json<JsonValue>, i64)> = sqlx::query_as(QUERY).bind(id).fetch_optional(ex).await?;
    Ok(row.map(|(state, version)| (state.0, version)))
}

#[cfg(test)]
mod tests {
    use {super::*, sqlx::Connection};

    #[tokio::test]
    #[ignore]
    async fn postgres_roundtrip() {
        let mut db = PgConnection::connect("postgresql://").await.unwrap();
        let mut db = db.begin().await.unwrap();
        crate::clear_DANGER_(&mut db).await.unwrap();

        let row = AuctionRow {
            id: AuctionId::new(),
            bidding_mode: "SEALED".to_string(),
            budget_per_team: "1000".parse().unwrap(),
            squad_size: 11,
            currency: "USD".to_string(),
            outcry_increment_rules: JsonValue::Array(vec![]),
            timer_seconds: None,
            status: "LIVE".to_string(),
            queue_state: JsonValue::Null,
            queue_version: 0,
            created_at: Utc::now(),
        };
        insert(&mut db, &row).await.unwrap();
        let loaded = load(&mut db, row.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, row.id);

        let updated = update_queue_state(&mut db, row.id, &JsonValue::Bool(true), 0)
            .await
            .unwrap();
        assert!(updated);
        let stale = update_queue_state(&mut db, row.id, &JsonValue::Bool(false), 0)
            .await
            .unwrap();
        assert!(!stale);
    }
}
