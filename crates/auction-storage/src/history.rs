use {
    crate::{AuctionId, PgTransaction, PlayerId, TeamId},
    bigdecimal::BigDecimal,
    chrono::{DateTime, Utc},
    sqlx::PgConnection,
    std::ops::DerefMut,
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HistoryRow {
    pub id: i64,
    pub auction_id: AuctionId,
    pub player_id: PlayerId,
    pub team_id: Option<TeamId>,
    pub price: BigDecimal,
    pub action: String,
    pub recorded_at: DateTime<Utc>,
}

pub struct NewHistoryRow {
    pub auction_id: AuctionId,
    pub player_id: PlayerId,
    pub team_id: Option<TeamId>,
    pub price: BigDecimal,
    pub action: String,
}

pub async fn append(
    ex: &mut PgTransaction<'_>,
    row: NewHistoryRow,
    recorded_at: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    const QUERY: &str = r#"
INSERT INTO history_entries (auction_id, player_id, team_id, price, action, recorded_at)
VALUES ($1, $2, $3, $4, $5, $6)
RETURNING id
    ;"#;
    let (id,): (i64,) = sqlx::query_as(QUERY)
        .bind(row.auction_id)
        .bind(row.player_id)
        .bind(row.team_id)
        .bind(&row.price)
        .bind(&row.action)
        .bind(recorded_at)
        .fetch_one(ex.deref_mut())
        .await?;
    Ok(id)
}

/// Removes the most recently appended entry for this auction, for UNDO
/// (§4.2). Returns the removed row so the caller can invert it.
pub async fn pop_last(
    ex: &mut PgTransaction<'_>,
    auction_id: AuctionId,
) -> Result<Option<HistoryRow>, sqlx::Error> {
    const QUERY: &str = r#"
DELETE FROM history_entries
WHERE id = (
    SELECT id FROM history_entries WHERE auction_id = $1 ORDER BY id DESC LIMIT 1
)
RETURNING *
    ;"#;
    sqlx::query_as(QUERY).bind(auction_id).fetch_optional(ex.deref_mut()).await
}

pub async fn fetch_tail(
    ex: &mut PgConnection,
    auction_id: AuctionId,
    limit: i64,
) -> Result<Vec<HistoryRow>, sqlx::Error> {
    const QUERY: &str = r#"
SELECT * FROM history_entries WHERE auction_id = $1 ORDER BY id DESC LIMIT $2
    ;"#;
    sqlx::query_as(QUERY).bind(auction_id).bind(limit).fetch_all(ex).await
}
