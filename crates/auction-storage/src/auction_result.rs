use {
    crate::{AuctionId, PgTransaction, PlayerId, TeamId},
    bigdecimal::BigDecimal,
    chrono::{DateTime, Utc},
    sqlx::PgConnection,
    std::ops::DerefMut,
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuctionResultRow {
    pub auction_id: AuctionId,
    pub player_id: PlayerId,
    pub team_id: TeamId,
    pub winning_bid_amount: BigDecimal,
    pub assigned_at: DateTime<Utc>,
}

/// Upsert keyed on `(auction_id, player_id)` (§3, §5 "Idempotency").
pub async fn upsert(ex: &mut PgTransaction<'_>, row: &AuctionResultRow) -> Result<(), sqlx::Error> {
    const QUERY: &str = r#"
INSERT INTO auction_results (auction_id, player_id, team_id, winning_bid_amount, assigned_at)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (auction_id, player_id)
DO UPDATE SET team_id = $3, winning_bid_amount = $4, assigned_at = $5
    ;"#;
    sqlx::query(QUERY)
        .bind(row.auction_id)
        .bind(row.player_id)
        .bind(row.team_id)
        .bind(&row.winning_bid_amount)
        .bind(row.assigned_at)
        .execute(ex.deref_mut())
        .await?;
    Ok(())
}

pub async fn delete(
    ex: &mut PgTransaction<'_>,
    auction_id: AuctionId,
    player_id: PlayerId,
) -> Result<(), sqlx::Error> {
    const QUERY: &str = "DELETE FROM auction_results WHERE auction_id = $1 AND player_id = $2;";
    sqlx::query(QUERY)
        .bind(auction_id)
        .bind(player_id)
        .execute(ex.deref_mut())
        .await?;
    Ok(())
}

pub async fn fetch_for_auction(
    ex: &mut PgConnection,
    auction_id: AuctionId,
) -> Result<Vec<AuctionResultRow>, sqlx::Error> {
    const QUERY: &str = "SELECT * FROM auction_results WHERE auction_id = $1;";
    sqlx::query_as(QUERY).bind(auction_id).fetch_all(ex).await
}
