use {
    crate::{AuctionId, PgTransaction, PlayerId, RoundId, TeamId, TierId},
    bigdecimal::BigDecimal,
    chrono::{DateTime, Utc},
    sqlx::PgConnection,
    std::ops::DerefMut,
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoundRow {
    pub id: RoundId,
    pub auction_id: AuctionId,
    pub player_id: PlayerId,
    pub tier_id: TierId,
    pub status: String,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub base_price: BigDecimal,
    pub current_bid_amount: Option<BigDecimal>,
    pub current_bid_team_id: Option<TeamId>,
    pub bid_count: i32,
    pub timer_expires_at: Option<DateTime<Utc>>,
}

/// Opens a new round. Must be called only after [`close_open_rounds`] in the
/// same transaction (§4.3, §4.5 step 5-6): the partial unique index
/// `rounds_single_open_per_auction` makes violating that invariant a
/// constraint error rather than silent corruption.
pub async fn create(ex: &mut PgTransaction<'_>, row: &RoundRow) -> Result<(), sqlx::Error> {
    const QUERY: &str = r#"
INSERT INTO rounds (
    id, auction_id, player_id, tier_id, status, opened_at, closed_at,
    base_price, current_bid_amount, current_bid_team_id, bid_count, timer_expires_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
    ;"#;
    sqlx::query(QUERY)
        .bind(row.id)
        .bind(row.auction_id)
        .bind(row.player_id)
        .bind(row.tier_id)
        .bind(&row.status)
        .bind(row.opened_at)
        .bind(row.closed_at)
        .bind(&row.base_price)
        .bind(&row.current_bid_amount)
        .bind(row.current_bid_team_id)
        .bind(row.bid_count)
        .bind(row.timer_expires_at)
        .execute(ex.deref_mut())
        .await?;
    Ok(())
}

/// Idempotent: closing an already-closed round (or none at all) is a no-op
/// (§5 "Idempotency").
pub async fn close_open_rounds(
    ex: &mut PgTransaction<'_>,
    auction_id: AuctionId,
    closed_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    const QUERY: &str = r#"
UPDATE rounds
SET status = 'CLOSED', closed_at = $2
WHERE auction_id = $1 AND status = 'OPEN'
    ;"#;
    sqlx::query(QUERY)
        .bind(auction_id)
        .bind(closed_at)
        .execute(ex.deref_mut())
        .await?;
    Ok(())
}

pub async fn open_round_for_auction(
    ex: &mut PgConnection,
    auction_id: AuctionId,
) -> Result<Option<RoundRow>, sqlx::Error> {
    const QUERY: &str = "SELECT * FROM rounds WHERE auction_id = $1 AND status = 'OPEN';";
    sqlx::query_as(QUERY).bind(auction_id).fetch_optional(ex).await
}

pub async fn load(ex: &mut PgConnection, id: RoundId) -> Result<Option<RoundRow>, sqlx::Error> {
    const QUERY: &str = "SELECT * FROM rounds WHERE id = $1;";
    sqlx::query_as(QUERY).bind(id).fetch_optional(ex).await
}

/// Compare-and-swap over the round row (§4.9 `atomicOutcryRaise`). Returns
/// `true` ("accepted") on success, `false` ("stale") if `expected_bid_count`
/// no longer matches — it never partially updates.
#[allow(clippy::too_many_arguments)]
pub async fn atomic_outcry_raise(
    ex: &mut PgConnection,
    round_id: RoundId,
    team_id: TeamId,
    expected_bid_count: i32,
    new_amount: &BigDecimal,
    timer_expires_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    const QUERY: &str = r#"
UPDATE rounds
SET current_bid_amount = $4,
    current_bid_team_id = $3,
    bid_count = bid_count + 1,
    timer_expires_at = $5
WHERE id = $1 AND bid_count = $2 AND status = 'OPEN'
    ;"#;
    let result = sqlx::query(QUERY)
        .bind(round_id)
        .bind(expected_bid_count)
        .bind(team_id)
        .bind(new_amount)
        .bind(timer_expires_at)
        .execute(ex)
        .await?;
    Ok(result.rows_affected() == 1)
}
