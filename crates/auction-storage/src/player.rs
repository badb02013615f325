use {
    crate::{AuctionId, PgTransaction, PlayerId, TierId},
    sqlx::PgConnection,
    std::ops::DerefMut,
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlayerRow {
    pub id: PlayerId,
    pub auction_id: AuctionId,
    pub name: String,
    pub tier_id: TierId,
    pub status: String,
}

pub async fn insert(ex: &mut PgTransaction<'_>, row: &PlayerRow) -> Result<(), sqlx::Error> {
    const QUERY: &str =
        "INSERT INTO players (id, auction_id, name, tier_id, status) VALUES ($1, $2, $3, $4, $5);";
    sqlx::query(QUERY)
        .bind(row.id)
        .bind(row.auction_id)
        .bind(&row.name)
        .bind(row.tier_id)
        .bind(&row.status)
        .execute(ex.deref_mut())
        .await?;
    Ok(())
}

pub async fn fetch_for_auction(
    ex: &mut PgConnection,
    auction_id: AuctionId,
) -> Result<Vec<PlayerRow>, sqlx::Error> {
    const QUERY: &str = "SELECT * FROM players WHERE auction_id = $1;";
    sqlx::query_as(QUERY).bind(auction_id).fetch_all(ex).await
}

pub async fn set_status(
    ex: &mut PgTransaction<'_>,
    id: PlayerId,
    status: &str,
) -> Result<(), sqlx::Error> {
    const QUERY: &str = "UPDATE players SET status = $2 WHERE id = $1;";
    sqlx::query(QUERY)
        .bind(id)
        .bind(status)
        .execute(ex.deref_mut())
        .await?;
    Ok(())
}
