use {
    crate::{AuctionId, PgTransaction, TierId},
    bigdecimal::BigDecimal,
    sqlx::PgConnection,
    std::ops::DerefMut,
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TierRow {
    pub id: TierId,
    pub auction_id: AuctionId,
    pub base_price: BigDecimal,
    pub min_per_team: i32,
    pub max_per_team: Option<i32>,
}

pub async fn insert(ex: &mut PgTransaction<'_>, row: &TierRow) -> Result<(), sqlx::Error> {
    const QUERY: &str = r#"
INSERT INTO tiers (id, auction_id, base_price, min_per_team, max_per_team)
VALUES ($1, $2, $3, $4, $5)
    ;"#;
    sqlx::query(QUERY)
        .bind(row.id)
        .bind(row.auction_id)
        .bind(&row.base_price)
        .bind(row.min_per_team)
        .bind(row.max_per_team)
        .execute(ex.deref_mut())
        .await?;
    Ok(())
}

pub async fn fetch_for_auction(
    ex: &mut PgConnection,
    auction_id: AuctionId,
) -> Result<Vec<TierRow>, sqlx::Error> {
    const QUERY: &str = "SELECT * FROM tiers WHERE auction_id = $1;";
    sqlx::query_as(QUERY).bind(auction_id).fetch_all(ex).await
}
