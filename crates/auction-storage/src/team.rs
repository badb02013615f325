use {
    crate::{AuctionId, PgTransaction, TeamId},
    sqlx::PgConnection,
    std::ops::DerefMut,
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamRow {
    pub id: TeamId,
    pub auction_id: AuctionId,
    pub name: String,
}

pub async fn insert(ex: &mut PgTransaction<'_>, row: &TeamRow) -> Result<(), sqlx::Error> {
    const QUERY: &str = "INSERT INTO teams (id, auction_id, name) VALUES ($1, $2, $3);";
    sqlx::query(QUERY)
        .bind(row.id)
        .bind(row.auction_id)
        .bind(&row.name)
        .execute(ex.deref_mut())
        .await?;
    Ok(())
}

pub async fn fetch_for_auction(
    ex: &mut PgConnection,
    auction_id: AuctionId,
) -> Result<Vec<TeamRow>, sqlx::Error> {
    const QUERY: &str = "SELECT * FROM teams WHERE auction_id = $1;";
    sqlx::query_as(QUERY).bind(auction_id).fetch_all(ex).await
}
