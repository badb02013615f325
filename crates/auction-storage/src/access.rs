//! Lookup tables backing the authorization resolver's three admin sources
//! (§4.7 C7): designated captain, team roles, auction roles.

use {
    crate::{AuctionId, PgTransaction, TeamId},
    sqlx::PgConnection,
    std::ops::DerefMut,
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamCaptainRow {
    pub team_id: TeamId,
    pub user_id: String,
    pub user_email: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamRoleRow {
    pub team_id: TeamId,
    pub user_id: String,
    pub role: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuctionRoleRow {
    pub auction_id: AuctionId,
    pub user_id: String,
    pub role: String,
}

pub async fn set_captain(
    ex: &mut PgTransaction<'_>,
    team_id: TeamId,
    user_id: &str,
    user_email: &str,
) -> Result<(), sqlx::Error> {
    const QUERY: &str = r#"
INSERT INTO team_captains (team_id, user_id, user_email)
VALUES ($1, $2, $3)
ON CONFLICT (team_id) DO UPDATE SET user_id = $2, user_email = $3
    ;"#;
    sqlx::query(QUERY).bind(team_id).bind(user_id).bind(user_email).execute(ex.deref_mut()).await?;
    Ok(())
}

pub async fn grant_team_role(
    ex: &mut PgTransaction<'_>,
    team_id: TeamId,
    user_id: &str,
    role: &str,
) -> Result<(), sqlx::Error> {
    const QUERY: &str = r#"
INSERT INTO team_roles (team_id, user_id, role) VALUES ($1, $2, $3)
ON CONFLICT DO NOTHING
    ;"#;
    sqlx::query(QUERY).bind(team_id).bind(user_id).bind(role).execute(ex.deref_mut()).await?;
    Ok(())
}

pub async fn grant_auction_role(
    ex: &mut PgTransaction<'_>,
    auction_id: AuctionId,
    user_id: &str,
    role: &str,
) -> Result<(), sqlx::Error> {
    const QUERY: &str = r#"
INSERT INTO auction_roles (auction_id, user_id, role) VALUES ($1, $2, $3)
ON CONFLICT DO NOTHING
    ;"#;
    sqlx::query(QUERY).bind(auction_id).bind(user_id).bind(role).execute(ex.deref_mut()).await?;
    Ok(())
}

pub async fn fetch_captain(ex: &mut PgConnection, team_id: TeamId) -> Result<Option<TeamCaptainRow>, sqlx::Error> {
    const QUERY: &str = "SELECT * FROM team_captains WHERE team_id = $1;";
    sqlx::query_as(QUERY).bind(team_id).fetch_optional(ex).await
}

pub async fn fetch_team_roles(
    ex: &mut PgConnection,
    team_id: TeamId,
    user_id: &str,
) -> Result<Vec<TeamRoleRow>, sqlx::Error> {
    const QUERY: &str = "SELECT * FROM team_roles WHERE team_id = $1 AND user_id = $2;";
    sqlx::query_as(QUERY).bind(team_id).bind(user_id).fetch_all(ex).await
}

pub async fn fetch_auction_roles(
    ex: &mut PgConnection,
    auction_id: AuctionId,
    user_id: &str,
) -> Result<Vec<AuctionRoleRow>, sqlx::Error> {
    const QUERY: &str = "SELECT * FROM auction_roles WHERE auction_id = $1 AND user_id = $2;";
    sqlx::query_as(QUERY).bind(auction_id).bind(user_id).fetch_all(ex).await
}
