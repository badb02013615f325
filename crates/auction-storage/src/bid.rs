use {
    crate::{BidId, PgTransaction, RoundId, TeamId},
    bigdecimal::BigDecimal,
    chrono::{DateTime, Utc},
    sqlx::PgConnection,
    std::ops::DerefMut,
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BidRow {
    pub id: BidId,
    pub round_id: RoundId,
    pub team_id: TeamId,
    pub amount: BigDecimal,
    pub submitted_at: DateTime<Utc>,
    pub sequence_number: Option<i64>,
    pub is_winning_bid: bool,
}

/// Inserts a sealed or outcry bid row (§4.4). Sealed mode calls this once per
/// submission and leaves `sequence_number` unset; outcry's accepted raise is
/// recorded through [`crate::round::atomic_outcry_raise`] succeeding and then
/// calling this with the sequence number it was assigned.
pub async fn insert(ex: &mut PgTransaction<'_>, row: &BidRow) -> Result<(), sqlx::Error> {
    const QUERY: &str = r#"
INSERT INTO bids (id, round_id, team_id, amount, submitted_at, sequence_number, is_winning_bid)
VALUES ($1, $2, $3, $4, $5, $6, $7)
    ;"#;
    sqlx::query(QUERY)
        .bind(row.id)
        .bind(row.round_id)
        .bind(row.team_id)
        .bind(&row.amount)
        .bind(row.submitted_at)
        .bind(row.sequence_number)
        .bind(row.is_winning_bid)
        .execute(ex.deref_mut())
        .await?;
    Ok(())
}

pub async fn fetch_for_round(
    ex: &mut PgConnection,
    round_id: RoundId,
) -> Result<Vec<BidRow>, sqlx::Error> {
    const QUERY: &str = "SELECT * FROM bids WHERE round_id = $1 ORDER BY submitted_at ASC;";
    sqlx::query_as(QUERY).bind(round_id).fetch_all(ex).await
}

/// Marks one bid from `team_id` in `round_id` as the winning bid (§4.5 SOLD
/// step 3). Sealed-mode settlement is authoritative on (team, amount); this
/// just flags a matching existing row for the audit trail, it does not
/// create one (§9 open question 2).
pub async fn mark_winning(
    ex: &mut PgTransaction<'_>,
    round_id: RoundId,
    team_id: TeamId,
) -> Result<(), sqlx::Error> {
    const QUERY: &str = r#"
UPDATE bids
SET is_winning_bid = true
WHERE id = (
    SELECT id FROM bids
    WHERE round_id = $1 AND team_id = $2
    ORDER BY amount DESC, submitted_at DESC
    LIMIT 1
)
    ;"#;
    sqlx::query(QUERY)
        .bind(round_id)
        .bind(team_id)
        .execute(ex.deref_mut())
        .await?;
    Ok(())
}
