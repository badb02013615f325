use {
    crate::domain::money::Money,
    auction_storage::{BidId, RoundId, TeamId},
    chrono::{DateTime, Utc},
    serde::Serialize,
};

/// §3 "Bid". In sealed mode multiple bids per `(round, team)` are possible
/// and only the highest/latest counts; in outcry mode bids are strictly
/// increasing in `sequence_number` and `amount` (P5).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: BidId,
    pub round_id: RoundId,
    pub team_id: TeamId,
    pub amount: Money,
    pub submitted_at: DateTime<Utc>,
    pub sequence_number: Option<i64>,
    pub is_winning_bid: bool,
}
