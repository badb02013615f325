use {
    crate::domain::money::Money,
    auction_storage::{AuctionId, PlayerId, RoundId, TeamId, TierId},
    chrono::{DateTime, Utc},
    serde::Serialize,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundStatus {
    Open,
    Closed,
}

/// §3 "Round" (C3). At most one OPEN round per auction — enforced by C5
/// always closing the prior round before opening the next, and backstopped
/// by a partial unique index at the storage layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: RoundId,
    pub auction_id: AuctionId,
    pub player_id: PlayerId,
    pub tier_id: TierId,
    pub status: RoundStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub base_price: Money,
    pub current_bid_amount: Option<Money>,
    pub current_bid_team_id: Option<TeamId>,
    pub bid_count: u32,
    pub timer_expires_at: Option<DateTime<Utc>>,
}

impl Round {
    pub fn is_open(&self) -> bool {
        matches!(self.status, RoundStatus::Open)
    }

    /// §4.3, §9 "Timer semantics": informational, not enforcing — admission
    /// checks `timerExpiresAt > now`, it does not itself close the round.
    pub fn timer_expired(&self, now: DateTime<Utc>) -> bool {
        match self.timer_expires_at {
            Some(expiry) => now >= expiry,
            None => false,
        }
    }
}
