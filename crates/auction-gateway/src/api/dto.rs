//! Wire shapes for `AuctionSnapshot` and its sub-parts. `AuctionSnapshot`
//! itself skips `squads` (§4.5 step 8 derives them on demand rather than
//! storing them), so every response that needs per-team budget/roster
//! figures goes through [`SnapshotView`] instead of serializing the engine's
//! internal snapshot directly.

use {
    auction_engine::{
        domain::team::{self, SquadSlot},
        AuctionSnapshot,
    },
    auction_storage::{PlayerId, TeamId, TierId},
    serde::Serialize,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SquadSlotView {
    pub player_id: PlayerId,
    pub tier_id: TierId,
    pub winning_bid_amount: i64,
}

impl From<SquadSlot> for SquadSlotView {
    fn from(slot: SquadSlot) -> Self {
        Self { player_id: slot.player_id, tier_id: slot.tier_id, winning_bid_amount: slot.winning_bid_amount.0 }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamView {
    pub id: TeamId,
    pub name: String,
    pub remaining_budget: i64,
    pub squad: Vec<SquadSlotView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotView<'a> {
    pub auction: &'a auction_engine::domain::auction::Auction,
    pub teams: Vec<TeamView>,
    pub players: &'a [auction_engine::domain::player::Player],
    pub open_round: &'a Option<auction_engine::domain::round::Round>,
    pub current_round_bids: &'a [auction_engine::domain::bid::Bid],
    pub queue_state: &'a auction_engine::domain::queue::QueueState,
    pub queue_version: i64,
}

impl<'a> SnapshotView<'a> {
    pub fn of(snapshot: &'a AuctionSnapshot) -> Self {
        let teams = snapshot
            .teams
            .iter()
            .map(|t| {
                let squad = snapshot.squad_for(t.id);
                let remaining_budget = team::remaining_budget(&snapshot.auction, &squad);
                TeamView {
                    id: t.id,
                    name: t.name.clone(),
                    remaining_budget: remaining_budget.0,
                    squad: squad.0.into_iter().map(SquadSlotView::from).collect(),
                }
            })
            .collect();

        Self {
            auction: &snapshot.auction,
            teams,
            players: &snapshot.players,
            open_round: &snapshot.open_round,
            current_round_bids: &snapshot.current_round_bids,
            queue_state: &snapshot.queue_state,
            queue_version: snapshot.queue_version,
        }
    }
}

/// `GET /captain/{auctionId}/{teamId}` payload (§6): the canonical snapshot
/// plus the caller's own team singled out, so the dashboard doesn't have to
/// search `teams` client-side.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptainDashboard<'a> {
    #[serde(flatten)]
    pub snapshot: SnapshotView<'a>,
    pub own_team_id: TeamId,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SealedBidRequest {
    pub round_id: auction_storage::RoundId,
    pub player_id: PlayerId,
    pub amount: i64,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutcryRaiseRequest {
    pub round_id: auction_storage::RoundId,
    pub amount: i64,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "action", deny_unknown_fields)]
pub enum ActionRequest {
    Sold { team_id: TeamId, amount: i64 },
    Unsold,
    Defer,
    Undo,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ForceOpenRoundRequest {
    pub player_id: PlayerId,
}
