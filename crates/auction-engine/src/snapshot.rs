//! §4.5 step 8 "broadcast the updated state" / §4.8 `Event::StateSync`: the
//! one canonical read model every HTTP response and event payload is built
//! from, so clients never have to reconstruct it from partial deltas.

use {
    crate::domain::{
        auction::Auction,
        bid::Bid,
        player::Player,
        queue::QueueState,
        round::Round,
        team::{Squad, Team},
    },
    auction_storage::TeamId,
    serde::Serialize,
    std::collections::HashMap,
};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSnapshot {
    pub auction: Auction,
    pub teams: Vec<Team>,
    pub players: Vec<Player>,
    #[serde(skip)]
    pub squads: HashMap<TeamId, Squad>,
    pub open_round: Option<Round>,
    pub current_round_bids: Vec<Bid>,
    pub queue_state: QueueState,
    pub queue_version: i64,
}

impl AuctionSnapshot {
    pub fn current_player(&self) -> Option<&Player> {
        let player_id = self.queue_state.current()?;
        self.players.iter().find(|player| player.id == player_id)
    }

    pub fn squad_for(&self, team_id: TeamId) -> Squad {
        self.squads.get(&team_id).cloned().unwrap_or_default()
    }
}
