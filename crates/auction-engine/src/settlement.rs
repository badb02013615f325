//! §4.5 "Settlement Engine" (C5). Applies one auctioneer action to the
//! current round, transactionally, and returns the canonical snapshot
//! (§4.5 step 8).

use {
    crate::{
        domain::{
            auction::AuctionStatus,
            error::EngineError,
            money::Money,
            queue::{Action as HistoryAction, HistoryEntry, QueueState},
            round::{Round, RoundStatus},
        },
        persistence::Persistence,
        snapshot::AuctionSnapshot,
    },
    auction_storage::{AuctionId, PlayerId, RoundId, TeamId},
    chrono::Utc,
    std::sync::Arc,
    tracing::Instrument,
};

/// §4.5 "Input: action ∈ {SOLD, UNSOLD, DEFER, UNDO}".
pub enum SettlementAction {
    Sold { team_id: TeamId, amount: Money },
    Unsold,
    Defer,
    Undo,
}

impl SettlementAction {
    fn name(&self) -> &'static str {
        match self {
            Self::Sold { .. } => "SOLD",
            Self::Unsold => "UNSOLD",
            Self::Defer => "DEFER",
            Self::Undo => "UNDO",
        }
    }
}

const MAX_CAS_RETRIES: u32 = 3;

pub struct SettlementEngine {
    persistence: Arc<dyn Persistence>,
}

impl SettlementEngine {
    pub fn new(persistence: Arc<dyn Persistence>) -> Self {
        Self { persistence }
    }

    pub async fn apply(&self, auction_id: AuctionId, action: SettlementAction) -> Result<AuctionSnapshot, EngineError> {
        let action_name = action.name();
        async {
            for _ in 0..MAX_CAS_RETRIES {
                if self.try_apply(auction_id, &action).await? {
                    return self.persistence.load_snapshot(auction_id).await;
                }
            }
            Err(EngineError::precondition("queue state kept changing underneath this settlement action; retry"))
        }
        .instrument(tracing::info_span!("settlement", %auction_id, action = action_name))
        .await
    }

    /// One attempt. Returns `false` when the optimistic-concurrency write
    /// lost the race so [`Self::apply`] can reload and retry (§5 "single
    /// writer per auction" is the common case; this is the defensive path).
    async fn try_apply(&self, auction_id: AuctionId, action: &SettlementAction) -> Result<bool, EngineError> {
        let snapshot = self.persistence.load_snapshot(auction_id).await?;
        if !matches!(snapshot.auction.status, AuctionStatus::Live) {
            return Err(EngineError::precondition("auction is not LIVE"));
        }
        let mut queue = snapshot.queue_state.clone();

        match action {
            SettlementAction::Sold { team_id, amount } => {
                let player_id = queue.current().ok_or_else(|| EngineError::precondition("no current player on the block"))?;
                queue.advance();
                queue.push_history(HistoryEntry {
                    player_id,
                    team_id: Some(*team_id),
                    price: *amount,
                    action: HistoryAction::Sold,
                });
                queue.auto_return_if_exhausted();
                let next_round = self.next_round(&queue, &snapshot);
                self.persistence
                    .settle_sold(
                        auction_id,
                        snapshot.open_round.as_ref().ok_or_else(|| EngineError::precondition("no open round"))?,
                        *team_id,
                        *amount,
                        snapshot.queue_version,
                        &queue,
                        next_round.as_ref(),
                    )
                    .await
            }
            SettlementAction::Unsold => {
                let player_id = queue.current().ok_or_else(|| EngineError::precondition("no current player on the block"))?;
                queue.mark_unsold(player_id)?;
                queue.push_history(HistoryEntry { player_id, team_id: None, price: Money::ZERO, action: HistoryAction::Unsold });
                queue.auto_return_if_exhausted();
                let next_round = self.next_round(&queue, &snapshot);
                self.persistence
                    .settle_unsold(auction_id, player_id, snapshot.queue_version, &queue, next_round.as_ref())
                    .await
            }
            SettlementAction::Defer => {
                let player_id = queue.current().ok_or_else(|| EngineError::precondition("no current player on the block"))?;
                queue.defer(player_id)?;
                queue.push_history(HistoryEntry { player_id, team_id: None, price: Money::ZERO, action: HistoryAction::Deferred });
                queue.auto_return_if_exhausted();
                let next_round = self.next_round(&queue, &snapshot);
                self.persistence
                    .settle_defer(auction_id, player_id, snapshot.queue_version, &queue, next_round.as_ref())
                    .await
            }
            SettlementAction::Undo => {
                let entry = queue.pop_history()?;
                queue.undo(&entry)?;
                let next_round = self.next_round(&queue, &snapshot);
                self.persistence
                    .apply_undo(auction_id, &entry, snapshot.queue_version, &queue, next_round.as_ref())
                    .await
            }
        }
    }

    /// §4.5 step 6: "if index < len(queue), open a new Round for
    /// queue[index]... otherwise mark auction COMPLETED". Returns `None` in
    /// the COMPLETED case.
    fn next_round(&self, queue: &QueueState, snapshot: &AuctionSnapshot) -> Option<Round> {
        let player_id = queue.current()?;
        round_for_player(snapshot, player_id)
    }

    /// §6 `POST /auctions/{id}/round`: an auctioneer override that opens a
    /// round for an arbitrary player, bypassing queue advancement. Still
    /// goes through [`Persistence::open_round`], so the single-OPEN-round
    /// invariant (P4) holds exactly as it does for the normal settlement
    /// path.
    pub async fn force_open_round(&self, auction_id: AuctionId, player_id: PlayerId) -> Result<AuctionSnapshot, EngineError> {
        let snapshot = self.persistence.load_snapshot(auction_id).await?;
        if !matches!(snapshot.auction.status, AuctionStatus::Live) {
            return Err(EngineError::precondition("auction is not LIVE"));
        }
        let round = round_for_player(&snapshot, player_id)
            .ok_or_else(|| EngineError::not_found("player", player_id))?;
        self.persistence.open_round(&round).await?;
        self.persistence.load_snapshot(auction_id).await
    }

    /// §6 `DELETE /auctions/{id}/round`: closes the open round without
    /// advancing the queue or recording a settlement action.
    pub async fn force_close_round(&self, auction_id: AuctionId) -> Result<AuctionSnapshot, EngineError> {
        let snapshot = self.persistence.load_snapshot(auction_id).await?;
        if !matches!(snapshot.auction.status, AuctionStatus::Live) {
            return Err(EngineError::precondition("auction is not LIVE"));
        }
        self.persistence.close_open_round(auction_id).await?;
        self.persistence.load_snapshot(auction_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            auction::{Auction, AuctionStatus, BiddingMode},
            player::{Player, PlayerStatus},
            tier::Tier,
        },
        persistence::MockPersistence,
    };
    use auction_storage::{PlayerId, TierId};

    fn live_snapshot_with_one_player(auction_id: AuctionId, player_id: PlayerId) -> AuctionSnapshot {
        let tier_id = TierId::new();
        let tier = Tier { id: tier_id, base_price: Money(10), min_per_team: 0, max_per_team: None };
        let auction = Auction {
            id: auction_id,
            bidding_mode: BiddingMode::Sealed,
            budget_per_team: Money(100),
            squad_size: 1,
            currency: "USD".into(),
            outcry_increment_rules: vec![],
            timer_seconds: None,
            tiers: vec![tier.clone()],
            status: AuctionStatus::Live,
        };
        let player = Player { id: player_id, name: "P1".into(), tier_id, status: PlayerStatus::Available };
        let round = Round {
            id: RoundId::new(),
            auction_id,
            player_id,
            tier_id,
            status: RoundStatus::Open,
            opened_at: Utc::now(),
            closed_at: None,
            base_price: Money(10),
            current_bid_amount: None,
            current_bid_team_id: None,
            bid_count: 0,
            timer_expires_at: None,
        };
        AuctionSnapshot {
            auction,
            teams: vec![],
            players: vec![player],
            squads: Default::default(),
            open_round: Some(round),
            current_round_bids: vec![],
            queue_state: QueueState::new(vec![player_id]),
            queue_version: 0,
        }
    }

    /// Every attempt reloads a snapshot where the write keeps losing the CAS
    /// race (`settle_sold` always reports `false`); after
    /// [`MAX_CAS_RETRIES`] attempts `apply` must give up with a precondition
    /// error rather than retry forever.
    #[tokio::test]
    async fn apply_gives_up_after_max_cas_retries() {
        let auction_id = AuctionId::new();
        let player_id = PlayerId::new();

        let mut persistence = MockPersistence::new();
        persistence
            .expect_load_snapshot()
            .withf(move |id: &AuctionId| *id == auction_id)
            .returning(move |_| Ok(live_snapshot_with_one_player(auction_id, player_id)));
        persistence.expect_settle_sold().returning(|_, _, _, _, _, _, _| Ok(false));

        let engine = SettlementEngine::new(Arc::new(persistence));
        let err = engine
            .apply(auction_id, SettlementAction::Sold { team_id: TeamId::new(), amount: Money(10) })
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Precondition { .. }));
    }
}

pub(crate) fn round_for_player(snapshot: &AuctionSnapshot, player_id: PlayerId) -> Option<Round> {
    let player = snapshot.players.iter().find(|p| p.id == player_id)?;
    let tier = snapshot.auction.tier(player.tier_id)?;
    let timer_expires_at = snapshot.auction.timer_seconds.map(|seconds| Utc::now() + chrono::Duration::seconds(seconds as i64));
    Some(Round {
        id: RoundId::new(),
        auction_id: snapshot.auction.id,
        player_id,
        tier_id: tier.id,
        status: RoundStatus::Open,
        opened_at: Utc::now(),
        closed_at: None,
        base_price: tier.base_price,
        current_bid_amount: None,
        current_bid_team_id: None,
        bid_count: 0,
        timer_expires_at,
    })
}
