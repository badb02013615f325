//! §4.1 "Auction Lifecycle" (C1). Thin orchestration over
//! [`Persistence`] and the pure `domain::auction` functions — no SQL here.

use {
    crate::{
        domain::{
            auction::{self, Auction, AuctionStatus},
            error::EngineError,
            player::Player,
            queue::QueueState,
            team::Team,
            tier::Tier,
        },
        persistence::Persistence,
    },
    auction_storage::AuctionId,
    std::sync::Arc,
};

pub struct LifecycleService {
    persistence: Arc<dyn Persistence>,
    default_timer_seconds: Option<u32>,
}

impl LifecycleService {
    pub fn new(persistence: Arc<dyn Persistence>) -> Self {
        Self { persistence, default_timer_seconds: None }
    }

    /// Applies the deployment's configured outcry anti-snipe window (§9
    /// "default timer seconds") to auctions created without one of their
    /// own, mirroring `Arguments`'s other `#[clap(long, env)]` tuning knobs.
    pub fn with_default_timer_seconds(mut self, seconds: Option<u32>) -> Self {
        self.default_timer_seconds = seconds;
        self
    }

    /// §4.1 `create(...)`. Starts life in DRAFT with an empty queue.
    pub async fn create(&self, mut auction: Auction) -> Result<Auction, EngineError> {
        auction.status = AuctionStatus::Draft;
        if matches!(auction.bidding_mode, crate::domain::auction::BiddingMode::Outcry) && auction.timer_seconds.is_none() {
            auction.timer_seconds = self.default_timer_seconds;
        }
        self.persistence.create_auction(&auction).await?;
        tracing::info!(auction_id = %auction.id, status = ?auction.status, "auction created");
        Ok(auction)
    }

    pub async fn add_teams(&self, teams: &[Team]) -> Result<(), EngineError> {
        if teams.is_empty() {
            return Err(EngineError::validation("at least one team is required"));
        }
        self.persistence.add_teams(teams).await
    }

    pub async fn add_players(&self, auction_id: AuctionId, players: &[Player]) -> Result<(), EngineError> {
        if players.is_empty() {
            return Err(EngineError::validation("at least one player is required"));
        }
        self.persistence.add_players(auction_id, players).await
    }

    pub async fn configure_tiers(&self, auction: &Auction, _tiers: &[Tier]) -> Result<(), EngineError> {
        // Tiers are written as part of `create_auction`; re-configuring after
        // creation is out of scope (§1 auction config is immutable once LIVE).
        if !matches!(auction.status, AuctionStatus::Draft) {
            return Err(EngineError::precondition("tiers can only be configured while DRAFT"));
        }
        Ok(())
    }

    /// §4.1 `start(auctionId)`. Builds the initial queue order, performs the
    /// one write that makes the auction LIVE, and opens the first Round so
    /// the very first settlement action has something to act on (§4.3 a
    /// LIVE auction always has exactly one OPEN round until the queue is
    /// exhausted).
    pub async fn start(&self, auction_id: AuctionId) -> Result<Auction, EngineError> {
        let snapshot = self.persistence.load_snapshot(auction_id).await?;
        auction::check_start_preconditions(&snapshot.auction, snapshot.teams.len(), snapshot.players.len())?;

        let order = auction::initial_queue_order(&snapshot.players, &snapshot.auction);
        let queue = QueueState::new(order);
        self.persistence.initialize_queue(auction_id, &queue).await?;
        self.persistence.set_auction_status(auction_id, AuctionStatus::Live).await?;

        if let Some(player_id) = queue.current() {
            let round = crate::settlement::round_for_player(&snapshot, player_id)
                .ok_or_else(|| EngineError::not_found("player", player_id))?;
            self.persistence.open_round(&round).await?;
        }

        let from = snapshot.auction.status;
        let mut auction = snapshot.auction;
        auction.status = AuctionStatus::Live;
        tracing::info!(auction_id = %auction.id, ?from, to = ?auction.status, "auction status transition");
        Ok(auction)
    }

    /// §4.1 `end(auctionId)`. Any remaining queued/deferred players become
    /// implicitly unreachable; closes whatever round is open (unsettled)
    /// and flips the status.
    pub async fn end(&self, auction_id: AuctionId) -> Result<(), EngineError> {
        let auction = self.persistence.load_auction(auction_id).await?;
        if !matches!(auction.status, AuctionStatus::Live | AuctionStatus::Lobby) {
            return Err(EngineError::precondition("can only end a LIVE or LOBBY auction"));
        }
        self.persistence.close_open_round(auction_id).await?;
        self.persistence.set_auction_status(auction_id, AuctionStatus::Completed).await?;
        tracing::info!(auction_id = %auction_id, from = ?auction.status, to = ?AuctionStatus::Completed, "auction status transition");
        Ok(())
    }
}
