//! §4.9 "Persistence Boundary" (C9). The engine orchestration modules
//! (`lifecycle`, `pipeline`, `settlement`) talk only to this trait; `pg.rs`
//! is the one place that knows about `auction_storage`/sqlx. Mirrors how
//! `autopilot`'s domain modules depend on a narrow trait rather than a
//! concrete Postgres pool, so tests can swap in a `mockall` double.

mod dto;
mod pg;

pub use pg::PgPersistence;

use {
    crate::{
        domain::{
            auction::Auction,
            authz::AdminSources,
            error::EngineError,
            money::Money,
            player::Player,
            queue::QueueState,
            round::Round,
            team::Team,
        },
        snapshot::AuctionSnapshot,
    },
    async_trait::async_trait,
    auction_storage::{AuctionId, PlayerId, RoundId, TeamId},
    chrono::{DateTime, Utc},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn create_auction(&self, auction: &Auction) -> Result<(), EngineError>;
    async fn add_teams(&self, teams: &[Team]) -> Result<(), EngineError>;
    async fn add_players(&self, auction_id: AuctionId, players: &[Player]) -> Result<(), EngineError>;
    async fn set_auction_status(&self, auction_id: AuctionId, status: crate::domain::auction::AuctionStatus) -> Result<(), EngineError>;

    /// First write of the queue after `start()`; always against
    /// `expected_version = 0` since nothing else can have raced it yet.
    async fn initialize_queue(&self, auction_id: AuctionId, queue: &QueueState) -> Result<(), EngineError>;

    async fn load_snapshot(&self, auction_id: AuctionId) -> Result<AuctionSnapshot, EngineError>;
    async fn load_auction(&self, auction_id: AuctionId) -> Result<Auction, EngineError>;

    /// Resolves the three admin sources §4.7 unions over, for one
    /// `(auction, team, user)` triple.
    async fn load_admin_sources(
        &self,
        auction_id: AuctionId,
        team_id: TeamId,
        user_id: &str,
    ) -> Result<AdminSources, EngineError>;

    /// Every auction-level role `user_id` holds, independent of team — used
    /// to gate the auctioneer endpoints (§6 "owner/moderator").
    async fn load_auction_roles(
        &self,
        auction_id: AuctionId,
        user_id: &str,
    ) -> Result<Vec<crate::domain::authz::AuctionRole>, EngineError>;

    /// Closes any currently open round and opens `new_round`, atomically
    /// (§4.3, §4.5 steps 5-6).
    async fn open_round(&self, new_round: &Round) -> Result<(), EngineError>;

    /// §6 `DELETE /auctions/{id}/round`: closes whatever round is open,
    /// opening nothing in its place.
    async fn close_open_round(&self, auction_id: AuctionId) -> Result<(), EngineError>;

    async fn insert_sealed_bid(&self, round_id: RoundId, team_id: TeamId, amount: Money) -> Result<(), EngineError>;

    /// §4.9 `atomicOutcryRaise`. `true` = accepted, `false` = lost the race.
    async fn atomic_outcry_raise(
        &self,
        round_id: RoundId,
        team_id: TeamId,
        expected_bid_count: u32,
        new_amount: Money,
        timer_expires_at: DateTime<Utc>,
    ) -> Result<bool, EngineError>;

    async fn record_outcry_bid(
        &self,
        round_id: RoundId,
        team_id: TeamId,
        amount: Money,
        sequence_number: i64,
    ) -> Result<(), EngineError>;

    /// SOLD (§4.5 steps 1-4, 7): marks the winning bid, upserts the
    /// `AuctionResult`, flips the player to SOLD, appends history, writes the
    /// advanced queue (CAS'd on `expected_queue_version`), closes the round,
    /// and opens `next_round` (`None` means the queue is exhausted and the
    /// auction is COMPLETED) — all in one transaction. `false` means the
    /// queue moved under us and the caller should reload and retry.
    async fn settle_sold(
        &self,
        auction_id: AuctionId,
        round: &Round,
        winner: TeamId,
        amount: Money,
        expected_queue_version: i64,
        new_queue: &QueueState,
        next_round: Option<&Round>,
    ) -> Result<bool, EngineError>;

    async fn settle_unsold(
        &self,
        auction_id: AuctionId,
        player_id: PlayerId,
        expected_queue_version: i64,
        new_queue: &QueueState,
        next_round: Option<&Round>,
    ) -> Result<bool, EngineError>;

    async fn settle_defer(
        &self,
        auction_id: AuctionId,
        player_id: PlayerId,
        expected_queue_version: i64,
        new_queue: &QueueState,
        next_round: Option<&Round>,
    ) -> Result<bool, EngineError>;

    /// Reverts whatever side effect `entry`'s action had (player status /
    /// auction result), CAS-writes `new_queue` (already popped and inverted
    /// by the caller via [`QueueState::pop_history`] and
    /// [`QueueState::undo`]), and re-opens `next_round` — all in one
    /// transaction. `false` means the queue moved under us; the caller
    /// reloads and retries.
    async fn apply_undo(
        &self,
        auction_id: AuctionId,
        entry: &crate::domain::queue::HistoryEntry,
        expected_queue_version: i64,
        new_queue: &QueueState,
        next_round: Option<&Round>,
    ) -> Result<bool, EngineError>;
}
