use {
    super::dto,
    crate::{
        domain::{
            auction::{Auction, AuctionStatus},
            authz::AdminSources,
            error::EngineError,
            money::Money,
            player::{Player, PlayerStatus},
            queue::{HistoryEntry, QueueState},
            round::Round,
            team::{Squad, Team},
        },
        persistence::Persistence,
        snapshot::AuctionSnapshot,
    },
    async_trait::async_trait,
    auction_storage::{
        self, access, auction, auction_result, bid, history, player, round, team, tier, AuctionId, PlayerId, RoundId,
        TeamId,
    },
    chrono::{DateTime, Utc},
    sqlx::PgPool,
    std::collections::HashMap,
};

/// Postgres-backed [`Persistence`]. Owns every place this crate touches
/// `auction_storage`/sqlx directly so the orchestration modules
/// (`lifecycle`, `pipeline`, `settlement`) stay storage-agnostic.
pub struct PgPersistence {
    pool: PgPool,
}

impl PgPersistence {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Persistence for PgPersistence {
    async fn create_auction(&self, auction: &Auction) -> Result<(), EngineError> {
        let row = auction::AuctionRow {
            id: auction.id,
            bidding_mode: auction.bidding_mode.to_string(),
            budget_per_team: dto::money_to_decimal(auction.budget_per_team),
            squad_size: auction.squad_size.try_into().unwrap_or(i32::MAX),
            currency: auction.currency.clone(),
            outcry_increment_rules: dto::increment_rules_to_json(&auction.outcry_increment_rules)?,
            timer_seconds: auction.timer_seconds.and_then(|v| v.try_into().ok()),
            status: auction.status.to_string(),
            queue_state: serde_json::Value::Null,
            queue_version: 0,
            created_at: Utc::now(),
        };
        let mut tx = self.pool.begin().await?;
        auction::insert(&mut tx, &row).await?;
        for t in &auction.tiers {
            let tier_row = tier::TierRow {
                id: t.id,
                auction_id: auction.id,
                base_price: dto::money_to_decimal(t.base_price),
                min_per_team: t.min_per_team.try_into().unwrap_or(0),
                max_per_team: t.max_per_team.and_then(|v| v.try_into().ok()),
            };
            tier::insert(&mut tx, &tier_row).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn add_teams(&self, teams: &[Team]) -> Result<(), EngineError> {
        let mut tx = self.pool.begin().await?;
        for t in teams {
            let row = team::TeamRow { id: t.id, auction_id: t.auction_id, name: t.name.clone() };
            team::insert(&mut tx, &row).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn add_players(&self, auction_id: AuctionId, players: &[Player]) -> Result<(), EngineError> {
        let mut tx = self.pool.begin().await?;
        for p in players {
            let row = player::PlayerRow {
                id: p.id,
                auction_id,
                name: p.name.clone(),
                tier_id: p.tier_id,
                status: p.status.to_string(),
            };
            player::insert(&mut tx, &row).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn set_auction_status(&self, auction_id: AuctionId, status: AuctionStatus) -> Result<(), EngineError> {
        let mut tx = self.pool.begin().await?;
        auction::set_status(&mut tx, auction_id, &status.to_string()).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn initialize_queue(&self, auction_id: AuctionId, queue: &QueueState) -> Result<(), EngineError> {
        let state = dto::queue_state_to_json(queue)?;
        let mut tx = self.pool.begin().await?;
        let accepted = auction::update_queue_state(&mut tx, auction_id, &state, 0).await?;
        tx.commit().await?;
        if !accepted {
            return Err(EngineError::precondition("queue was already initialized"));
        }
        Ok(())
    }

    async fn load_snapshot(&self, auction_id: AuctionId) -> Result<AuctionSnapshot, EngineError> {
        let mut conn = self.pool.acquire().await?;

        let auction_row = auction::load(&mut *conn, auction_id)
            .await?
            .ok_or_else(|| EngineError::not_found("auction", auction_id))?;
        let tier_rows = tier::fetch_for_auction(&mut *conn, auction_id).await?;
        let tiers = tier_rows.into_iter().map(dto::tier_from_row).collect::<Result<Vec<_>, _>>()?;
        let auction_domain = dto::auction_from_row(auction_row, tiers)?;

        let team_rows = team::fetch_for_auction(&mut *conn, auction_id).await?;
        let teams: Vec<Team> = team_rows.into_iter().map(dto::team_from_row).collect();

        let player_rows = player::fetch_for_auction(&mut *conn, auction_id).await?;
        let players = player_rows.into_iter().map(dto::player_from_row).collect::<Result<Vec<_>, _>>()?;
        let tier_of = |player_id: PlayerId| players.iter().find(|p| p.id == player_id).map(|p| p.tier_id);

        let result_rows = auction_result::fetch_for_auction(&mut *conn, auction_id).await?;
        let mut squads: HashMap<TeamId, Squad> = HashMap::new();
        for result_row in &result_rows {
            let slot = dto::squad_slot_from_result(result_row, tier_of)?;
            squads.entry(result_row.team_id).or_default().0.push(slot);
        }

        let open_round_row = round::open_round_for_auction(&mut *conn, auction_id).await?;
        let open_round = open_round_row.map(dto::round_from_row).transpose()?;

        let current_round_bids = match &open_round {
            Some(r) => {
                let bid_rows = bid::fetch_for_round(&mut *conn, r.id).await?;
                bid_rows.into_iter().map(dto::bid_from_row).collect::<Result<Vec<_>, _>>()?
            }
            None => Vec::new(),
        };

        let (queue_json, queue_version) = auction::load_queue_state(&mut *conn, auction_id)
            .await?
            .ok_or_else(|| EngineError::not_found("auction", auction_id))?;
        let queue_state = dto::queue_state_from_json(&queue_json)?;

        Ok(AuctionSnapshot {
            auction: auction_domain,
            teams,
            players,
            squads,
            open_round,
            current_round_bids,
            queue_state,
            queue_version,
        })
    }

    async fn load_auction(&self, auction_id: AuctionId) -> Result<Auction, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let row = auction::load(&mut *conn, auction_id)
            .await?
            .ok_or_else(|| EngineError::not_found("auction", auction_id))?;
        let tier_rows = tier::fetch_for_auction(&mut *conn, auction_id).await?;
        let tiers = tier_rows.into_iter().map(dto::tier_from_row).collect::<Result<Vec<_>, _>>()?;
        dto::auction_from_row(row, tiers)
    }

    async fn load_admin_sources(
        &self,
        auction_id: AuctionId,
        team_id: TeamId,
        user_id: &str,
    ) -> Result<AdminSources, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let captain = access::fetch_captain(&mut *conn, team_id).await?;
        let team_roles = access::fetch_team_roles(&mut *conn, team_id, user_id).await?;
        let auction_roles = access::fetch_auction_roles(&mut *conn, auction_id, user_id).await?;
        Ok(dto::admin_sources_from_rows(captain, team_roles, auction_roles))
    }

    async fn load_auction_roles(
        &self,
        auction_id: AuctionId,
        user_id: &str,
    ) -> Result<Vec<crate::domain::authz::AuctionRole>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let rows = access::fetch_auction_roles(&mut *conn, auction_id, user_id).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| <crate::domain::authz::AuctionRole as std::str::FromStr>::from_str(&row.role).ok())
            .collect())
    }

    async fn open_round(&self, new_round: &Round) -> Result<(), EngineError> {
        let row = round::RoundRow {
            id: new_round.id,
            auction_id: new_round.auction_id,
            player_id: new_round.player_id,
            tier_id: new_round.tier_id,
            status: new_round.status.to_string(),
            opened_at: new_round.opened_at,
            closed_at: new_round.closed_at,
            base_price: dto::money_to_decimal(new_round.base_price),
            current_bid_amount: new_round.current_bid_amount.map(dto::money_to_decimal),
            current_bid_team_id: new_round.current_bid_team_id,
            bid_count: new_round.bid_count.try_into().unwrap_or(0),
            timer_expires_at: new_round.timer_expires_at,
        };
        let mut tx = self.pool.begin().await?;
        round::close_open_rounds(&mut tx, new_round.auction_id, Utc::now()).await?;
        round::create(&mut tx, &row).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn close_open_round(&self, auction_id: AuctionId) -> Result<(), EngineError> {
        let mut tx = self.pool.begin().await?;
        round::close_open_rounds(&mut tx, auction_id, Utc::now()).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_sealed_bid(&self, round_id: RoundId, team_id: TeamId, amount: Money) -> Result<(), EngineError> {
        let row = bid::BidRow {
            id: auction_storage::BidId::new(),
            round_id,
            team_id,
            amount: dto::money_to_decimal(amount),
            submitted_at: Utc::now(),
            sequence_number: None,
            is_winning_bid: false,
        };
        let mut tx = self.pool.begin().await?;
        bid::insert(&mut tx, &row).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn atomic_outcry_raise(
        &self,
        round_id: RoundId,
        team_id: TeamId,
        expected_bid_count: u32,
        new_amount: Money,
        timer_expires_at: DateTime<Utc>,
    ) -> Result<bool, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let accepted = round::atomic_outcry_raise(
            &mut *conn,
            round_id,
            team_id,
            expected_bid_count.try_into().unwrap_or(i32::MAX),
            &dto::money_to_decimal(new_amount),
            timer_expires_at,
        )
        .await?;
        Ok(accepted)
    }

    async fn record_outcry_bid(
        &self,
        round_id: RoundId,
        team_id: TeamId,
        amount: Money,
        sequence_number: i64,
    ) -> Result<(), EngineError> {
        let row = bid::BidRow {
            id: auction_storage::BidId::new(),
            round_id,
            team_id,
            amount: dto::money_to_decimal(amount),
            submitted_at: Utc::now(),
            sequence_number: Some(sequence_number),
            is_winning_bid: false,
        };
        let mut tx = self.pool.begin().await?;
        bid::insert(&mut tx, &row).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn settle_sold(
        &self,
        auction_id: AuctionId,
        round: &Round,
        winner: TeamId,
        amount: Money,
        expected_queue_version: i64,
        new_queue: &QueueState,
        next_round: Option<&Round>,
    ) -> Result<bool, EngineError> {
        let mut tx = self.pool.begin().await?;
        bid::mark_winning(&mut tx, round.id, winner).await?;
        let result_row = auction_result::AuctionResultRow {
            auction_id,
            player_id: round.player_id,
            team_id: winner,
            winning_bid_amount: dto::money_to_decimal(amount),
            assigned_at: Utc::now(),
        };
        auction_result::upsert(&mut tx, &result_row).await?;
        player::set_status(&mut tx, round.player_id, &PlayerStatus::Sold.to_string()).await?;
        history::append(
            &mut tx,
            history::NewHistoryRow {
                auction_id,
                player_id: round.player_id,
                team_id: Some(winner),
                price: dto::money_to_decimal(amount),
                action: "SOLD".to_string(),
            },
            Utc::now(),
        )
        .await?;
        let accepted = auction::update_queue_state(
            &mut tx,
            auction_id,
            &dto::queue_state_to_json(new_queue)?,
            expected_queue_version,
        )
        .await?;
        if accepted {
            advance_round(&mut tx, auction_id, next_round).await?;
        }
        tx.commit().await?;
        Ok(accepted)
    }

    async fn settle_unsold(
        &self,
        auction_id: AuctionId,
        player_id: PlayerId,
        expected_queue_version: i64,
        new_queue: &QueueState,
        next_round: Option<&Round>,
    ) -> Result<bool, EngineError> {
        let mut tx = self.pool.begin().await?;
        player::set_status(&mut tx, player_id, &PlayerStatus::Unsold.to_string()).await?;
        history::append(
            &mut tx,
            history::NewHistoryRow {
                auction_id,
                player_id,
                team_id: None,
                price: dto::money_to_decimal(Money::ZERO),
                action: "UNSOLD".to_string(),
            },
            Utc::now(),
        )
        .await?;
        let accepted = auction::update_queue_state(
            &mut tx,
            auction_id,
            &dto::queue_state_to_json(new_queue)?,
            expected_queue_version,
        )
        .await?;
        if accepted {
            advance_round(&mut tx, auction_id, next_round).await?;
        }
        tx.commit().await?;
        Ok(accepted)
    }

    async fn settle_defer(
        &self,
        auction_id: AuctionId,
        player_id: PlayerId,
        expected_queue_version: i64,
        new_queue: &QueueState,
        next_round: Option<&Round>,
    ) -> Result<bool, EngineError> {
        let mut tx = self.pool.begin().await?;
        history::append(
            &mut tx,
            history::NewHistoryRow {
                auction_id,
                player_id,
                team_id: None,
                price: dto::money_to_decimal(Money::ZERO),
                action: "DEFERRED".to_string(),
            },
            Utc::now(),
        )
        .await?;
        let accepted = auction::update_queue_state(
            &mut tx,
            auction_id,
            &dto::queue_state_to_json(new_queue)?,
            expected_queue_version,
        )
        .await?;
        if accepted {
            advance_round(&mut tx, auction_id, next_round).await?;
        }
        tx.commit().await?;
        Ok(accepted)
    }

    async fn apply_undo(
        &self,
        auction_id: AuctionId,
        entry: &HistoryEntry,
        expected_queue_version: i64,
        new_queue: &QueueState,
        next_round: Option<&Round>,
    ) -> Result<bool, EngineError> {
        let mut tx = self.pool.begin().await?;
        match entry.action {
            crate::domain::queue::Action::Sold => {
                auction_result::delete(&mut tx, auction_id, entry.player_id).await?;
                player::set_status(&mut tx, entry.player_id, &PlayerStatus::Available.to_string()).await?;
            }
            crate::domain::queue::Action::Unsold => {
                player::set_status(&mut tx, entry.player_id, &PlayerStatus::Available.to_string()).await?;
            }
            crate::domain::queue::Action::Deferred => {}
        }
        let accepted = auction::update_queue_state(
            &mut tx,
            auction_id,
            &dto::queue_state_to_json(new_queue)?,
            expected_queue_version,
        )
        .await?;
        if accepted {
            advance_round(&mut tx, auction_id, next_round).await?;
        }
        tx.commit().await?;
        Ok(accepted)
    }
}

/// §4.5 steps 5-6: close whatever round is open for this auction, then open
/// `next_round` if the queue isn't exhausted. Shared by every settlement path
/// so the close+open always lands in the same transaction as the queue CAS.
async fn advance_round(
    tx: &mut auction_storage::PgTransaction<'_>,
    auction_id: AuctionId,
    next_round: Option<&Round>,
) -> Result<(), EngineError> {
    round::close_open_rounds(tx, auction_id, Utc::now()).await?;
    if let Some(next_round) = next_round {
        let row = round::RoundRow {
            id: next_round.id,
            auction_id: next_round.auction_id,
            player_id: next_round.player_id,
            tier_id: next_round.tier_id,
            status: next_round.status.to_string(),
            opened_at: next_round.opened_at,
            closed_at: next_round.closed_at,
            base_price: dto::money_to_decimal(next_round.base_price),
            current_bid_amount: next_round.current_bid_amount.map(dto::money_to_decimal),
            current_bid_team_id: next_round.current_bid_team_id,
            bid_count: next_round.bid_count.try_into().unwrap_or(0),
            timer_expires_at: next_round.timer_expires_at,
        };
        round::create(tx, &row).await?;
    } else {
        auction::set_status(tx, auction_id, &crate::domain::auction::AuctionStatus::Completed.to_string()).await?;
    }
    Ok(())
}
