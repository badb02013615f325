//! Conversions between domain types (pure, integer `Money`, typed enums) and
//! their storage row shapes (`BigDecimal`, plain `String`, opaque JSON). This
//! is the one place those two representations meet.

use {
    crate::domain::{
        auction::{Auction, AuctionStatus, BiddingMode, IncrementRule},
        authz::{AdminSources, AuctionRole, TeamRole},
        bid::Bid,
        error::EngineError,
        money::Money,
        player::{Player, PlayerStatus},
        queue::QueueState,
        round::{Round, RoundStatus},
        team::{SquadSlot, Team},
        tier::Tier,
    },
    auction_storage::{
        access::{AuctionRoleRow, TeamCaptainRow, TeamRoleRow},
        auction::AuctionRow,
        bid::BidRow,
        player::PlayerRow,
        round::RoundRow,
        team::TeamRow,
        tier::TierRow,
    },
    bigdecimal::{BigDecimal, ToPrimitive},
    std::str::FromStr,
};

pub fn money_to_decimal(money: Money) -> BigDecimal {
    BigDecimal::from(money.0)
}

pub fn decimal_to_money(decimal: &BigDecimal) -> Result<Money, EngineError> {
    decimal
        .to_i64()
        .map(Money)
        .ok_or_else(|| EngineError::precondition(format!("stored amount {decimal} does not fit in Money")))
}

pub fn parse_enum<T: FromStr>(value: &str, kind: &'static str) -> Result<T, EngineError> {
    T::from_str(value).map_err(|_| EngineError::precondition(format!("unrecognized {kind} {value:?}")))
}

pub fn tier_from_row(row: TierRow) -> Result<Tier, EngineError> {
    Ok(Tier {
        id: row.id,
        base_price: decimal_to_money(&row.base_price)?,
        min_per_team: row.min_per_team.try_into().unwrap_or(0),
        max_per_team: row.max_per_team.and_then(|v| v.try_into().ok()),
    })
}

pub fn team_from_row(row: TeamRow) -> Team {
    Team { id: row.id, auction_id: row.auction_id, name: row.name }
}

pub fn player_from_row(row: PlayerRow) -> Result<Player, EngineError> {
    Ok(Player {
        id: row.id,
        name: row.name,
        tier_id: row.tier_id,
        status: parse_enum::<PlayerStatus>(&row.status, "player status")?,
    })
}

pub fn round_from_row(row: RoundRow) -> Result<Round, EngineError> {
    Ok(Round {
        id: row.id,
        auction_id: row.auction_id,
        player_id: row.player_id,
        tier_id: row.tier_id,
        status: parse_enum::<RoundStatus>(&row.status, "round status")?,
        opened_at: row.opened_at,
        closed_at: row.closed_at,
        base_price: decimal_to_money(&row.base_price)?,
        current_bid_amount: row.current_bid_amount.as_ref().map(decimal_to_money).transpose()?,
        current_bid_team_id: row.current_bid_team_id,
        bid_count: row.bid_count.try_into().unwrap_or(0),
        timer_expires_at: row.timer_expires_at,
    })
}

pub fn bid_from_row(row: BidRow) -> Result<Bid, EngineError> {
    Ok(Bid {
        id: row.id,
        round_id: row.round_id,
        team_id: row.team_id,
        amount: decimal_to_money(&row.amount)?,
        submitted_at: row.submitted_at,
        sequence_number: row.sequence_number,
        is_winning_bid: row.is_winning_bid,
    })
}

pub fn increment_rules_to_json(rules: &[IncrementRule]) -> Result<serde_json::Value, EngineError> {
    serde_json::to_value(rules).map_err(|e| EngineError::precondition(format!("failed to encode increment rules: {e}")))
}

pub fn increment_rules_from_json(value: &serde_json::Value) -> Result<Vec<IncrementRule>, EngineError> {
    serde_json::from_value(value.clone())
        .map_err(|e| EngineError::precondition(format!("failed to decode increment rules: {e}")))
}

pub fn queue_state_to_json(state: &QueueState) -> Result<serde_json::Value, EngineError> {
    serde_json::to_value(state).map_err(|e| EngineError::precondition(format!("failed to encode queue state: {e}")))
}

pub fn queue_state_from_json(value: &serde_json::Value) -> Result<QueueState, EngineError> {
    if value.is_null() {
        return Ok(QueueState::default());
    }
    serde_json::from_value(value.clone()).map_err(|e| EngineError::precondition(format!("failed to decode queue state: {e}")))
}

pub fn auction_from_row(row: AuctionRow, tiers: Vec<Tier>) -> Result<Auction, EngineError> {
    Ok(Auction {
        id: row.id,
        bidding_mode: parse_enum::<BiddingMode>(&row.bidding_mode, "bidding mode")?,
        budget_per_team: decimal_to_money(&row.budget_per_team)?,
        squad_size: row.squad_size.try_into().unwrap_or(0),
        currency: row.currency,
        outcry_increment_rules: increment_rules_from_json(&row.outcry_increment_rules)?,
        timer_seconds: row.timer_seconds.and_then(|v| v.try_into().ok()),
        tiers,
        status: parse_enum::<AuctionStatus>(&row.status, "auction status")?,
    })
}

/// Roles this crate doesn't recognize are dropped rather than rejected —
/// an unrecognized role is access this resolver simply doesn't grant, not a
/// data error worth failing the request over.
pub fn admin_sources_from_rows(
    captain: Option<TeamCaptainRow>,
    team_roles: Vec<TeamRoleRow>,
    auction_roles: Vec<AuctionRoleRow>,
) -> AdminSources {
    AdminSources {
        designated_captain: captain.map(|row| (row.user_id, row.user_email)),
        team_roles: team_roles.into_iter().filter_map(|row| TeamRole::from_str(&row.role).ok()).collect(),
        auction_roles: auction_roles.into_iter().filter_map(|row| AuctionRole::from_str(&row.role).ok()).collect(),
    }
}

/// `tier_of` resolves the player's tier: `auction_results` doesn't duplicate
/// it, so the caller supplies the already-loaded player list to join against.
pub fn squad_slot_from_result(
    result: &auction_storage::auction_result::AuctionResultRow,
    tier_of: impl Fn(auction_storage::PlayerId) -> Option<auction_storage::TierId>,
) -> Result<SquadSlot, EngineError> {
    let tier_id = tier_of(result.player_id)
        .ok_or_else(|| EngineError::not_found("player", result.player_id))?;
    Ok(SquadSlot {
        player_id: result.player_id,
        tier_id,
        winning_bid_amount: decimal_to_money(&result.winning_bid_amount)?,
    })
}
