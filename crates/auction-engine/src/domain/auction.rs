use {
    crate::domain::{error::EngineError, money::Money, player::Player, tier::Tier},
    auction_storage::AuctionId,
    serde::{Deserialize, Serialize},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BiddingMode {
    Sealed,
    Outcry,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Draft,
    Lobby,
    Live,
    Completed,
}

/// One row of `outcryIncrementRules` (§3): the increment applied when
/// `currentBid / basePrice` falls in `[from_multiplier, to_multiplier)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncrementRule {
    pub from_multiplier: f64,
    pub to_multiplier: f64,
    pub increment: Money,
}

/// §3 "Auction" — immutable-after-LIVE configuration plus lifecycle status.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub id: AuctionId,
    pub bidding_mode: BiddingMode,
    pub budget_per_team: Money,
    pub squad_size: u32,
    pub currency: String,
    pub outcry_increment_rules: Vec<IncrementRule>,
    pub timer_seconds: Option<u32>,
    pub tiers: Vec<Tier>,
    pub status: AuctionStatus,
}

impl Auction {
    pub fn tier(&self, tier_id: auction_storage::TierId) -> Option<&Tier> {
        self.tiers.iter().find(|tier| tier.id == tier_id)
    }

    pub fn min_tier_base_price(&self) -> Money {
        self.tiers
            .iter()
            .map(|tier| tier.base_price)
            .min()
            .unwrap_or(Money::ZERO)
    }
}

/// §4.1 `start(auctionId)` preconditions: current status must be DRAFT or
/// LOBBY, at least 2 teams, at least 1 player, every player's tier defined.
/// The tier-defined check is structural (every `Player::tier_id` already
/// points at a `Tier` in `auction.tiers` by construction of `add_players`),
/// so only the counts are checked here.
pub fn check_start_preconditions(
    auction: &Auction,
    team_count: usize,
    player_count: usize,
) -> Result<(), EngineError> {
    if !matches!(auction.status, AuctionStatus::Draft | AuctionStatus::Lobby) {
        return Err(EngineError::precondition(format!(
            "cannot start auction in status {:?}",
            auction.status
        )));
    }
    if team_count < 2 {
        return Err(EngineError::precondition("auction needs at least 2 teams to start"));
    }
    if player_count < 1 {
        return Err(EngineError::precondition("auction needs at least 1 player to start"));
    }
    Ok(())
}

/// §4.1 queue initialization ordering contract: players are ordered by their
/// tier's `basePrice` descending (priciest tier goes on the block first),
/// ties broken by insertion order within a tier. This is the public ordering
/// contract referenced by §4.1 — see `DESIGN.md` for why this reading of the
/// ambiguous spec wording was chosen.
pub fn initial_queue_order(players: &[Player], auction: &Auction) -> Vec<auction_storage::PlayerId> {
    let mut indexed: Vec<(usize, &Player)> = players.iter().enumerate().collect();
    indexed.sort_by(|(a_idx, a), (b_idx, b)| {
        let a_price = auction.tier(a.tier_id).map(|tier| tier.base_price).unwrap_or(Money::ZERO);
        let b_price = auction.tier(b.tier_id).map(|tier| tier.base_price).unwrap_or(Money::ZERO);
        b_price.cmp(&a_price).then_with(|| a_idx.cmp(b_idx))
    });
    indexed.into_iter().map(|(_, player)| player.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: u8, tier_id: auction_storage::TierId) -> Player {
        Player {
            id: auction_storage::PlayerId(uuid::Uuid::from_u128(id as u128)),
            name: format!("player-{id}"),
            tier_id,
            status: crate::domain::player::PlayerStatus::Available,
        }
    }

    #[test]
    fn start_preconditions_require_two_teams_and_a_player() {
        let auction = Auction {
            id: AuctionId::new(),
            bidding_mode: BiddingMode::Sealed,
            budget_per_team: Money(1000),
            squad_size: 11,
            currency: "USD".into(),
            outcry_increment_rules: vec![],
            timer_seconds: None,
            tiers: vec![],
            status: AuctionStatus::Draft,
        };
        assert!(check_start_preconditions(&auction, 1, 1).is_err());
        assert!(check_start_preconditions(&auction, 2, 0).is_err());
        assert!(check_start_preconditions(&auction, 2, 1).is_ok());
    }

    #[test]
    fn queue_orders_by_tier_price_descending_then_insertion_order() {
        let tier_a = Tier { id: auction_storage::TierId::new(), base_price: Money(20), min_per_team: 0, max_per_team: None };
        let tier_b = Tier { id: auction_storage::TierId::new(), base_price: Money(50), min_per_team: 0, max_per_team: None };
        let auction = Auction {
            id: AuctionId::new(),
            bidding_mode: BiddingMode::Sealed,
            budget_per_team: Money(1000),
            squad_size: 11,
            currency: "USD".into(),
            outcry_increment_rules: vec![],
            timer_seconds: None,
            tiers: vec![tier_a.clone(), tier_b.clone()],
            status: AuctionStatus::Draft,
        };
        let p1 = player(1, tier_a.id);
        let p2 = player(2, tier_b.id);
        let p3 = player(3, tier_a.id);
        let order = initial_queue_order(&[p1.clone(), p2.clone(), p3.clone()], &auction);
        assert_eq!(order, vec![p2.id, p1.id, p3.id]);
    }
}
