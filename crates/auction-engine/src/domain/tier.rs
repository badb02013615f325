use {crate::domain::money::Money, auction_storage::TierId, serde::Serialize};

/// §3 "Tier". Invariant: every [`crate::domain::player::Player`] belongs to
/// exactly one tier within an auction — enforced by `tier_id` being
/// non-optional on `Player` and validated at `C1::configure_tiers`/`add_players`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub id: TierId,
    pub base_price: Money,
    pub min_per_team: u32,
    pub max_per_team: Option<u32>,
}
