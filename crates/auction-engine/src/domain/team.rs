use {
    crate::domain::{auction::Auction, money::Money},
    auction_storage::{PlayerId, TeamId, TierId},
    serde::Serialize,
    std::collections::HashMap,
};

/// §3 "Team". The effective remaining budget and squad are derived rather
/// than stored mutably on the team (§3 "TeamBudget (derived)", "Squad
/// (derived)") — they are recomputed from [`AuctionResult`]s every time
/// they're needed rather than tracked as mutable counters that could drift.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub auction_id: auction_storage::AuctionId,
    pub name: String,
}

/// One winning assignment, as recorded in `auction_results` (§3
/// "AuctionResult").
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SquadSlot {
    pub player_id: PlayerId,
    pub tier_id: TierId,
    pub winning_bid_amount: Money,
}

/// A team's assignments, re-derived from storage on every read. Keeping this
/// as a plain `Vec` (rather than a running counter on `Team`) is what makes
/// P1/P2/P3 checkable by re-deriving from the source of truth instead of
/// trusting a cache that could have drifted.
#[derive(Clone, Debug, Default)]
pub struct Squad(pub Vec<SquadSlot>);

impl Squad {
    pub fn spent(&self) -> Money {
        self.0.iter().map(|slot| slot.winning_bid_amount).sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn count_in_tier(&self, tier_id: TierId) -> usize {
        self.0.iter().filter(|slot| slot.tier_id == tier_id).count()
    }
}

/// `remaining = budgetPerTeam − Σ(winningBidAmount)` (§3 "TeamBudget
/// (derived)"). Invariant: always `≥ 0`; a negative result here would
/// indicate a bug upstream in the budget solver or settlement engine, not a
/// case this function should paper over.
pub fn remaining_budget(auction: &Auction, squad: &Squad) -> Money {
    auction.budget_per_team.saturating_sub(squad.spent())
}

/// Builds a per-team squad index from the full set of [`SquadSlot`]s across
/// an auction, keyed by team id. Used by the budget solver and settlement
/// engine so they never have to re-query storage per team.
pub fn index_by_team(
    all_results: &[(TeamId, SquadSlot)],
) -> HashMap<TeamId, Squad> {
    let mut index: HashMap<TeamId, Squad> = HashMap::new();
    for (team_id, slot) in all_results {
        index.entry(*team_id).or_default().0.push(*slot);
    }
    index
}

