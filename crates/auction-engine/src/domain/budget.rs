//! §4.6 "Budget & Constraint Solver" (C6). Pure functions over plain values —
//! no I/O, no auction/team handles — so every edge case is a table test.

use crate::domain::{auction::IncrementRule, money::Money};

const MAX_SCARCITY_MULTIPLIER: f64 = 1.15;
const SCARCITY_SLOPE: f64 = 0.3;

/// §4.6 `maxAllowedBid(team)`.
///
/// `remaining_budget` and `squad_size`/`squad_len` describe the bidding
/// team; `remaining_available_base_prices` are the base prices of every
/// player still on the block or in `deferred` (i.e. not yet sold/unsold);
/// `all_teams_slots_needed` is `slotsNeeded` for every team in the auction,
/// used for the scarcity ratio; `min_tier_base_price` is the cheapest base
/// price across *all* tiers, used to pad the reserve if fewer than
/// `futureSlots` players remain on the board.
pub fn max_allowed_bid(
    remaining_budget: Money,
    squad_size: u32,
    squad_len: u32,
    remaining_available_base_prices: &[Money],
    all_teams_slots_needed: &[u32],
    min_tier_base_price: Money,
) -> Money {
    let slots_needed = squad_size.saturating_sub(squad_len);
    if slots_needed == 0 {
        return Money::ZERO;
    }
    if slots_needed == 1 {
        return remaining_budget;
    }

    let future_slots = (slots_needed - 1) as usize;
    let mut sorted_prices = remaining_available_base_prices.to_vec();
    sorted_prices.sort();

    let mut reserve = Money::ZERO;
    for price in sorted_prices.iter().take(future_slots) {
        reserve = reserve + *price;
    }
    let shortfall = future_slots.saturating_sub(sorted_prices.len());
    reserve = reserve + Money(min_tier_base_price.0 * shortfall as i64);

    let total_demand: u32 = all_teams_slots_needed.iter().sum();
    let supply = remaining_available_base_prices.len() as f64;
    if supply > 0.0 {
        let r = total_demand as f64 / supply;
        if r > 1.0 {
            let multiplier = (1.0 + SCARCITY_SLOPE * (r - 1.0)).min(MAX_SCARCITY_MULTIPLIER);
            reserve = Money((reserve.0 as f64 * multiplier).round() as i64);
        }
    }

    Money::ZERO.max(remaining_budget.saturating_sub(reserve))
}

/// §4.6 `nextBidAmount(currentBid, basePrice, incrementRules)`. The first
/// bid of a round is exactly `basePrice` — callers signal "no bid yet" with
/// `current_bid = None`.
pub fn next_bid_amount(current_bid: Option<Money>, base_price: Money, rules: &[IncrementRule]) -> Money {
    let Some(current_bid) = current_bid else {
        return base_price;
    };
    if base_price.0 == 0 {
        // Degenerate base price; fall back to the first rule's increment so
        // we never divide by zero.
        return current_bid + rules.first().map(|rule| rule.increment).unwrap_or(Money::ZERO);
    }
    let ratio = current_bid.0 as f64 / base_price.0 as f64;
    let rule = rules
        .iter()
        .find(|rule| ratio >= rule.from_multiplier && ratio < rule.to_multiplier)
        .or_else(|| rules.last());
    match rule {
        Some(rule) => current_bid + rule.increment,
        None => current_bid,
    }
}
