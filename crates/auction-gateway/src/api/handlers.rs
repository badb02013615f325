//! One function per row of the §6 HTTP table.

use {
    super::dto::{ActionRequest, CaptainDashboard, ForceOpenRoundRequest, OutcryRaiseRequest, SealedBidRequest, SnapshotView},
    crate::{api::error::ApiError, identity::Identity, state::AppState},
    auction_engine::{
        domain::{authz, budget, money::Money},
        events::Event,
        pipeline::BidRequest,
        settlement::SettlementAction,
    },
    auction_storage::{AuctionId, TeamId},
    axum::{
        extract::{Path, State},
        response::Json,
    },
};

/// `POST /auctions/{id}/action`.
pub async fn post_action(
    State(state): State<AppState>,
    Path(auction_id): Path<AuctionId>,
    identity: Identity,
    Json(body): Json<ActionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize_as_auctioneer(&state, auction_id, &identity).await?;

    let before = state.persistence.load_snapshot(auction_id).await?;
    let outgoing_round = before.open_round.clone();

    let action = match &body {
        ActionRequest::Sold { team_id, amount } => SettlementAction::Sold { team_id: *team_id, amount: Money(*amount) },
        ActionRequest::Unsold => SettlementAction::Unsold,
        ActionRequest::Defer => SettlementAction::Defer,
        ActionRequest::Undo => SettlementAction::Undo,
    };

    // Captured before the settlement write so the SOLD/UNSOLD/DEFERRED event
    // below can still name the player that was on the block; `after` already
    // has the queue advanced past them.
    let forward_event = outgoing_round.as_ref().and_then(|round| match &body {
        ActionRequest::Sold { team_id, amount } => {
            Some(Event::PlayerSold { player_id: round.player_id, team_id: *team_id, amount: Money(*amount) })
        }
        ActionRequest::Unsold => Some(Event::PlayerUnsold { player_id: round.player_id }),
        ActionRequest::Defer => Some(Event::PlayerDeferred { player_id: round.player_id }),
        // UNDO reverses whatever it reverses; the round-closed/round-opened
        // pair published below is all clients need to reconcile.
        ActionRequest::Undo => None,
    });

    let after = state.settlement.apply(auction_id, action).await?;

    if let Some(round) = &outgoing_round {
        if let Some(event) = forward_event {
            state.events.publish(auction_id, event);
        }
        state.events.publish(auction_id, Event::RoundClosed { round_id: round.id });
    }
    if let Some(round) = &after.open_round {
        state.events.publish(
            auction_id,
            Event::RoundOpened { round_id: round.id, player_id: round.player_id, base_price: round.base_price, tier_id: round.tier_id },
        );
    } else if outgoing_round.is_some() {
        state.events.publish(auction_id, Event::AuctionCompleted);
    }

    Ok(Json(serde_json::to_value(SnapshotView::of(&after)).expect("snapshot always serializable")))
}

/// `POST /auctions/{id}/round`.
pub async fn post_round(
    State(state): State<AppState>,
    Path(auction_id): Path<AuctionId>,
    identity: Identity,
    Json(body): Json<ForceOpenRoundRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize_as_auctioneer(&state, auction_id, &identity).await?;

    let snapshot = state.settlement.force_open_round(auction_id, body.player_id).await?;
    if let Some(round) = &snapshot.open_round {
        state.events.publish(
            auction_id,
            Event::RoundOpened { round_id: round.id, player_id: round.player_id, base_price: round.base_price, tier_id: round.tier_id },
        );
    }
    Ok(Json(serde_json::to_value(SnapshotView::of(&snapshot)).expect("snapshot always serializable")))
}

/// `DELETE /auctions/{id}/round`.
pub async fn delete_round(
    State(state): State<AppState>,
    Path(auction_id): Path<AuctionId>,
    identity: Identity,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize_as_auctioneer(&state, auction_id, &identity).await?;

    let before = state.persistence.load_snapshot(auction_id).await?;
    let snapshot = state.settlement.force_close_round(auction_id).await?;
    if let Some(round) = &before.open_round {
        state.events.publish(auction_id, Event::RoundClosed { round_id: round.id });
    }
    Ok(Json(serde_json::to_value(SnapshotView::of(&snapshot)).expect("snapshot always serializable")))
}

/// `POST /auctions/{id}/outcry/raise`.
pub async fn post_outcry_raise(
    State(state): State<AppState>,
    Path(auction_id): Path<AuctionId>,
    identity: Identity,
    Json(body): Json<OutcryRaiseRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // Outcry raises aren't scoped to a single team path segment (unlike
    // sealed bids), so the team is whichever one the caller's identity
    // resolves to via the admin sources lookup for this auction.
    let team_id = resolve_caller_team(&state, auction_id, &identity).await?;
    let sources = state.persistence.load_admin_sources(auction_id, team_id, &identity.user_id).await?;

    let request = BidRequest {
        auction_id,
        round_id: body.round_id,
        team_id,
        amount: Money(body.amount),
        user_id: identity.user_id.clone(),
        user_email: identity.user_email.clone(),
    };
    let admission = state.pipeline.admit_outcry_raise(request, &sources).await?;

    let snapshot = state.persistence.load_snapshot(auction_id).await?;
    let team_name =
        snapshot.teams.iter().find(|team| team.id == team_id).map(|team| team.name.clone()).unwrap_or_default();
    let next_bid_amount = budget::next_bid_amount(
        admission.round.current_bid_amount,
        admission.round.base_price,
        &snapshot.auction.outcry_increment_rules,
    );

    state.events.publish(
        auction_id,
        Event::OutcryBid {
            round_id: admission.round.id,
            bid_id: None,
            sequence_number: admission.sequence_number,
            team_id,
            team_name,
            amount: admission.round.current_bid_amount.unwrap_or(admission.round.base_price),
            timer_expires_at: admission.round.timer_expires_at,
            next_bid_amount,
            base_price: admission.round.base_price,
            player_id: admission.round.player_id,
        },
    );

    Ok(Json(serde_json::json!({"roundId": admission.round.id, "sequenceNumber": admission.sequence_number})))
}

/// `GET /auctions/{id}/outcry/state` — open to any authenticated participant.
pub async fn get_outcry_state(
    State(state): State<AppState>,
    Path(auction_id): Path<AuctionId>,
    _identity: Identity,
) -> Result<Json<serde_json::Value>, ApiError> {
    let snapshot = state.persistence.load_snapshot(auction_id).await?;
    Ok(Json(serde_json::to_value(SnapshotView::of(&snapshot)).expect("snapshot always serializable")))
}

/// `GET /captain/{auctionId}/{teamId}`. §9: two path segments rather than one
/// delimited `sessionId`, per the spec's own suggested resolution of the
/// open delimiter question.
pub async fn get_captain_dashboard(
    State(state): State<AppState>,
    Path((auction_id, team_id)): Path<(AuctionId, TeamId)>,
    identity: Identity,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sources = state.persistence.load_admin_sources(auction_id, team_id, &identity.user_id).await?;
    authz::authorize(
        &authz::AuthRequest { user_id: &identity.user_id, user_email: &identity.user_email, team_id, auction_id },
        &sources,
    )
    .map_err(|denied| {
        ApiError::from(auction_engine::domain::EngineError::Authorization {
            team_id: Some(team_id),
            current_user: denied.current_user,
            expected_captain: denied.expected_captain,
        })
    })?;

    let snapshot = state.persistence.load_snapshot(auction_id).await?;
    let dashboard = CaptainDashboard { snapshot: SnapshotView::of(&snapshot), own_team_id: team_id };
    Ok(Json(serde_json::to_value(dashboard).expect("dashboard always serializable")))
}

/// `POST /captain/{auctionId}/{teamId}/bid`.
pub async fn post_captain_bid(
    State(state): State<AppState>,
    Path((auction_id, team_id)): Path<(AuctionId, TeamId)>,
    identity: Identity,
    Json(body): Json<SealedBidRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sources = state.persistence.load_admin_sources(auction_id, team_id, &identity.user_id).await?;

    let snapshot = state.persistence.load_snapshot(auction_id).await?;
    let round = snapshot
        .open_round
        .as_ref()
        .filter(|round| round.id == body.round_id)
        .ok_or_else(|| auction_engine::domain::EngineError::precondition("round is not open"))?;
    if round.player_id != body.player_id {
        return Err(ApiError::from(auction_engine::domain::EngineError::validation(
            "playerId does not match the round's current player",
        )));
    }

    let request = BidRequest {
        auction_id,
        round_id: body.round_id,
        team_id,
        amount: Money(body.amount),
        user_id: identity.user_id.clone(),
        user_email: identity.user_email.clone(),
    };
    state.pipeline.admit_sealed_bid(request, &sources).await?;
    Ok(Json(serde_json::json!({"accepted": true})))
}

async fn authorize_as_auctioneer(state: &AppState, auction_id: AuctionId, identity: &Identity) -> Result<(), ApiError> {
    let roles = state.persistence.load_auction_roles(auction_id, &identity.user_id).await?;
    authz::authorize_auctioneer(&identity.user_email, &roles).map_err(|denied| {
        ApiError::from(auction_engine::domain::EngineError::Authorization {
            team_id: None,
            current_user: denied.current_user,
            expected_captain: denied.expected_captain,
        })
    })?;
    Ok(())
}

/// Resolves which team the caller administers within this auction, for the
/// outcry-raise endpoint (§6), which names no team in its path. Picks the
/// first auction role/team role match; ambiguity across multiple teams is
/// out of scope (§1 "one captain session per team" framing).
async fn resolve_caller_team(state: &AppState, auction_id: AuctionId, identity: &Identity) -> Result<TeamId, ApiError> {
    let snapshot = state.persistence.load_snapshot(auction_id).await?;
    for team in &snapshot.teams {
        let sources = state.persistence.load_admin_sources(auction_id, team.id, &identity.user_id).await?;
        let is_admin = sources.designated_captain.as_ref().is_some_and(|(uid, _)| uid == &identity.user_id)
            || !sources.team_roles.is_empty()
            || !sources.auction_roles.is_empty();
        if is_admin {
            return Ok(team.id);
        }
    }
    Err(ApiError::from(auction_engine::domain::EngineError::Authorization {
        team_id: None,
        current_user: identity.user_email.clone(),
        expected_captain: None,
    }))
}
