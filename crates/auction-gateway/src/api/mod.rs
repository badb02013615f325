//! §6 "External Interfaces" — the axum `Router` wiring every HTTP endpoint
//! onto [`AppState`], following the same `Router::new().route(...).with_state(...)`
//! shape the autopilot HTTP API uses.

pub mod dto;
pub mod error;
mod handlers;

use {
    crate::state::AppState,
    axum::{
        Router,
        routing::{get, post},
    },
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auctions/{id}/action", post(handlers::post_action))
        .route("/auctions/{id}/round", post(handlers::post_round).delete(handlers::delete_round))
        .route("/auctions/{id}/outcry/raise", post(handlers::post_outcry_raise))
        .route("/auctions/{id}/outcry/state", get(handlers::get_outcry_state))
        .route("/captain/{auction_id}/{team_id}", get(handlers::get_captain_dashboard))
        .route("/captain/{auction_id}/{team_id}/bid", post(handlers::post_captain_bid))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
