//! §7 "Error Handling Design" — kinds, not exception types. Every field the
//! spec names on a variant is carried so the HTTP boundary (`auction-gateway`)
//! can build the exact response body §6/§7 describe without re-deriving
//! anything from the error.

use crate::domain::money::Money;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed or out-of-range input; never retried.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// Missing identity (§6 401).
    #[error("authentication required")]
    Authentication,

    /// Identity known but not permitted (§6 403). `team_id` is `None` for
    /// auction-scoped checks (the owner/moderator auctioneer endpoints),
    /// which aren't tied to any one team.
    #[error("not authorized{}", team_id.map(|id| format!(" for team {id}")).unwrap_or_default())]
    Authorization {
        team_id: Option<auction_storage::TeamId>,
        current_user: String,
        expected_captain: Option<String>,
    },

    /// State machine would be violated (§6 400, e.g. bid on non-LIVE
    /// auction, UNDO with empty history).
    #[error("precondition failed: {message}")]
    Precondition { message: String },

    /// Bid violates solvency (§6 400).
    #[error("bid of {amount} exceeds the {max_allowed} a team can safely commit")]
    Budget {
        remaining_budget: Money,
        max_allowed: Money,
        amount: Money,
    },

    /// Outcry raise lost the race (§6 409).
    #[error("stale bid: current is {current_bid} at sequence {sequence_number}")]
    StaleBid {
        current_bid: Money,
        next_bid_amount: Money,
        sequence_number: i64,
    },

    /// Entity missing (§6 404).
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// Persistence boundary failure; caller may retry (§6 500).
    #[error("transient storage failure: {0}")]
    Transient(#[from] sqlx::Error),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition { message: message.into() }
    }

    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound { kind, id: id.to_string() }
    }

    /// Stable error code for UI switching (§7 "stable error code").
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::Authorization { .. } => "AUTHORIZATION_ERROR",
            Self::Precondition { .. } => "PRECONDITION_ERROR",
            Self::Budget { .. } => "BUDGET_ERROR",
            Self::StaleBid { .. } => "STALE_BID_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Transient(_) => "TRANSIENT_ERROR",
        }
    }
}
