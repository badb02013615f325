//! Raw persistence layer for the auction engine.
//!
//! Design:
//!
//! Functions that execute multiple statements that must succeed or fail
//! together take `&mut PgTransaction`. Functions that execute a single
//! statement take `&mut PgConnection` (or, for top-level entry points that
//! open their own transaction, a `&PgPool`). This mirrors the convention the
//! rest of this codebase uses for its Postgres access layer: callers decide
//! whether an operation participates in a larger transaction or stands
//! alone.

pub mod access;
pub mod auction;
pub mod auction_result;
pub mod bid;
pub mod history;
pub mod ids;
pub mod player;
pub mod round;
pub mod team;
pub mod tier;

pub use ids::{AuctionId, BidId, PlayerId, RoundId, TeamId, TierId};

pub type PgTransaction<'a> = sqlx::Transaction<'a, sqlx::Postgres>;

/// Names of all tables this crate owns, in an order safe for `TRUNCATE`.
pub const ALL_TABLES: &[&str] = &[
    "team_captains",
    "team_roles",
    "auction_roles",
    "history_entries",
    "auction_results",
    "bids",
    "rounds",
    "players",
    "teams",
    "tiers",
    "auctions",
];

/// Truncates every table. Only ever used by tests.
pub async fn clear_DANGER_(ex: &mut sqlx::PgConnection) -> Result<(), sqlx::Error> {
    #[allow(clippy::format_push_string)]
    let query = ALL_TABLES
        .iter()
        .map(|table| format!("TRUNCATE {table} CASCADE;"))
        .collect::<String>();
    sqlx::raw_sql(&query).execute(ex).await?;
    Ok(())
}
