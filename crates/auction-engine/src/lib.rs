//! Auction execution engine: queue/round state machine, bid admission,
//! settlement, budget solver, authorization, and event fan-out (C1-C8) over
//! the `auction_storage` persistence boundary (C9).

pub mod domain;
pub mod events;
pub mod lifecycle;
pub mod persistence;
pub mod pipeline;
pub mod settlement;
pub mod snapshot;

pub use {
    events::{Event, EventBus},
    lifecycle::LifecycleService,
    persistence::{PgPersistence, Persistence},
    pipeline::{AdmissionPipeline, BidRequest, OutcryAdmission},
    settlement::{SettlementAction, SettlementEngine},
    snapshot::AuctionSnapshot,
};
