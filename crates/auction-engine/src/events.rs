//! §4.8 "Event Fan-out" (C8). Per-auction broadcast topics, registered
//! lazily in a `DashMap` the way `cow-amm`'s `Registry` keeps one `Storage`
//! per tracked key. Delivery is best-effort (§7): a publish with no
//! subscribers is not an error.

use {
    crate::domain::{money::Money, round::RoundStatus},
    auction_storage::{AuctionId, BidId, PlayerId, RoundId, TeamId, TierId},
    chrono::{DateTime, Utc},
    dashmap::DashMap,
    serde::Serialize,
    std::sync::atomic::{AtomicU64, Ordering},
    tokio::sync::broadcast,
};

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Event {
    RoundOpened { round_id: RoundId, player_id: PlayerId, base_price: Money, tier_id: TierId },
    #[serde(rename = "outcry-bid")]
    OutcryBid {
        round_id: RoundId,
        bid_id: Option<BidId>,
        sequence_number: i64,
        team_id: TeamId,
        team_name: String,
        amount: Money,
        timer_expires_at: Option<DateTime<Utc>>,
        next_bid_amount: Money,
        base_price: Money,
        player_id: PlayerId,
    },
    PlayerSold { player_id: PlayerId, team_id: TeamId, amount: Money },
    PlayerUnsold { player_id: PlayerId },
    PlayerDeferred { player_id: PlayerId },
    RoundClosed { round_id: RoundId },
    AuctionCompleted,
}

/// Envelope carrying the per-auction monotonic logical clock (§4.8, §5
/// "Event stream per auction") so clients can detect gaps and refetch.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub sequence: u64,
    #[serde(flatten)]
    pub event: Event,
}

struct Topic {
    sender: broadcast::Sender<Envelope>,
    sequence: AtomicU64,
}

const TOPIC_CAPACITY: usize = 256;

/// Registry of `auction-{id}` topics. Mirrors the dashmap-keyed-state
/// pattern used for per-pool bookkeeping elsewhere in this codebase.
pub struct EventBus {
    topics: DashMap<AuctionId, Topic>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(TOPIC_CAPACITY)
    }

    /// `capacity` is the per-topic backlog (§9's "max event backlog" knob):
    /// how many unconsumed events a lagging subscriber may fall behind by
    /// before `broadcast` starts dropping the oldest ones on it.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { topics: DashMap::new(), capacity }
    }

    pub fn subscribe(&self, auction_id: AuctionId) -> broadcast::Receiver<Envelope> {
        self.topics
            .entry(auction_id)
            .or_insert_with(|| Topic { sender: broadcast::channel(self.capacity).0, sequence: AtomicU64::new(0) })
            .sender
            .subscribe()
    }

    /// Best-effort (§7): failure to deliver (no subscribers, or a lagging
    /// receiver) is logged, never propagated.
    pub fn publish(&self, auction_id: AuctionId, event: Event) {
        let topic = self
            .topics
            .entry(auction_id)
            .or_insert_with(|| Topic { sender: broadcast::channel(self.capacity).0, sequence: AtomicU64::new(0) });
        let sequence = topic.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        if topic.sender.send(Envelope { sequence, event }).is_err() {
            tracing::debug!(%auction_id, sequence, "event published with no active subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sequence_numbers_are_monotonic_and_gap_free() {
        let bus = EventBus::new();
        let auction_id = AuctionId::new();
        let mut receiver = bus.subscribe(auction_id);

        bus.publish(auction_id, Event::AuctionCompleted);
        bus.publish(auction_id, Event::AuctionCompleted);

        let first = receiver.recv().await.unwrap();
        let second = receiver.recv().await.unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish(AuctionId::new(), Event::AuctionCompleted);
    }
}
