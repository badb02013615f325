//! End-to-end scenarios against an in-memory `Persistence` fake, one per
//! literal example in §8. Each test drives the same public API the HTTP
//! handlers in `auction-gateway` call, not internal fake-store state, so
//! they exercise the lifecycle/pipeline/settlement wiring together.

mod common;

use {
    auction_engine::{
        domain::{
            auction::{Auction, AuctionStatus, BiddingMode, IncrementRule},
            authz::AdminSources,
            money::Money,
            player::{Player, PlayerStatus},
            team::Team,
            tier::Tier,
        },
        pipeline::BidRequest,
        AdmissionPipeline, LifecycleService, SettlementAction, SettlementEngine,
    },
    auction_storage::{AuctionId, PlayerId, TeamId, TierId},
    common::FakePersistence,
    std::sync::Arc,
};

fn player(name: &str, tier_id: TierId) -> Player {
    Player { id: PlayerId::new(), name: name.into(), tier_id, status: PlayerStatus::Available }
}

fn team(auction_id: AuctionId, name: &str) -> Team {
    Team { id: TeamId::new(), auction_id, name: name.into() }
}

async fn live_auction(
    persistence: &Arc<FakePersistence>,
    budget_per_team: i64,
    squad_size: u32,
    bidding_mode: BiddingMode,
    increment_rules: Vec<IncrementRule>,
    base_price: i64,
    player_count: usize,
) -> (Auction, Vec<Team>, Vec<Player>) {
    let lifecycle = LifecycleService::new(persistence.clone());
    let tier = Tier { id: TierId::new(), base_price: Money(base_price), min_per_team: 0, max_per_team: None };
    let auction = Auction {
        id: AuctionId::new(),
        bidding_mode,
        budget_per_team: Money(budget_per_team),
        squad_size,
        currency: "USD".into(),
        outcry_increment_rules: increment_rules,
        timer_seconds: None,
        tiers: vec![tier.clone()],
        status: AuctionStatus::Draft,
    };
    lifecycle.create(auction.clone()).await.unwrap();

    let teams = vec![team(auction.id, "A"), team(auction.id, "B")];
    lifecycle.add_teams(&teams).await.unwrap();

    let players: Vec<Player> = (0..player_count).map(|n| player(&format!("P{}", n + 1), tier.id)).collect();
    lifecycle.add_players(auction.id, &players).await.unwrap();

    lifecycle.start(auction.id).await.unwrap();
    (auction, teams, players)
}

#[tokio::test]
async fn scenario_1_sealed_sold_happy_path() {
    let persistence = Arc::new(FakePersistence::new());
    let (auction, teams, players) =
        live_auction(&persistence, 1000, 11, BiddingMode::Sealed, vec![], 20, 3).await;
    let team_a = &teams[0];

    let settlement = SettlementEngine::new(persistence.clone());
    let before = persistence.load_snapshot(auction.id).await.unwrap();
    assert_eq!(before.current_player().unwrap().id, players[0].id);
    assert!(before.open_round.is_some());

    let after = settlement
        .apply(auction.id, SettlementAction::Sold { team_id: team_a.id, amount: Money(100) })
        .await
        .unwrap();

    let squad_a = after.squad_for(team_a.id);
    assert_eq!(squad_a.0.len(), 1);
    assert_eq!(squad_a.0[0].player_id, players[0].id);
    assert_eq!(squad_a.0[0].winning_bid_amount, Money(100));
    assert_eq!(auction_engine::domain::team::remaining_budget(&after.auction, &squad_a), Money(900));

    assert_eq!(after.current_player().unwrap().id, players[1].id);
    let open_round = after.open_round.as_ref().unwrap();
    assert_eq!(open_round.player_id, players[1].id);
    assert!(open_round.is_open());
}

#[tokio::test]
async fn scenario_2_outcry_race() {
    let persistence = Arc::new(FakePersistence::new());
    let rules = vec![IncrementRule { from_multiplier: 0.0, to_multiplier: f64::INFINITY, increment: Money(10) }];
    let (auction, teams, _players) =
        live_auction(&persistence, 10_000, 11, BiddingMode::Outcry, rules, 50, 1).await;
    persistence.set_captain(teams[0].id, "x", "x@example.com");
    persistence.set_captain(teams[1].id, "y", "y@example.com");

    let pipeline = AdmissionPipeline::new(persistence.clone());
    let round_id = persistence.load_snapshot(auction.id).await.unwrap().open_round.unwrap().id;

    let request = |team_id: TeamId, user_id: &str, user_email: &str| BidRequest {
        auction_id: auction.id,
        round_id,
        team_id,
        amount: Money(50),
        user_id: user_id.into(),
        user_email: user_email.into(),
    };

    let sources_x = AdminSources { designated_captain: Some(("x".into(), "x@example.com".into())), ..Default::default() };
    let sources_y = AdminSources { designated_captain: Some(("y".into(), "y@example.com".into())), ..Default::default() };

    let (x_result, y_result) = tokio::join!(
        pipeline.admit_outcry_raise(request(teams[0].id, "x", "x@example.com"), &sources_x),
        pipeline.admit_outcry_raise(request(teams[1].id, "y", "y@example.com"), &sources_y),
    );

    let (winner, loser) = match (x_result, y_result) {
        (Ok(admission), Err(err)) => (admission, err),
        (Err(err), Ok(admission)) => (admission, err),
        (Ok(_), Ok(_)) => panic!("expected exactly one raise to lose the race"),
        (Err(e1), Err(e2)) => panic!("both raises failed: {e1:?} / {e2:?}"),
    };

    assert_eq!(winner.round.current_bid_amount, Some(Money(50)));
    assert_eq!(winner.sequence_number, 1);

    match loser {
        auction_engine::domain::error::EngineError::StaleBid { current_bid, sequence_number, .. } => {
            assert_eq!(current_bid, Money(50));
            assert_eq!(sequence_number, 1);
        }
        other => panic!("expected StaleBid, got {other:?}"),
    }

    let holder_team = winner.round.current_bid_team_id.unwrap();
    let challenger = if holder_team == teams[0].id { teams[1].id } else { teams[0].id };
    let (challenger_user, challenger_email, challenger_sources) = if challenger == teams[0].id {
        ("x", "x@example.com", &sources_x)
    } else {
        ("y", "y@example.com", &sources_y)
    };

    let next_raise = pipeline
        .admit_outcry_raise(
            BidRequest {
                auction_id: auction.id,
                round_id,
                team_id: challenger,
                amount: Money(60),
                user_id: challenger_user.into(),
                user_email: challenger_email.into(),
            },
            challenger_sources,
        )
        .await
        .unwrap();
    assert_eq!(next_raise.round.current_bid_amount, Some(Money(60)));
    assert_eq!(next_raise.sequence_number, 2);
}

#[tokio::test]
async fn scenario_3_budget_guard() {
    // 6 players in queue order: 3 fillers sold to B (filling its squad),
    // then the main player sold to A at 60, leaving exactly 2 players on
    // the board — matching the scenario's "squad already full" framing so
    // the scarcity multiplier (driven by every team's remaining demand, not
    // just the bidding team's) stays at 1.0 and the literal maxAllowed=30
    // holds.
    let persistence = Arc::new(FakePersistence::new());
    let (auction, teams, players) =
        live_auction(&persistence, 100, 3, BiddingMode::Sealed, vec![], 10, 6).await;
    let team_a = &teams[0];
    let team_b = &teams[1];
    persistence.set_captain(team_a.id, "u1", "u1@example.com");

    let settlement = SettlementEngine::new(persistence.clone());
    for _ in 0..3 {
        settlement.apply(auction.id, SettlementAction::Sold { team_id: team_b.id, amount: Money(1) }).await.unwrap();
    }
    settlement.apply(auction.id, SettlementAction::Sold { team_id: team_a.id, amount: Money(60) }).await.unwrap();

    let snapshot = persistence.load_snapshot(auction.id).await.unwrap();
    let round_id = snapshot.open_round.as_ref().unwrap().id;
    assert_eq!(snapshot.current_player().unwrap().id, players[4].id);
    assert_eq!(snapshot.squad_for(team_b.id).0.len(), 3);
    assert_eq!(
        auction_engine::domain::team::remaining_budget(&snapshot.auction, &snapshot.squad_for(team_a.id)),
        Money(40)
    );

    let pipeline = AdmissionPipeline::new(persistence.clone());
    let sources = AdminSources { designated_captain: Some(("u1".into(), "u1@example.com".into())), ..Default::default() };

    let rejected = pipeline
        .admit_sealed_bid(
            BidRequest {
                auction_id: auction.id,
                round_id,
                team_id: team_a.id,
                amount: Money(31),
                user_id: "u1".into(),
                user_email: "u1@example.com".into(),
            },
            &sources,
        )
        .await;
    match rejected {
        Err(auction_engine::domain::error::EngineError::Budget { max_allowed, .. }) => {
            assert_eq!(max_allowed, Money(30));
        }
        other => panic!("expected BudgetError, got {other:?}"),
    }

    pipeline
        .admit_sealed_bid(
            BidRequest {
                auction_id: auction.id,
                round_id,
                team_id: team_a.id,
                amount: Money(30),
                user_id: "u1".into(),
                user_email: "u1@example.com".into(),
            },
            &sources,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn scenario_4_defer_and_auto_return() {
    let persistence = Arc::new(FakePersistence::new());
    let (auction, teams, players) =
        live_auction(&persistence, 1000, 11, BiddingMode::Sealed, vec![], 20, 3).await;
    let settlement = SettlementEngine::new(persistence.clone());

    settlement.apply(auction.id, SettlementAction::Defer).await.unwrap();
    let after_defer = persistence.load_snapshot(auction.id).await.unwrap();
    assert_eq!(after_defer.queue_state.queue, vec![players[1].id, players[2].id]);
    assert_eq!(after_defer.queue_state.index, 0);
    assert_eq!(after_defer.queue_state.deferred, vec![players[0].id]);
    assert_eq!(after_defer.current_player().unwrap().id, players[1].id);

    settlement.apply(auction.id, SettlementAction::Sold { team_id: teams[0].id, amount: Money(20) }).await.unwrap();
    let final_snapshot = settlement.apply(auction.id, SettlementAction::Sold { team_id: teams[1].id, amount: Money(20) }).await.unwrap();

    assert_eq!(final_snapshot.queue_state.queue, vec![players[1].id, players[2].id, players[0].id]);
    assert_eq!(final_snapshot.queue_state.index, 2);
    assert!(final_snapshot.queue_state.deferred.is_empty());
    assert_eq!(final_snapshot.current_player().unwrap().id, players[0].id);
    assert_eq!(final_snapshot.open_round.as_ref().unwrap().player_id, players[0].id);
}

#[tokio::test]
async fn scenario_5_undo_of_sold() {
    let persistence = Arc::new(FakePersistence::new());
    let (auction, teams, players) =
        live_auction(&persistence, 1000, 11, BiddingMode::Sealed, vec![], 20, 3).await;
    let team_a = &teams[0];
    let settlement = SettlementEngine::new(persistence.clone());

    settlement.apply(auction.id, SettlementAction::Sold { team_id: team_a.id, amount: Money(100) }).await.unwrap();
    let after_sold = persistence.load_snapshot(auction.id).await.unwrap();
    let round_for_p2 = after_sold.open_round.clone().unwrap();
    assert_eq!(round_for_p2.player_id, players[1].id);

    let after_undo = settlement.apply(auction.id, SettlementAction::Undo).await.unwrap();

    assert!(after_undo.squad_for(team_a.id).0.is_empty());
    assert_eq!(
        auction_engine::domain::team::remaining_budget(&after_undo.auction, &after_undo.squad_for(team_a.id)),
        Money(1000)
    );
    assert_eq!(after_undo.queue_state.index, 0);
    assert_eq!(after_undo.current_player().unwrap().id, players[0].id);

    let reopened_round = after_undo.open_round.as_ref().unwrap();
    assert_eq!(reopened_round.player_id, players[0].id);
    assert_ne!(reopened_round.id, round_for_p2.id);
}

#[tokio::test]
async fn scenario_6_authorization() {
    let persistence = Arc::new(FakePersistence::new());
    let (auction, teams, _players) =
        live_auction(&persistence, 1000, 11, BiddingMode::Sealed, vec![], 20, 1).await;
    let team_a = &teams[0];
    persistence.set_captain(team_a.id, "u1", "u1@example.com");

    let round_id = persistence.load_snapshot(auction.id).await.unwrap().open_round.unwrap().id;
    let pipeline = AdmissionPipeline::new(persistence.clone());

    let sources = AdminSources { designated_captain: Some(("u1".into(), "u1@example.com".into())), ..Default::default() };

    pipeline
        .admit_sealed_bid(
            BidRequest {
                auction_id: auction.id,
                round_id,
                team_id: team_a.id,
                amount: Money(20),
                user_id: "u1".into(),
                user_email: "u1@example.com".into(),
            },
            &sources,
        )
        .await
        .unwrap();

    let denied = pipeline
        .admit_sealed_bid(
            BidRequest {
                auction_id: auction.id,
                round_id,
                team_id: team_a.id,
                amount: Money(20),
                user_id: "u2".into(),
                user_email: "u2@example.com".into(),
            },
            &sources,
        )
        .await;
    match denied {
        Err(auction_engine::domain::error::EngineError::Authorization { team_id, current_user, expected_captain }) => {
            assert_eq!(team_id, Some(team_a.id));
            assert_eq!(current_user, "u2@example.com");
            assert_eq!(expected_captain.as_deref(), Some("u1@example.com"));
        }
        other => panic!("expected AuthorizationError, got {other:?}"),
    }
}
