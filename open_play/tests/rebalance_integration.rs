//! Integration tests for cancellation and group-size rebalancing.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use open_play::db::{MemoryRegistrationStore, RegistrationStore};
use open_play::registration::{
    CancellationRebalancer, Event, GroupPolicy, PlayerId, PlayerStatus, PromotionReason,
    RegistrationError, Status,
};

fn event(max_players: u32, allow_reserves: bool) -> Event {
    Event {
        id: Uuid::new_v4(),
        max_players,
        allow_reserves,
        registration_open: true,
    }
}

async fn seed_confirmed(store: &MemoryRegistrationStore, ev: &Event, n: u32) -> Vec<PlayerId> {
    let base = Utc::now();
    let mut ids = Vec::new();
    for rank in 1..=n {
        let player = Uuid::new_v4();
        store
            .put_row(PlayerStatus::confirmed(
                ev.id,
                player,
                rank,
                base + Duration::seconds(rank as i64),
            ))
            .await;
        ids.push(player);
    }
    ids
}

#[tokio::test]
async fn test_confirmed_cancellation_demotes_highest_ranked() {
    let store = Arc::new(MemoryRegistrationStore::new());
    let ev = event(8, true);
    store.put_event(ev.clone()).await;
    let players = seed_confirmed(&store, &ev, 8).await;

    let rebalancer = CancellationRebalancer::new(store.clone(), GroupPolicy::default());
    let outcome = rebalancer.cancel(ev.id, players[1]).await.unwrap();
    assert_eq!(outcome.cancelled_status, Status::Confirmed);

    // Exactly the three highest-ranked players (ranks 6, 7, 8) move to the
    // waitlist, preserving their relative order; the best group of four
    // stays intact.
    assert_eq!(outcome.demoted, vec![players[5], players[6], players[7]]);

    let snapshot = store.load_roster(ev.id).await.unwrap().unwrap();
    assert_eq!(snapshot.confirmed_count(), 4);
    assert_eq!(snapshot.waitlist_count(), 3);
    assert!(snapshot.row(players[1]).is_none());

    for (queue_pos, p) in [(1, players[5]), (2, players[6]), (3, players[7])] {
        let row = snapshot.row(p).unwrap();
        assert_eq!(row.status, Status::Waitlist);
        assert_eq!(row.ranking_order, queue_pos);
        assert!(row.promoted_at.is_none());
        assert!(row.promotion_reason.is_none());
    }
}

#[tokio::test]
async fn test_demotion_clears_promotion_history() {
    let store = Arc::new(MemoryRegistrationStore::new());
    let ev = event(8, true);
    store.put_event(ev.clone()).await;

    let base = Utc::now();
    let mut players = Vec::new();
    for rank in 1..=5u32 {
        let mut row = PlayerStatus::confirmed(
            ev.id,
            Uuid::new_v4(),
            rank,
            base + Duration::seconds(rank as i64),
        );
        // Pretend rank 5 arrived through a promotion.
        if rank == 5 {
            row.promoted_at = Some(base);
            row.promotion_reason = Some(PromotionReason::GroupCompleted);
        }
        players.push(row.player_id);
        store.put_row(row).await;
    }

    let rebalancer = CancellationRebalancer::new(store.clone(), GroupPolicy::default());
    // 5 confirmed -> cancel one -> 4 remain, excess 0: no demotion.
    let outcome = rebalancer.cancel(ev.id, players[4]).await.unwrap();
    assert!(outcome.demoted.is_empty());

    // 4 confirmed -> cancel one -> 3 remain, excess 3: all demoted, clean.
    let outcome = rebalancer.cancel(ev.id, players[0]).await.unwrap();
    assert_eq!(outcome.demoted.len(), 3);

    let snapshot = store.load_roster(ev.id).await.unwrap().unwrap();
    assert_eq!(snapshot.confirmed_count(), 0);
    assert_eq!(snapshot.waitlist_count(), 3);
    for row in &snapshot.rows {
        assert!(row.promoted_at.is_none());
        assert!(row.promotion_reason.is_none());
    }
}

#[tokio::test]
async fn test_demoted_players_join_waitlist_tail() {
    let store = Arc::new(MemoryRegistrationStore::new());
    let ev = event(4, true);
    store.put_event(ev.clone()).await;

    // Full group of four plus two already waiting.
    let confirmed = seed_confirmed(&store, &ev, 4).await;
    let waiting_a = Uuid::new_v4();
    let waiting_b = Uuid::new_v4();
    let base = Utc::now();
    store
        .put_row(PlayerStatus::waitlisted(ev.id, waiting_a, 1, base))
        .await;
    store
        .put_row(PlayerStatus::waitlisted(
            ev.id,
            waiting_b,
            2,
            base + Duration::seconds(1),
        ))
        .await;

    let rebalancer = CancellationRebalancer::new(store.clone(), GroupPolicy::default());
    let outcome = rebalancer.cancel(ev.id, confirmed[0]).await.unwrap();
    assert_eq!(outcome.demoted, vec![confirmed[1], confirmed[2], confirmed[3]]);

    // Demoted players queue behind those already waiting, even though they
    // registered earlier.
    let snapshot = store.load_roster(ev.id).await.unwrap().unwrap();
    assert_eq!(snapshot.row(waiting_a).unwrap().ranking_order, 1);
    assert_eq!(snapshot.row(waiting_b).unwrap().ranking_order, 2);
    assert_eq!(snapshot.row(confirmed[1]).unwrap().ranking_order, 3);
    assert_eq!(snapshot.row(confirmed[2]).unwrap().ranking_order, 4);
    assert_eq!(snapshot.row(confirmed[3]).unwrap().ranking_order, 5);
}

#[tokio::test]
async fn test_waitlist_cancellation_compacts_queue() {
    let store = Arc::new(MemoryRegistrationStore::new());
    let ev = event(8, true);
    store.put_event(ev.clone()).await;

    let base = Utc::now();
    let mut waiting = Vec::new();
    for rank in 1..=4u32 {
        let player = Uuid::new_v4();
        store
            .put_row(PlayerStatus::waitlisted(
                ev.id,
                player,
                rank,
                base + Duration::seconds(rank as i64),
            ))
            .await;
        waiting.push(player);
    }

    let rebalancer = CancellationRebalancer::new(store.clone(), GroupPolicy::default());
    let outcome = rebalancer.cancel(ev.id, waiting[1]).await.unwrap();
    assert_eq!(outcome.cancelled_status, Status::Waitlist);
    assert!(outcome.demoted.is_empty());

    let snapshot = store.load_roster(ev.id).await.unwrap().unwrap();
    assert_eq!(snapshot.waitlist_count(), 3);
    assert_eq!(snapshot.row(waiting[0]).unwrap().ranking_order, 1);
    assert_eq!(snapshot.row(waiting[2]).unwrap().ranking_order, 2);
    assert_eq!(snapshot.row(waiting[3]).unwrap().ranking_order, 3);
}

#[tokio::test]
async fn test_no_reserves_event_skips_demotion() {
    let store = Arc::new(MemoryRegistrationStore::new());
    let ev = event(8, false);
    store.put_event(ev.clone()).await;
    let players = seed_confirmed(&store, &ev, 8).await;

    let rebalancer = CancellationRebalancer::new(store.clone(), GroupPolicy::default());
    let outcome = rebalancer.cancel(ev.id, players[0]).await.unwrap();
    assert!(outcome.demoted.is_empty());

    // The partial group is tolerated: the waitlist must stay empty.
    let snapshot = store.load_roster(ev.id).await.unwrap().unwrap();
    assert_eq!(snapshot.confirmed_count(), 7);
    assert_eq!(snapshot.waitlist_count(), 0);
}

#[tokio::test]
async fn test_cancel_unregistered_player() {
    let store = Arc::new(MemoryRegistrationStore::new());
    let ev = event(8, true);
    store.put_event(ev.clone()).await;

    let rebalancer = CancellationRebalancer::new(store.clone(), GroupPolicy::default());
    let missing = Uuid::new_v4();
    let err = rebalancer.cancel(ev.id, missing).await.unwrap_err();
    assert!(matches!(err, RegistrationError::NotRegistered(id) if id == missing));
}

#[tokio::test]
async fn test_cancel_unknown_event() {
    let store = Arc::new(MemoryRegistrationStore::new());
    let rebalancer = CancellationRebalancer::new(store, GroupPolicy::default());
    let err = rebalancer.cancel(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, RegistrationError::EventNotFound(_)));
}
