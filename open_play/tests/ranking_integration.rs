//! Integration tests for organizer ranking: comparator reorganization,
//! explicit reorders, and initial ranking seeding.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use open_play::db::{MemoryRegistrationStore, RegistrationStore};
use open_play::registration::{
    Event, PlayerId, PlayerStatus, RankingService, RegistrationError, Status,
};

fn event() -> Event {
    Event {
        id: Uuid::new_v4(),
        max_players: 8,
        allow_reserves: true,
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
async fn test_reorganize_by_external_rating() {
    let store = Arc::new(MemoryRegistrationStore::new());
    let ev = event();
    store.put_event(ev.clone()).await;
    let players = seed_confirmed(&store, &ev, 4).await;

    // Ratings live outside this subsystem; the comparator is opaque input.
    let ratings: HashMap<PlayerId, f64> = [
        (players[0], 3.2),
        (players[1], 4.8),
        (players[2], 4.1),
        (players[3], 3.9),
    ]
    .into();

    let service = RankingService::new(store.clone());
    let changed = service
        .reorganize(ev.id, Uuid::new_v4(), &|a, b| {
            ratings[&b.player_id]
                .partial_cmp(&ratings[&a.player_id])
                .unwrap()
        })
        .await
        .unwrap();
    assert_eq!(changed, 4);

    let snapshot = store.load_roster(ev.id).await.unwrap().unwrap();
    let order: Vec<PlayerId> = snapshot
        .confirmed_rows()
        .iter()
        .map(|r| r.player_id)
        .collect();
    assert_eq!(order, vec![players[1], players[2], players[3], players[0]]);
}

#[tokio::test]
async fn test_reorganize_never_touches_waitlist() {
    let store = Arc::new(MemoryRegistrationStore::new());
    let ev = event();
    store.put_event(ev.clone()).await;
    seed_confirmed(&store, &ev, 2).await;
    let waiting = Uuid::new_v4();
    store
        .put_row(PlayerStatus::waitlisted(ev.id, waiting, 1, Utc::now()))
        .await;

    let service = RankingService::new(store.clone());
    service
        .reorganize(ev.id, Uuid::new_v4(), &|a, b| {
            b.registered_at.cmp(&a.registered_at)
        })
        .await
        .unwrap();

    let snapshot = store.load_roster(ev.id).await.unwrap().unwrap();
    let row = snapshot.row(waiting).unwrap();
    assert_eq!(row.status, Status::Waitlist);
    assert_eq!(row.ranking_order, 1);
}

#[tokio::test]
async fn test_reorder_applies_exact_sequence() {
    let store = Arc::new(MemoryRegistrationStore::new());
    let ev = event();
    store.put_event(ev.clone()).await;
    let players = seed_confirmed(&store, &ev, 4).await;

    let service = RankingService::new(store.clone());
    let sequence = vec![players[2], players[0], players[3], players[1]];
    service
        .reorder(ev.id, Uuid::new_v4(), sequence.clone())
        .await
        .unwrap();

    let snapshot = store.load_roster(ev.id).await.unwrap().unwrap();
    let order: Vec<PlayerId> = snapshot
        .confirmed_rows()
        .iter()
        .map(|r| r.player_id)
        .collect();
    assert_eq!(order, sequence);
}

#[tokio::test]
async fn test_reorder_rejects_missing_player() {
    let store = Arc::new(MemoryRegistrationStore::new());
    let ev = event();
    store.put_event(ev.clone()).await;
    let players = seed_confirmed(&store, &ev, 4).await;

    let service = RankingService::new(store.clone());
    let err = service
        .reorder(ev.id, Uuid::new_v4(), players[..3].to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::InvalidOrderSet));

    // Roster unchanged.
    let snapshot = store.load_roster(ev.id).await.unwrap().unwrap();
    for (idx, p) in players.iter().enumerate() {
        assert_eq!(snapshot.row(*p).unwrap().ranking_order, idx as u32 + 1);
    }
}

#[tokio::test]
async fn test_reorder_rejects_unknown_and_duplicate_ids() {
    let store = Arc::new(MemoryRegistrationStore::new());
    let ev = event();
    store.put_event(ev.clone()).await;
    let players = seed_confirmed(&store, &ev, 3).await;

    let service = RankingService::new(store.clone());

    let mut with_stranger = players.clone();
    with_stranger[2] = Uuid::new_v4();
    let err = service
        .reorder(ev.id, Uuid::new_v4(), with_stranger)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::InvalidOrderSet));

    let duplicated = vec![players[0], players[0], players[1]];
    let err = service
        .reorder(ev.id, Uuid::new_v4(), duplicated)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::InvalidOrderSet));
}

#[tokio::test]
async fn test_set_initial_rankings_follows_registration_time() {
    let store = Arc::new(MemoryRegistrationStore::new());
    let ev = event();
    store.put_event(ev.clone()).await;

    // Seed with ranks that disagree with registration order.
    let base = Utc::now();
    let early = Uuid::new_v4();
    let late = Uuid::new_v4();
    store
        .put_row(PlayerStatus::confirmed(
            ev.id,
            late,
            1,
            base + Duration::seconds(60),
        ))
        .await;
    store
        .put_row(PlayerStatus::confirmed(ev.id, early, 2, base))
        .await;

    let service = RankingService::new(store.clone());
    let changed = service
        .set_initial_rankings(ev.id, Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(changed, 2);

    let snapshot = store.load_roster(ev.id).await.unwrap().unwrap();
    assert_eq!(snapshot.row(early).unwrap().ranking_order, 1);
    assert_eq!(snapshot.row(late).unwrap().ranking_order, 2);
}

#[tokio::test]
async fn test_unknown_event() {
    let store = Arc::new(MemoryRegistrationStore::new());
    let service = RankingService::new(store);
    let err = service
        .reorder(Uuid::new_v4(), Uuid::new_v4(), vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::EventNotFound(_)));
}
