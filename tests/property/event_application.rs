// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Event Application
//!
//! Replay, redelivery and version properties that must hold for every
//! generated history of a single user.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use loyalty_es::events::{CreatedPayload, PointsEarnedPayload, UserEvent};
use loyalty_es::{
    Event, EventHandler, EventRepo, EventRepository, EventStore, History, InMemoryEventStore,
    InMemoryReadRepo, ReadRepo, User, UserProjector,
};
use proptest::prelude::*;

const USER_ID: &str = "01934f4a-1000-7000-8000-000000001000";

// ============================================================================
// Test Helpers
// ============================================================================

fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-19T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn at(version: u64) -> DateTime<Utc> {
    base_time() + TimeDelta::seconds(version as i64)
}

/// A created event followed by one PointsEarned event per amount
fn points_history(amounts: &[u32]) -> Vec<Event> {
    let created = UserEvent::Created(
        CreatedPayload::new("alice", "alice@example.com", "ABCD1234", None).unwrap(),
    );
    let mut events = vec![Event::from_payload(USER_ID, 1, &created, at(1)).unwrap()];
    for (offset, amount) in amounts.iter().enumerate() {
        let version = offset as u64 + 2;
        let change = UserEvent::PointsEarned(PointsEarnedPayload::new(*amount).unwrap());
        events.push(Event::from_payload(USER_ID, version, &change, at(version)).unwrap());
    }
    events
}

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Point awards small enough that no sequence overflows u32
fn point_amounts() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(1u32..10_000, 0..40)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: Replay sums every award
    #[test]
    fn prop_replay_sums_points(amounts in point_amounts()) {
        let user = User::from_history(USER_ID, &History::new(points_history(&amounts))).unwrap();

        prop_assert_eq!(user.points, amounts.iter().sum::<u32>());
    }

    /// Property: Version equals the number of events applied
    #[test]
    fn prop_version_equals_history_length(amounts in point_amounts()) {
        let history = History::new(points_history(&amounts));
        let user = User::from_history(USER_ID, &history).unwrap();

        prop_assert_eq!(user.version, history.len() as u64);
        prop_assert_eq!(user.version, history.last_version());
    }

    /// Property: Replaying a prefix then the rest equals replaying everything
    #[test]
    fn prop_replay_is_resumable(amounts in point_amounts(), split in 0usize..41) {
        let events = points_history(&amounts);
        let split = split.min(events.len());

        let full = User::from_history(USER_ID, &History::new(events.clone())).unwrap();

        let prefix = History::new(events[..split].to_vec());
        let mut resumed = User::from_history(USER_ID, &prefix).unwrap();
        resumed.apply(&History::new(events[split..].to_vec())).unwrap();

        prop_assert_eq!(resumed, full);
    }

    /// Property: Persisting through the repository and reloading is lossless
    #[test]
    fn prop_repository_round_trip(amounts in point_amounts()) {
        let events = points_history(&amounts);
        let expected = User::from_history(USER_ID, &History::new(events.clone())).unwrap();

        let loaded = tokio_test::block_on(async {
            let repo = EventRepository::new(Arc::new(InMemoryEventStore::new()));
            repo.apply(events).await.unwrap();
            repo.load(USER_ID).await.unwrap()
        });

        prop_assert_eq!(loaded, expected);
    }

    /// Property: The projection is unaffected by redelivering any event
    #[test]
    fn prop_projection_ignores_redelivery(
        amounts in prop::collection::vec(1u32..10_000, 1..20),
        redeliver in prop::collection::vec(any::<prop::sample::Index>(), 0..10),
    ) {
        let events = points_history(&amounts);

        let points = tokio_test::block_on(async {
            let store = Arc::new(InMemoryEventStore::new());
            store.save(&events).await.unwrap();
            let read_repo = Arc::new(InMemoryReadRepo::new());
            let projector = UserProjector::new(read_repo.clone(), store);

            for event in &events {
                projector.handle(event).await.unwrap();
            }
            for index in &redeliver {
                projector.handle(index.get(&events)).await.unwrap();
            }
            read_repo.user(USER_ID).await.unwrap().points
        });

        prop_assert_eq!(points, amounts.iter().sum::<u32>());
    }
}
