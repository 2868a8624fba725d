// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for loyalty-es
//!
//! Deterministic users, events and timestamps shared by the integration
//! suites. Ids and times are fixed constants so histories compare equal
//! across runs.

#![allow(dead_code)]

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use loyalty_es::aggregate::CreateUser;
use loyalty_es::events::{
    CreatedPayload, DeletedPayload, PointsEarnedPayload, ReferralCompletedPayload,
    ReferralCreatedPayload, ReferralStatus, UserEvent,
};
use loyalty_es::{Event, EventBusConfig};

pub const ALICE_ID: &str = "01934f4a-1000-7000-8000-000000001000";
pub const BOB_ID: &str = "01934f4a-1001-7000-8000-000000001001";
pub const CAROL_ID: &str = "01934f4a-1002-7000-8000-000000001002";

pub const ALICE_CODE: &str = "aLiCe-01";
pub const REFERRAL_ID_1: &str = "01934f4a-2000-7000-8000-000000002000";

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

/// Parse the fixed timestamp
pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

/// Fixed timestamp shifted by whole minutes
pub fn minutes_later(minutes: i64) -> DateTime<Utc> {
    fixed_timestamp() + TimeDelta::minutes(minutes)
}

/// Bus config with millisecond backoff so failing paths finish quickly
pub fn fast_bus_config() -> EventBusConfig {
    EventBusConfig::new(Duration::from_millis(1), Duration::from_millis(200), 3)
}

pub fn create_user_command(
    user_id: &str,
    username: &str,
    referred_by_code: Option<&str>,
) -> CreateUser {
    CreateUser {
        user_id: user_id.to_string(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        referred_by_code: referred_by_code.map(str::to_string),
    }
}

fn event(aggregate_id: &str, version: u64, change: UserEvent) -> Event {
    Event::from_payload(aggregate_id, version, &change, minutes_later(version as i64))
        .expect("Invalid payload in test fixture")
}

pub fn user_created_fixture(aggregate_id: &str, username: &str, referral_code: &str) -> Event {
    event(
        aggregate_id,
        1,
        UserEvent::Created(
            CreatedPayload::new(username, format!("{username}@example.com"), referral_code, None)
                .expect("Invalid created payload"),
        ),
    )
}

pub fn referral_created_fixture(aggregate_id: &str, version: u64, email: &str) -> Event {
    event(
        aggregate_id,
        version,
        UserEvent::ReferralCreated(
            ReferralCreatedPayload::new(REFERRAL_ID_1, ALICE_CODE, email, ReferralStatus::Created)
                .expect("Invalid referral payload"),
        ),
    )
}

pub fn referral_completed_fixture(aggregate_id: &str, version: u64) -> Event {
    event(
        aggregate_id,
        version,
        UserEvent::ReferralCompleted(
            ReferralCompletedPayload::new(REFERRAL_ID_1).expect("Invalid completed payload"),
        ),
    )
}

pub fn points_earned_fixture(aggregate_id: &str, version: u64, points: u32) -> Event {
    event(
        aggregate_id,
        version,
        UserEvent::PointsEarned(PointsEarnedPayload::new(points).expect("Invalid points payload")),
    )
}

pub fn user_deleted_fixture(aggregate_id: &str, version: u64) -> Event {
    event(
        aggregate_id,
        version,
        UserEvent::Deleted(
            DeletedPayload::new(minutes_later(version as i64)).expect("Invalid deleted payload"),
        ),
    )
}

/// Alice's full lifecycle: sign-up, referral sent and completed, points
pub fn alice_history() -> Vec<Event> {
    vec![
        user_created_fixture(ALICE_ID, "alice", ALICE_CODE),
        referral_created_fixture(ALICE_ID, 2, "bob@example.com"),
        referral_completed_fixture(ALICE_ID, 3),
        points_earned_fixture(ALICE_ID, 4, 200),
    ]
}
