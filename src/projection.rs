// Copyright (c) 2025 - Cowboy AI, Inc.
//! Read Model Projection
//!
//! The query side of the system: a denormalized view of users kept current
//! by [`UserProjector`], which consumes published events from the bus.
//!
//! # Architecture
//!
//! ```text
//! EventBus ──> UserProjector ──> ReadRepo (users, referrals, points)
//!                   │                 ↑
//!                   └─ sync ─> EventStore::load_after(read model version)
//! ```
//!
//! # Ordering and Redelivery
//!
//! Every row carries the version of the last event projected into it.
//! Writes must carry exactly the next version:
//!
//! - an event at or below the stored version was already projected and is
//!   skipped by the projector
//! - an event further ahead fails with `EventOutOfOrder`, which the bus
//!   retries until the missing events have been projected
//!
//! Delivery is at-least-once, so this makes the projection idempotent.

pub mod memory;
pub mod projector;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Referral, ReferralStatus};
use crate::errors::EventSourceResult;

pub use memory::InMemoryReadRepo;
pub use projector::UserProjector;

/// Query-side view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub points: u32,
    pub referral_code: String,
    pub referred_by_code: Option<String>,
    pub referrals: Vec<Referral>,

    /// Version of the last event projected into this row
    pub version: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Read model storage
///
/// Versioned writes fail with `AggregateNotFound` for an unknown user and
/// with `EventOutOfOrder` unless `version` is the stored version + 1.
#[async_trait]
pub trait ReadRepo: Send + Sync {
    async fn create_user(&self, user: UserDto) -> EventSourceResult<()>;

    async fn delete_user(
        &self,
        user_id: &str,
        deleted_at: DateTime<Utc>,
        version: u64,
    ) -> EventSourceResult<()>;

    async fn create_referral(
        &self,
        user_id: &str,
        referral: Referral,
        version: u64,
    ) -> EventSourceResult<()>;

    async fn update_referral_status(
        &self,
        user_id: &str,
        referral_id: &str,
        status: ReferralStatus,
        version: u64,
    ) -> EventSourceResult<()>;

    async fn earn_points(&self, user_id: &str, points: u32, version: u64)
        -> EventSourceResult<()>;

    /// All users that are not deleted
    async fn users(&self) -> EventSourceResult<Vec<UserDto>>;

    /// A single user row, deleted or not
    async fn user(&self, user_id: &str) -> EventSourceResult<UserDto>;

    async fn referrals(&self, user_id: &str) -> EventSourceResult<Vec<Referral>>;

    /// The active user owning a referral code
    async fn user_by_referral_code(&self, referral_code: &str) -> EventSourceResult<UserDto>;
}
