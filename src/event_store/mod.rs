// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Store Abstraction
//!
//! Append-only, per-aggregate ordered persistence of events. The repository
//! computes versions and timestamps before calling [`EventStore::save`]; the
//! store only has to keep batches atomic and streams contiguous.
//!
//! # Architecture
//!
//! ```text
//! CommandHandler → EventRepo → EventStore → rows per aggregate
//!                                  ↑
//!                           UserProjector::sync
//! ```
//!
//! # Store Requirements
//!
//! 1. **Append-Only**: Events are never updated or deleted
//! 2. **Ordered**: `load` returns events ascending by version
//! 3. **Atomic**: A batch is written completely or not at all
//! 4. **Conditional**: A batch that does not continue the stream is rejected
//!
//! The last point closes the race between two writers that computed the same
//! next version. Without it the version check in the repository is only a
//! read-then-write.

use async_trait::async_trait;

use crate::errors::EventSourceResult;
use crate::events::{Event, History};

pub mod memory;

pub use memory::InMemoryEventStore;

/// Durable event persistence
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist a batch of events for one aggregate
    ///
    /// # Errors
    ///
    /// - `ConcurrencyConflict` if the batch does not start right after the
    ///   stored version or is not contiguous
    /// - `Store` if the batch is empty, mixes aggregates or the write fails
    async fn save(&self, events: &[Event]) -> EventSourceResult<()>;

    /// Full history of an aggregate, ascending by version
    ///
    /// An unknown aggregate yields an empty history.
    async fn load(&self, aggregate_id: &str) -> EventSourceResult<History>;

    /// Events with a version strictly greater than `after_version`
    async fn load_after(&self, aggregate_id: &str, after_version: u64)
        -> EventSourceResult<History>;
}
