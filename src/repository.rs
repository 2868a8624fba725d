// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event repository
//!
//! Owns the transition between persisted history and in-memory aggregates.
//! Every load replays into a fresh [`User`]; nothing is cached.
//!
//! # Optimistic Concurrency
//!
//! ```text
//! apply([e5, e6]) → current = store version (0 if none)
//!                 → e5.version == current + 1 ?  ── no ──> ConcurrencyConflict
//!                 → store.save([e5, e6])   (all or nothing)
//! ```
//!
//! No lock is held between reading the current version and saving. Racing
//! writers are separated by the store's conditional write.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::aggregate::User;
use crate::errors::{EventSourceError, EventSourceResult};
use crate::event_store::EventStore;
use crate::events::Event;

/// Outcome of a successful apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub aggregate_id: String,
    pub version: u64,
}

/// Loads aggregates and persists new events
#[async_trait]
pub trait EventRepo: Send + Sync {
    /// Rebuild the aggregate from its full history
    ///
    /// Fails with `AggregateNotFound` when it has no events.
    async fn load(&self, aggregate_id: &str) -> EventSourceResult<User>;

    /// Persist a batch after the expected-version check
    async fn apply(&self, events: Vec<Event>) -> EventSourceResult<Applied>;
}

/// [`EventRepo`] over any [`EventStore`]
#[derive(Clone)]
pub struct EventRepository {
    store: Arc<dyn EventStore>,
}

impl EventRepository {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn EventStore> {
        Arc::clone(&self.store)
    }

    async fn current_version(&self, aggregate_id: &str) -> EventSourceResult<u64> {
        match self.load(aggregate_id).await {
            Ok(user) => Ok(user.version),
            Err(err) if err.is_not_found() => Ok(0),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl EventRepo for EventRepository {
    async fn load(&self, aggregate_id: &str) -> EventSourceResult<User> {
        let history = self.store.load(aggregate_id).await?.sorted();
        if history.is_empty() {
            return Err(EventSourceError::AggregateNotFound(aggregate_id.to_string()));
        }
        User::from_history(aggregate_id, &history)
    }

    #[instrument(skip(self, events), fields(count = events.len()))]
    async fn apply(&self, mut events: Vec<Event>) -> EventSourceResult<Applied> {
        let started = Instant::now();
        events.sort_by_key(|event| event.version);

        let first = events.first().ok_or_else(|| {
            EventSourceError::Validation("cannot apply an empty event batch".to_string())
        })?;
        let aggregate_id = first.aggregate_id.clone();
        if aggregate_id.trim().is_empty() {
            return Err(EventSourceError::BlankAggregateId);
        }
        if let Some(stray) = events.iter().find(|event| event.aggregate_id != aggregate_id) {
            return Err(EventSourceError::Validation(format!(
                "event batch for {aggregate_id} contains an event for {}",
                stray.aggregate_id
            )));
        }

        let current = self.current_version(&aggregate_id).await?;
        if first.version != current + 1 {
            return Err(EventSourceError::ConcurrencyConflict {
                aggregate_id,
                expected: current + 1,
                actual: first.version,
            });
        }

        self.store.save(&events).await?;

        let version = events.last().map(|event| event.version).unwrap_or(current);
        info!(
            aggregate_id = %aggregate_id,
            count = events.len(),
            version,
            elapsed = ?started.elapsed(),
            "Saved events"
        );
        Ok(Applied {
            aggregate_id,
            version,
        })
    }
}
