// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory event store
//!
//! Rows are kept in their persisted [`EventRecord`] form so that loading goes
//! through the same decoding edge as a durable store would.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::EventStore;
use crate::errors::{EventSourceError, EventSourceResult};
use crate::events::{Event, EventRecord, History};

/// Event store backed by a map of aggregate id to rows
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    streams: RwLock<HashMap<String, Vec<EventRecord>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw rows, bypassing version checks
    pub fn with_records(records: impl IntoIterator<Item = EventRecord>) -> Self {
        let mut streams: HashMap<String, Vec<EventRecord>> = HashMap::new();
        for record in records {
            streams
                .entry(record.aggregate_id.clone())
                .or_default()
                .push(record);
        }
        for rows in streams.values_mut() {
            rows.sort_by_key(|row| row.version);
        }
        Self {
            streams: RwLock::new(streams),
        }
    }

    /// Number of rows stored for an aggregate
    pub async fn stream_len(&self, aggregate_id: &str) -> usize {
        self.streams
            .read()
            .await
            .get(aggregate_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn decode(rows: &[EventRecord]) -> EventSourceResult<History> {
        let events = rows
            .iter()
            .cloned()
            .map(Event::try_from)
            .collect::<EventSourceResult<Vec<_>>>()?;
        Ok(History::new(events))
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn save(&self, events: &[Event]) -> EventSourceResult<()> {
        let first = events
            .first()
            .ok_or_else(|| EventSourceError::Store("cannot save an empty batch".to_string()))?;
        let aggregate_id = first.aggregate_id.as_str();
        if events.iter().any(|e| e.aggregate_id != aggregate_id) {
            return Err(EventSourceError::Store(format!(
                "batch for {aggregate_id} contains events of other aggregates"
            )));
        }

        let mut streams = self.streams.write().await;
        let current = streams
            .get(aggregate_id)
            .and_then(|rows| rows.last())
            .map(|row| row.version)
            .unwrap_or(0);

        // Compare-and-swap: every event must take the next free version.
        for (offset, event) in events.iter().enumerate() {
            let expected = current + 1 + offset as u64;
            if event.version != expected {
                return Err(EventSourceError::ConcurrencyConflict {
                    aggregate_id: aggregate_id.to_string(),
                    expected,
                    actual: event.version,
                });
            }
        }

        streams
            .entry(aggregate_id.to_string())
            .or_default()
            .extend(events.iter().map(EventRecord::from));
        debug!(
            aggregate_id = %aggregate_id,
            count = events.len(),
            version = current + events.len() as u64,
            "Stored events"
        );
        Ok(())
    }

    async fn load(&self, aggregate_id: &str) -> EventSourceResult<History> {
        self.load_after(aggregate_id, 0).await
    }

    async fn load_after(
        &self,
        aggregate_id: &str,
        after_version: u64,
    ) -> EventSourceResult<History> {
        let streams = self.streams.read().await;
        let rows: Vec<EventRecord> = streams
            .get(aggregate_id)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.version > after_version)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Self::decode(&rows)
    }
}
