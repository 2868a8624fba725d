// Copyright (c) 2025 - Cowboy AI, Inc.
//! Domain Events
//!
//! Events are immutable, versioned facts about a single aggregate. The
//! runtime moves them around as [`Event`] values whose payload is kept in
//! serialized form; [`user::UserEvent`] is the typed view used by appliers,
//! projections and sagas.
//!
//! # Event Flow
//!
//! ```text
//! Command → rules → Event → EventStore (EventRecord rows)
//!                     ↓
//!                 EventBus → projector / saga
//! ```
//!
//! # Versioning
//!
//! For one aggregate, versions start at 1 and increase by one with no gaps.
//! Version order is replay order.
//!
//! # Storage Edge
//!
//! [`EventRecord`] is the all-string row an event store persists. Turning a
//! row back into an [`Event`] is where unknown type tags are rejected.

pub mod user;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{EventSourceError, EventSourceResult};

pub use user::{
    CreatedPayload, DeletedPayload, PayloadError, PointsEarnedPayload, ReferralCompletedPayload,
    ReferralCreatedPayload, ReferralStatus, UserEvent,
};

/// Discriminant tag for every event kind the runtime knows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventType {
    UserCreated,
    UserDeleted,
    UserReferralCreated,
    UserReferralCompleted,
    PointsEarned,
}

impl EventType {
    /// All event types, in declaration order
    pub const ALL: [EventType; 5] = [
        EventType::UserCreated,
        EventType::UserDeleted,
        EventType::UserReferralCreated,
        EventType::UserReferralCompleted,
        EventType::PointsEarned,
    ];

    /// Wire name stored with each event
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::UserCreated => "UserCreated",
            EventType::UserDeleted => "UserDeleted",
            EventType::UserReferralCreated => "UserReferralCreated",
            EventType::UserReferralCompleted => "UserReferralCompleted",
            EventType::PointsEarned => "PointsEarned",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = EventSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|event_type| event_type.as_str() == s)
            .ok_or_else(|| EventSourceError::UnknownEventType(s.to_string()))
    }
}

/// An immutable fact about one aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Aggregate the event belongs to
    pub aggregate_id: String,

    /// Kind of fact
    pub event_type: EventType,

    /// Position in the aggregate's stream, starting at 1
    pub version: u64,

    /// When the event was produced
    pub event_at: DateTime<Utc>,

    /// Serialized JSON payload
    pub payload: Option<String>,
}

impl Event {
    /// Build an event from a typed payload, stamping `event_at`
    pub fn from_payload(
        aggregate_id: impl Into<String>,
        version: u64,
        payload: &UserEvent,
        event_at: DateTime<Utc>,
    ) -> Result<Self, PayloadError> {
        Ok(Self {
            aggregate_id: aggregate_id.into(),
            event_type: payload.event_type(),
            version,
            event_at,
            payload: Some(payload.encode()?),
        })
    }

    /// Decode and validate the typed payload
    pub fn decode(&self) -> EventSourceResult<UserEvent> {
        UserEvent::decode(self.event_type, self.payload.as_deref()).map_err(|err| {
            EventSourceError::InvalidPayload {
                aggregate_id: self.aggregate_id.clone(),
                event_type: self.event_type,
                reason: err.to_string(),
            }
        })
    }
}

/// Ordered event stream of a single aggregate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History(Vec<Event>);

impl History {
    pub fn new(events: Vec<Event>) -> Self {
        Self(events)
    }

    /// Same events, ascending by version
    pub fn sorted(mut self) -> Self {
        self.0.sort_by_key(|event| event.version);
        self
    }

    /// Version of the last event, 0 when empty
    pub fn last_version(&self) -> u64 {
        self.0.last().map(|event| event.version).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<Event> {
        self.0
    }
}

impl From<Vec<Event>> for History {
    fn from(events: Vec<Event>) -> Self {
        Self(events)
    }
}

impl IntoIterator for History {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Persisted form of an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub aggregate_id: String,
    pub event_type: String,
    pub version: u64,
    pub event_at: DateTime<Utc>,
    pub payload: Option<String>,
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        Self {
            aggregate_id: event.aggregate_id.clone(),
            event_type: event.event_type.as_str().to_string(),
            version: event.version,
            event_at: event.event_at,
            payload: event.payload.clone(),
        }
    }
}

impl TryFrom<EventRecord> for Event {
    type Error = EventSourceError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            event_type: record.event_type.parse()?,
            aggregate_id: record.aggregate_id,
            version: record.version,
            event_at: record.event_at,
            payload: record.payload,
        })
    }
}
