// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for the event sourcing runtime
//!
//! Command-path errors reach the dispatch caller synchronously; event-path
//! errors are retried by the bus and surface as [`EventSourceError::Publish`]
//! once a handler gives up. Wrapping variants keep the original cause as
//! their `source`, and the classification helpers look through them.

use thiserror::Error;

use crate::aggregate::commands::CommandKind;
use crate::aggregate::CommandError;
use crate::events::EventType;

/// Errors raised anywhere between command intake and event delivery
#[derive(Debug, Error)]
pub enum EventSourceError {
    /// Required command field missing or blank
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business rule rejected the command
    #[error("Command rejected: {0}")]
    Command(CommandError),

    /// Expected version did not match the persisted version
    #[error(
        "Concurrency conflict on aggregate {aggregate_id}: expected version {expected}, got {actual}"
    )]
    ConcurrencyConflict {
        aggregate_id: String,
        expected: u64,
        actual: u64,
    },

    /// No events exist for the aggregate
    #[error("Aggregate not found: {0}")]
    AggregateNotFound(String),

    /// Command or event carried an empty aggregate id
    #[error("Aggregate id must not be blank")]
    BlankAggregateId,

    /// Dispatcher has no handler for the command kind
    #[error("No command handler registered for {0}")]
    NoHandlerRegistered(CommandKind),

    /// Bus has no handler for the event type
    #[error("No event handlers registered for {0}")]
    NoHandlersRegistered(EventType),

    /// Event type tag is not one this runtime knows
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    /// Event payload missing, malformed or incomplete
    #[error("Invalid payload for {event_type} on aggregate {aggregate_id}: {reason}")]
    InvalidPayload {
        aggregate_id: String,
        event_type: EventType,
        reason: String,
    },

    /// Read model received an event ahead of its stored version
    #[error(
        "Event out of order for aggregate {aggregate_id}: read model at version {current}, got {received}"
    )]
    EventOutOfOrder {
        aggregate_id: String,
        current: u64,
        received: u64,
    },

    /// Points action has no mapping
    #[error("Points action not supported: {0}")]
    UnknownPointsAction(String),

    /// Configuration value could not be parsed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Event store failure
    #[error("Event store error: {0}")]
    Store(String),

    /// Read model failure
    #[error("Read model error: {0}")]
    ReadModel(String),

    /// Generic failure raised by an event handler
    #[error("Handler {handler} failed: {reason}")]
    HandlerFailure { handler: String, reason: String },

    /// Command handler failed; carries the command context
    #[error("Dispatching {command} for aggregate {aggregate_id} failed: {source}")]
    Dispatch {
        command: CommandKind,
        aggregate_id: String,
        #[source]
        source: Box<EventSourceError>,
    },

    /// Event handler exhausted its retry budget or failed terminally
    #[error("Publishing {event_type} for aggregate {aggregate_id} to {handler} failed: {source}")]
    Publish {
        handler: String,
        event_type: EventType,
        aggregate_id: String,
        #[source]
        source: Box<EventSourceError>,
    },
}

/// Result type for runtime operations
pub type EventSourceResult<T> = Result<T, EventSourceError>;

impl EventSourceError {
    /// Innermost error beneath dispatch/publish wrappers
    pub fn root(&self) -> &EventSourceError {
        match self {
            EventSourceError::Dispatch { source, .. }
            | EventSourceError::Publish { source, .. } => source.root(),
            other => other,
        }
    }

    /// The aggregate or one of its read-model rows does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), EventSourceError::AggregateNotFound(_))
    }

    /// A later attempt may succeed without the input changing
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.root(),
            EventSourceError::ConcurrencyConflict { .. }
                | EventSourceError::AggregateNotFound(_)
                | EventSourceError::EventOutOfOrder { .. }
                | EventSourceError::Store(_)
                | EventSourceError::ReadModel(_)
                | EventSourceError::HandlerFailure { .. }
        )
    }

    /// The input itself is wrong and retrying cannot help
    pub fn is_validation(&self) -> bool {
        matches!(
            self.root(),
            EventSourceError::Validation(_)
                | EventSourceError::Command(_)
                | EventSourceError::BlankAggregateId
                | EventSourceError::InvalidPayload { .. }
                | EventSourceError::UnknownEventType(_)
                | EventSourceError::UnknownPointsAction(_)
                | EventSourceError::Configuration(_)
        )
    }
}

impl From<CommandError> for EventSourceError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Validation(message) => EventSourceError::Validation(message),
            other => EventSourceError::Command(other),
        }
    }
}

impl From<serde_json::Error> for EventSourceError {
    fn from(err: serde_json::Error) -> Self {
        EventSourceError::Store(format!("serialization failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrapped(inner: EventSourceError) -> EventSourceError {
        EventSourceError::Dispatch {
            command: CommandKind::EarnPoints,
            aggregate_id: "user-1".to_string(),
            source: Box::new(EventSourceError::Publish {
                handler: "saga".to_string(),
                event_type: EventType::UserCreated,
                aggregate_id: "user-1".to_string(),
                source: Box::new(inner),
            }),
        }
    }

    #[test]
    fn test_classification_sees_through_wrappers() {
        let err = wrapped(EventSourceError::AggregateNotFound("user-1".to_string()));
        assert!(err.is_not_found());
        assert!(err.is_retryable());
        assert!(!err.is_validation());

        let err = wrapped(EventSourceError::Validation("email".to_string()));
        assert!(err.is_validation());
        assert!(!err.is_retryable());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_command_validation_maps_to_validation_kind() {
        let err: EventSourceError = CommandError::Validation("email is blank".to_string()).into();
        assert!(matches!(err, EventSourceError::Validation(_)));

        let err: EventSourceError = CommandError::AlreadyDeleted("user-1".to_string()).into();
        assert!(matches!(err, EventSourceError::Command(CommandError::AlreadyDeleted(_))));
        assert!(err.is_validation());
    }

    #[test]
    fn test_concurrency_conflict_is_retryable() {
        let err = EventSourceError::ConcurrencyConflict {
            aggregate_id: "user-1".to_string(),
            expected: 2,
            actual: 1,
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("expected version 2"));
    }

    #[test]
    fn test_dispatch_message_names_command_and_aggregate() {
        let err = EventSourceError::Dispatch {
            command: CommandKind::DeleteUser,
            aggregate_id: "user-9".to_string(),
            source: Box::new(EventSourceError::BlankAggregateId),
        };
        let message = err.to_string();
        assert!(message.contains("DeleteUser"));
        assert!(message.contains("user-9"));
    }
}
