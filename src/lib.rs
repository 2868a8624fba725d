// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event-sourced loyalty program
//!
//! Users sign up, refer each other and earn points. Every state change is an
//! immutable event; the write side rebuilds aggregates by replay and guards
//! appends with an optimistic version check, the read side is a projection
//! fed by the event bus.
//!
//! ```text
//! Command → CommandDispatcher → UserCommandHandler → EventRepo (append)
//!                                       ↓
//!                                   EventBus → UserProjector → ReadRepo
//!                                       ↓
//!                                  ReferralSaga → CommandDispatcher
//! ```

pub mod aggregate;
pub mod bus;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod event_store;
pub mod events;
pub mod points;
pub mod projection;
pub mod repository;
pub mod runtime;
pub mod saga;
pub mod service;

// Re-export commonly used types
pub use aggregate::{Command, CommandKind, User};
pub use bus::{EventBus, EventHandler};
pub use config::EventBusConfig;
pub use dispatcher::{CommandDispatcher, CommandHandler, Dispatch};
pub use errors::{EventSourceError, EventSourceResult};
pub use event_store::{EventStore, InMemoryEventStore};
pub use events::{Event, EventType, History};
pub use points::{PointsAction, PointsMappingService};
pub use projection::{InMemoryReadRepo, ReadRepo, UserDto, UserProjector};
pub use repository::{EventRepo, EventRepository};
pub use runtime::LoyaltyRuntime;
pub use saga::ReferralSaga;
pub use service::UserCommandHandler;
