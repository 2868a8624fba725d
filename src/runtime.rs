// Copyright (c) 2025 - Cowboy AI, Inc.
//! Runtime wiring
//!
//! Builds the in-memory object graph:
//!
//! ```text
//! CommandDispatcher ──> UserCommandHandler ──> EventRepository ──> InMemoryEventStore
//!        ↑                      │
//!        │                      └──> EventBus ──┬──> UserProjector ──> InMemoryReadRepo
//!        └──────────────────────────────────────┴──> ReferralSaga
//! ```
//!
//! The saga dispatches back through the dispatcher, so the graph holds a
//! reference cycle and lives as long as the process.

use std::sync::Arc;

use tracing::info;

use crate::aggregate::Command;
use crate::bus::EventBus;
use crate::config::EventBusConfig;
use crate::dispatcher::{CommandDispatcher, Dispatch};
use crate::errors::EventSourceResult;
use crate::event_store::{EventStore, InMemoryEventStore};
use crate::points::PointsMappingService;
use crate::projection::{InMemoryReadRepo, ReadRepo, UserProjector};
use crate::repository::EventRepository;
use crate::saga::ReferralSaga;
use crate::service::UserCommandHandler;

/// Fully wired loyalty runtime
pub struct LoyaltyRuntime {
    pub dispatcher: Arc<CommandDispatcher>,
    pub bus: Arc<EventBus>,
    pub repository: Arc<EventRepository>,
    pub read_repo: Arc<dyn ReadRepo>,
}

impl LoyaltyRuntime {
    /// Wire every component over in-memory storage
    pub fn in_memory(config: EventBusConfig) -> Self {
        Self::with_storage(
            config,
            Arc::new(InMemoryEventStore::new()),
            Arc::new(InMemoryReadRepo::new()),
        )
    }

    /// Wire every component over the given storage
    pub fn with_storage(
        config: EventBusConfig,
        store: Arc<dyn EventStore>,
        read_repo: Arc<dyn ReadRepo>,
    ) -> Self {
        let repository = Arc::new(EventRepository::new(Arc::clone(&store)));
        let bus = Arc::new(EventBus::new(config));
        let dispatcher = Arc::new(CommandDispatcher::new());

        dispatcher.register_handler(Arc::new(UserCommandHandler::new(
            repository.clone(),
            bus.clone(),
        )));
        bus.register_handler(Arc::new(UserProjector::new(read_repo.clone(), store)));
        bus.register_handler(Arc::new(ReferralSaga::new(
            dispatcher.clone(),
            read_repo.clone(),
            PointsMappingService::new(),
        )));

        info!("Loyalty runtime wired");
        Self {
            dispatcher,
            bus,
            repository,
            read_repo,
        }
    }

    pub async fn dispatch(&self, command: impl Into<Command>) -> EventSourceResult<()> {
        self.dispatcher.dispatch(command.into()).await
    }
}
