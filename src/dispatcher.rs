// Copyright (c) 2025 - Cowboy AI, Inc.
//! Command dispatcher
//!
//! Routes each [`Command`] to the handler registered for its [`CommandKind`].
//! Dispatch is a single blocking call: no queue, no worker pool. Concurrent
//! commands against one aggregate are reconciled by the repository's version
//! check, not here.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::aggregate::{Command, CommandKind};
use crate::errors::{EventSourceError, EventSourceResult};

/// Domain logic for one or more command kinds
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Kinds this handler is registered under
    fn commands_handled(&self) -> Vec<CommandKind>;

    /// Validate, persist and publish
    async fn handle(&self, command: &Command) -> EventSourceResult<()>;
}

/// Anything commands can be sent through
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(&self, command: Command) -> EventSourceResult<()>;
}

/// Registration table from command kind to handler
#[derive(Default)]
pub struct CommandDispatcher {
    handlers: RwLock<HashMap<CommandKind, Arc<dyn CommandHandler>>>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the handler under every kind it declares
    ///
    /// A later registration for the same kind replaces the earlier one.
    pub fn register_handler(&self, handler: Arc<dyn CommandHandler>) {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        for kind in handler.commands_handled() {
            if handlers.insert(kind, Arc::clone(&handler)).is_some() {
                warn!(command = %kind, "Replacing command handler");
            }
        }
    }

    fn handler_for(&self, kind: CommandKind) -> Option<Arc<dyn CommandHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
    }
}

#[async_trait]
impl Dispatch for CommandDispatcher {
    #[instrument(
        skip(self, command),
        fields(command = %command.kind(), aggregate_id = %command.aggregate_id())
    )]
    async fn dispatch(&self, command: Command) -> EventSourceResult<()> {
        if command.aggregate_id().trim().is_empty() {
            return Err(EventSourceError::BlankAggregateId);
        }

        let kind = command.kind();
        let handler = self
            .handler_for(kind)
            .ok_or(EventSourceError::NoHandlerRegistered(kind))?;

        debug!("Dispatching command");
        handler
            .handle(&command)
            .await
            .map_err(|err| EventSourceError::Dispatch {
                command: kind,
                aggregate_id: command.aggregate_id().to_string(),
                source: Box::new(err),
            })
    }
}
