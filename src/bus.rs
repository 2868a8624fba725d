// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Bus
//!
//! Fans published events out to every handler registered for their type.
//!
//! # Delivery
//!
//! ```text
//! publish([e1, e2, e3])
//!   e1 ──┬── projector (backoff) ──┐
//!        └── saga      (backoff) ──┴── all done? ── ok ──> e2 ...
//!                                              └─ failed ─> return, e2/e3 skipped
//! ```
//!
//! - Events are processed in order. Handlers of one event run concurrently;
//!   the next event starts only after all of them finished.
//! - Each handler invocation is retried with exponential backoff while its
//!   error is retryable, the retry count allows it and the elapsed time since
//!   the first attempt is below the configured maximum.
//! - The first terminal failure aborts the call. Already persisted events are
//!   not rolled back; the caller re-submits the batch.
//!
//! # Bootstrap
//!
//! Before a handler sees its first event for an aggregate, the bus calls
//! [`EventHandler::sync`] for that aggregate. Success is remembered per
//! registered handler and aggregate; a failed sync is retried with the event.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use futures::future::join_all;
use tracing::{debug, error, info, instrument, warn};

use crate::config::EventBusConfig;
use crate::errors::{EventSourceError, EventSourceResult};
use crate::events::{Event, EventType};

/// Consumer of published events
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Event types this handler is registered under
    fn event_types_handled(&self) -> Vec<EventType>;

    /// React to one event
    async fn handle(&self, event: &Event) -> EventSourceResult<()>;

    /// Catch up on an aggregate before its first live event
    async fn sync(&self, _aggregate_id: &str) -> EventSourceResult<()> {
        Ok(())
    }
}

/// A registered handler and the aggregates it has bootstrapped
struct Subscription {
    handler: Arc<dyn EventHandler>,
    synced: Mutex<HashSet<String>>,
}

impl Subscription {
    fn is_synced(&self, aggregate_id: &str) -> bool {
        self.synced
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(aggregate_id)
    }

    fn mark_synced(&self, aggregate_id: &str) {
        self.synced
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(aggregate_id.to_string());
    }

    async fn deliver(&self, event: &Event) -> EventSourceResult<()> {
        if !self.is_synced(&event.aggregate_id) {
            self.handler.sync(&event.aggregate_id).await?;
            self.mark_synced(&event.aggregate_id);
            debug!(
                handler = self.handler.name(),
                aggregate_id = %event.aggregate_id,
                "Handler synced"
            );
        }
        self.handler.handle(event).await
    }
}

/// In-process publish/subscribe with per-handler retry
pub struct EventBus {
    config: EventBusConfig,
    subscriptions: RwLock<HashMap<EventType, Vec<Arc<Subscription>>>>,
}

impl EventBus {
    pub fn new(config: EventBusConfig) -> Self {
        Self {
            config,
            subscriptions: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    /// Subscribe a handler to every event type it declares
    pub fn register_handler(&self, handler: Arc<dyn EventHandler>) {
        let subscription = Arc::new(Subscription {
            handler,
            synced: Mutex::new(HashSet::new()),
        });
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for event_type in subscription.handler.event_types_handled() {
            subscriptions
                .entry(event_type)
                .or_default()
                .push(Arc::clone(&subscription));
        }
        info!(handler = subscription.handler.name(), "Registered event handler");
    }

    /// Handlers currently registered for an event type
    pub fn handler_count(&self, event_type: EventType) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event_type)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn subscriptions_for(&self, event_type: EventType) -> Vec<Arc<Subscription>> {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event_type)
            .cloned()
            .unwrap_or_default()
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.config.initial_interval)
            .with_max_delay(self.config.max_elapsed_time.max(self.config.initial_interval))
            .with_max_times(self.config.max_retry)
    }

    /// Deliver events in order, stopping at the first terminal failure
    #[instrument(skip(self, events), fields(count = events.len()))]
    pub async fn publish(&self, events: &[Event]) -> EventSourceResult<()> {
        for event in events {
            if event.aggregate_id.trim().is_empty() {
                return Err(EventSourceError::BlankAggregateId);
            }

            let subscriptions = self.subscriptions_for(event.event_type);
            if subscriptions.is_empty() {
                return Err(EventSourceError::NoHandlersRegistered(event.event_type));
            }

            let results = join_all(
                subscriptions
                    .iter()
                    .map(|subscription| self.deliver_with_retry(subscription, event)),
            )
            .await;

            if let Some(err) = results.into_iter().find_map(Result::err) {
                return Err(err);
            }
        }
        Ok(())
    }

    async fn deliver_with_retry(
        &self,
        subscription: &Subscription,
        event: &Event,
    ) -> EventSourceResult<()> {
        let handler = subscription.handler.name().to_string();
        let started = Instant::now();
        let max_elapsed = self.config.max_elapsed_time;

        let outcome = (|| subscription.deliver(event))
            .retry(self.backoff())
            .when(|err: &EventSourceError| err.is_retryable() && started.elapsed() < max_elapsed)
            .notify(|err: &EventSourceError, delay: Duration| {
                warn!(
                    handler = %handler,
                    event_type = %event.event_type,
                    aggregate_id = %event.aggregate_id,
                    error = %err,
                    delay = ?delay,
                    "Retrying event handler"
                );
            })
            .await;

        match outcome {
            Ok(()) => {
                debug!(
                    handler = %handler,
                    event_type = %event.event_type,
                    aggregate_id = %event.aggregate_id,
                    version = event.version,
                    "Handled event"
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    handler = %handler,
                    event_type = %event.event_type,
                    aggregate_id = %event.aggregate_id,
                    error = %err,
                    "Event handler failed"
                );
                Err(EventSourceError::Publish {
                    handler,
                    event_type: event.event_type,
                    aggregate_id: event.aggregate_id.clone(),
                    source: Box::new(err),
                })
            }
        }
    }
}
