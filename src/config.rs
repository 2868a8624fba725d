// Copyright (c) 2025 - Cowboy AI, Inc.
//! Runtime configuration
//!
//! Event bus backoff tuning and tracing bootstrap. Values come from the
//! environment with defaults for anything unset.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::errors::{EventSourceError, EventSourceResult};

/// Initial backoff interval, milliseconds
pub const ENV_INITIAL_INTERVAL: &str = "EVENT_BUS_BACKOFF_INITIAL_INTERVAL";
/// Retry window measured from the first attempt, milliseconds
pub const ENV_MAX_ELAPSED_TIME: &str = "EVENT_BUS_BACKOFF_MAX_ELAPSED_TIME";
/// Retries after the first attempt
pub const ENV_MAX_RETRY: &str = "EVENT_BUS_BACKOFF_MAX_RETRY";

/// Backoff policy applied to every event handler invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBusConfig {
    /// Delay before the first retry; doubles on each subsequent retry
    pub initial_interval: Duration,

    /// No retry starts once this much time has passed since the first attempt
    pub max_elapsed_time: Duration,

    /// Retries allowed after the first attempt
    pub max_retry: usize,
}

impl EventBusConfig {
    /// Create a configuration with explicit values
    pub fn new(initial_interval: Duration, max_elapsed_time: Duration, max_retry: usize) -> Self {
        Self {
            initial_interval,
            max_elapsed_time,
            max_retry,
        }
    }

    /// Read the configuration from process environment variables
    pub fn from_env() -> EventSourceResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> EventSourceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let initial_interval = match lookup(ENV_INITIAL_INTERVAL) {
            Some(raw) => Duration::from_millis(parse_number(ENV_INITIAL_INTERVAL, &raw)?),
            None => defaults.initial_interval,
        };
        let max_elapsed_time = match lookup(ENV_MAX_ELAPSED_TIME) {
            Some(raw) => Duration::from_millis(parse_number(ENV_MAX_ELAPSED_TIME, &raw)?),
            None => defaults.max_elapsed_time,
        };
        let max_retry = match lookup(ENV_MAX_RETRY) {
            Some(raw) => parse_number(ENV_MAX_RETRY, &raw)? as usize,
            None => defaults.max_retry,
        };

        Ok(Self {
            initial_interval,
            max_elapsed_time,
            max_retry,
        })
    }

    /// Set the initial interval
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    /// Set the maximum elapsed time
    pub fn with_max_elapsed_time(mut self, max_elapsed_time: Duration) -> Self {
        self.max_elapsed_time = max_elapsed_time;
        self
    }

    /// Set the retry count
    pub fn with_max_retry(mut self, max_retry: usize) -> Self {
        self.max_retry = max_retry;
        self
    }
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(100),
            max_elapsed_time: Duration::from_millis(500),
            max_retry: 3,
        }
    }
}

fn parse_number(key: &str, raw: &str) -> EventSourceResult<u64> {
    raw.trim().parse::<u64>().map_err(|err| {
        EventSourceError::Configuration(format!("{key}={raw:?} is not a whole number: {err}"))
    })
}

/// Install the global fmt subscriber, filtered by `RUST_LOG` (default `info`)
///
/// Calling this more than once keeps the first subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
