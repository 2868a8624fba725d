// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer
//!
//! Command handlers that coordinate the pure aggregate rules with the
//! repository and the event bus.
//!
//! ```text
//! CommandDispatcher
//!     ↓
//! UserCommandHandler → handle_*(User, Command) → Events
//!     ↓
//! EventRepo::apply (optimistic concurrency)
//!     ↓
//! EventBus::publish → projector, saga
//! ```

pub mod user;

pub use user::{generate_referral_code, UserCommandHandler};
