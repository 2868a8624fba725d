// Copyright (c) 2025 - Cowboy AI, Inc.
//! User Aggregate
//!
//! - Commands express intent ([`commands`])
//! - Pure handlers turn state + command into events ([`handlers`])
//! - Appliers fold events back into state ([`user`])
//!
//! # Event Sourcing Pattern
//!
//! ```text
//! Command → handle_*(User, Command) → Events → EventRepo
//!                                        ↓
//!                       get_applier(Event).apply(User)
//! ```

pub mod commands;
pub mod handlers;
pub mod user;

pub use commands::{
    Command, CommandKind, CompleteReferral, CreateReferral, CreateUser, DeleteUser, EarnPoints,
};
pub use handlers::*;
pub use user::{get_applier, Applier, Referral, User};

pub use crate::events::ReferralStatus;
