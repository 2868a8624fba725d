// Copyright (c) 2025 - Cowboy AI, Inc.
//! Commands for the User Aggregate
//!
//! Commands express intent and can be rejected. Each one targets exactly
//! one aggregate through [`Command::aggregate_id`]; [`CommandKind`] is the
//! tag handlers register under.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discriminant tag for command routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    CreateUser,
    DeleteUser,
    CreateReferral,
    CompleteReferral,
    EarnPoints,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::CreateUser => "CreateUser",
            CommandKind::DeleteUser => "DeleteUser",
            CommandKind::CreateReferral => "CreateReferral",
            CommandKind::CompleteReferral => "CompleteReferral",
            CommandKind::EarnPoints => "EarnPoints",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Register a new user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub user_id: String,
    pub username: String,
    pub email: String,

    /// Referral code of the user who invited this one
    #[serde(default)]
    pub referred_by_code: Option<String>,
}

/// Soft-delete a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUser {
    pub user_id: String,
}

/// Invite someone by email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReferral {
    pub user_id: String,
    pub referred_user_email: String,
}

/// Mark a referral as completed on the referring user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteReferral {
    /// The referrer
    pub user_id: String,

    /// The newly signed up user
    pub referred_user_id: String,
    pub referred_user_email: String,

    /// Code the new user signed up with; must be the referrer's own
    pub referred_by_code: String,
}

/// Add points to a user's balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnPoints {
    pub user_id: String,
    pub points: u32,
}

/// Every command the runtime routes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    CreateUser(CreateUser),
    DeleteUser(DeleteUser),
    CreateReferral(CreateReferral),
    CompleteReferral(CompleteReferral),
    EarnPoints(EarnPoints),
}

impl Command {
    /// Aggregate the command targets
    pub fn aggregate_id(&self) -> &str {
        match self {
            Command::CreateUser(c) => &c.user_id,
            Command::DeleteUser(c) => &c.user_id,
            Command::CreateReferral(c) => &c.user_id,
            Command::CompleteReferral(c) => &c.user_id,
            Command::EarnPoints(c) => &c.user_id,
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::CreateUser(_) => CommandKind::CreateUser,
            Command::DeleteUser(_) => CommandKind::DeleteUser,
            Command::CreateReferral(_) => CommandKind::CreateReferral,
            Command::CompleteReferral(_) => CommandKind::CompleteReferral,
            Command::EarnPoints(_) => CommandKind::EarnPoints,
        }
    }
}

impl From<CreateUser> for Command {
    fn from(command: CreateUser) -> Self {
        Command::CreateUser(command)
    }
}

impl From<DeleteUser> for Command {
    fn from(command: DeleteUser) -> Self {
        Command::DeleteUser(command)
    }
}

impl From<CreateReferral> for Command {
    fn from(command: CreateReferral) -> Self {
        Command::CreateReferral(command)
    }
}

impl From<CompleteReferral> for Command {
    fn from(command: CompleteReferral) -> Self {
        Command::CompleteReferral(command)
    }
}

impl From<EarnPoints> for Command {
    fn from(command: EarnPoints) -> Self {
        Command::EarnPoints(command)
    }
}
