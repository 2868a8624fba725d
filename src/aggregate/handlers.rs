// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Command Handlers for the User Aggregate
//!
//! Each handler takes the current state plus a command and returns the
//! events to persist, or the rule that rejected it.
//!
//! ```text
//! handle_command(&User, &Command, ids, now) → Result<Vec<Event>, CommandError>
//! ```
//!
//! Handlers do no I/O. Time and freshly generated identifiers arrive as
//! parameters, so the same inputs always produce the same events.

use chrono::{DateTime, Utc};

use crate::aggregate::commands::*;
use crate::aggregate::user::User;
use crate::events::{
    CreatedPayload, DeletedPayload, Event, PayloadError, PointsEarnedPayload,
    ReferralCompletedPayload, ReferralCreatedPayload, ReferralStatus, UserEvent,
};

/// Command rejected by a business rule
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Required field missing or blank
    #[error("{0}")]
    Validation(String),

    /// User is soft-deleted
    #[error("user {0} is already deleted")]
    AlreadyDeleted(String),

    /// User has no code to refer others with
    #[error("user {0} does not have a referral code")]
    MissingReferralCode(String),

    /// Sign-up code does not belong to the referrer
    #[error("referred-by code {actual} does not match referral code {expected:?}")]
    ReferralCodeMismatch {
        expected: Option<String>,
        actual: String,
    },

    /// Event payload could not be built
    #[error("invalid event payload: {0}")]
    Payload(#[from] PayloadError),
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn ensure_active(user: &User) -> Result<(), CommandError> {
    if user.is_deleted() {
        return Err(CommandError::AlreadyDeleted(user.id.clone()));
    }
    Ok(())
}

fn next_event(user: &User, change: UserEvent, now: DateTime<Utc>) -> Result<Event, CommandError> {
    Ok(Event::from_payload(user.id.clone(), user.version + 1, &change, now)?)
}

/// Handle CreateUser
///
/// Always emits version 1. A second CreateUser for the same id is caught by
/// the repository's version check, not here.
pub fn handle_create_user(
    command: &CreateUser,
    referral_code: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Event>, CommandError> {
    if blank(&command.username) || blank(&command.email) {
        return Err(CommandError::Validation(
            "email and username must be defined when creating user".to_string(),
        ));
    }

    let referred_by_code = command
        .referred_by_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string);

    let payload = CreatedPayload::new(
        command.username.trim(),
        command.email.trim(),
        referral_code,
        referred_by_code,
    )?;

    Ok(vec![Event::from_payload(
        command.user_id.clone(),
        1,
        &UserEvent::Created(payload),
        now,
    )?])
}

/// Handle DeleteUser
pub fn handle_delete_user(
    user: &User,
    _command: &DeleteUser,
    now: DateTime<Utc>,
) -> Result<Vec<Event>, CommandError> {
    ensure_active(user)?;
    let payload = DeletedPayload::new(now)?;
    Ok(vec![next_event(user, UserEvent::Deleted(payload), now)?])
}

/// Handle CreateReferral
pub fn handle_create_referral(
    user: &User,
    command: &CreateReferral,
    referral_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Event>, CommandError> {
    if blank(&command.referred_user_email) {
        return Err(CommandError::Validation(
            "referred user email must be defined when creating referral".to_string(),
        ));
    }
    ensure_active(user)?;
    let referral_code = user
        .referral_code
        .as_deref()
        .ok_or_else(|| CommandError::MissingReferralCode(user.id.clone()))?;

    let payload = ReferralCreatedPayload::new(
        referral_id,
        referral_code,
        command.referred_user_email.trim(),
        ReferralStatus::Created,
    )?;
    Ok(vec![next_event(user, UserEvent::ReferralCreated(payload), now)?])
}

/// Handle CompleteReferral against the referring user
///
/// Completes the referral sent to the referred email when one exists.
/// Otherwise the new user signed up with the code uninvited, and a single
/// referral already in `Completed` is recorded instead.
pub fn handle_complete_referral(
    user: &User,
    command: &CompleteReferral,
    new_referral_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Event>, CommandError> {
    if blank(&command.referred_user_id) {
        return Err(CommandError::Validation(
            "referred user id must be defined when completing referral".to_string(),
        ));
    }
    ensure_active(user)?;

    let referral_code = match user.referral_code.as_deref() {
        Some(code) if code == command.referred_by_code => code,
        other => {
            return Err(CommandError::ReferralCodeMismatch {
                expected: other.map(str::to_string),
                actual: command.referred_by_code.clone(),
            })
        }
    };

    let referred_user_email = command.referred_user_email.trim();
    let change = match user.find_referral(referred_user_email) {
        Some(referral) => {
            UserEvent::ReferralCompleted(ReferralCompletedPayload::new(referral.id.clone())?)
        }
        None => UserEvent::ReferralCreated(ReferralCreatedPayload::new(
            new_referral_id,
            referral_code,
            referred_user_email,
            ReferralStatus::Completed,
        )?),
    };

    Ok(vec![next_event(user, change, now)?])
}

/// Handle EarnPoints
pub fn handle_earn_points(
    user: &User,
    command: &EarnPoints,
    now: DateTime<Utc>,
) -> Result<Vec<Event>, CommandError> {
    if command.points == 0 {
        return Err(CommandError::Validation(
            "points must be greater than zero".to_string(),
        ));
    }
    ensure_active(user)?;
    let payload = PointsEarnedPayload::new(command.points)?;
    Ok(vec![next_event(user, UserEvent::PointsEarned(payload), now)?])
}
