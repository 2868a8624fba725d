// Copyright (c) 2025 - Cowboy AI, Inc.
//! User Aggregate
//!
//! State is the left fold of appliers over the user's history. Each event
//! type has exactly one applier; an applier validates its payload before it
//! touches the aggregate and advances `version` only once the mutation has
//! succeeded.
//!
//! ```text
//! History [e1, e2, e3] ──get_applier──> [a1, a2, a3] ──fold──> User { version: 3 }
//! ```
//!
//! A failed fold leaves the aggregate partially applied. Callers throw it
//! away; the repository never hands one out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{EventSourceError, EventSourceResult};
use crate::events::{Event, EventType, History, ReferralStatus, UserEvent};

/// Referral embedded in the referring user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub id: String,
    pub referral_code: String,
    pub referred_user_email: String,
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account state of one loyalty program member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    /// Version of the last applied event, 0 before any
    pub version: u64,

    pub username: String,
    pub email: String,

    /// Running total, only ever added to
    pub points: u32,

    pub referral_code: Option<String>,
    pub referred_by_code: Option<String>,
    pub referrals: Vec<Referral>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,

    /// Soft delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Empty aggregate at version 0
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: 0,
            username: String::new(),
            email: String::new(),
            points: 0,
            referral_code: None,
            referred_by_code: None,
            referrals: Vec::new(),
            created_at: None,
            updated_at: None,
            deleted_at: None,
        }
    }

    /// Replay a history onto this aggregate in ascending version order
    ///
    /// Stops at the first event that fails to apply.
    pub fn apply(&mut self, history: &History) -> EventSourceResult<()> {
        let mut ordered: Vec<&Event> = history.iter().collect();
        ordered.sort_by_key(|event| event.version);
        for event in ordered {
            get_applier(event)?.apply(self)?;
        }
        Ok(())
    }

    /// Build a fresh aggregate from its history
    pub fn from_history(id: impl Into<String>, history: &History) -> EventSourceResult<Self> {
        let mut user = Self::new(id);
        user.apply(history)?;
        Ok(user)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Referral sent to `email`, if any
    pub fn find_referral(&self, email: &str) -> Option<&Referral> {
        self.referrals
            .iter()
            .rev()
            .find(|referral| referral.referred_user_email == email)
    }
}

/// Decoded event ready to mutate a [`User`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applier {
    aggregate_id: String,
    version: u64,
    event_at: DateTime<Utc>,
    change: UserEvent,
}

/// Look up and prepare the applier for an event
///
/// Fails with `InvalidPayload` when the payload does not decode or misses a
/// required field.
pub fn get_applier(event: &Event) -> EventSourceResult<Applier> {
    Ok(Applier {
        aggregate_id: event.aggregate_id.clone(),
        version: event.version,
        event_at: event.event_at,
        change: event.decode()?,
    })
}

impl Applier {
    pub fn event_type(&self) -> EventType {
        self.change.event_type()
    }

    pub fn change(&self) -> &UserEvent {
        &self.change
    }

    fn invalid(&self, reason: impl Into<String>) -> EventSourceError {
        EventSourceError::InvalidPayload {
            aggregate_id: self.aggregate_id.clone(),
            event_type: self.event_type(),
            reason: reason.into(),
        }
    }

    /// Apply the change, then advance the aggregate version
    pub fn apply(self, user: &mut User) -> EventSourceResult<()> {
        match &self.change {
            UserEvent::Created(p) => {
                user.username = p.username.clone();
                user.email = p.email.clone();
                user.referral_code = Some(p.referral_code.clone());
                user.referred_by_code = p.referred_by_code.clone();
                user.created_at = Some(self.event_at);
            }
            UserEvent::Deleted(p) => {
                user.deleted_at = Some(p.deleted_at);
            }
            UserEvent::ReferralCreated(p) => {
                user.referrals.push(Referral {
                    id: p.referral_id.clone(),
                    referral_code: p.referral_code.clone(),
                    referred_user_email: p.referred_user_email.clone(),
                    status: p.referral_status,
                    created_at: self.event_at,
                    updated_at: self.event_at,
                });
            }
            UserEvent::ReferralCompleted(p) => {
                let referral = user
                    .referrals
                    .iter_mut()
                    .find(|referral| referral.id == p.referral_id)
                    .ok_or_else(|| self.invalid(format!("unknown referral {}", p.referral_id)))?;
                referral.status = ReferralStatus::Completed;
                referral.updated_at = self.event_at;
            }
            UserEvent::PointsEarned(p) => {
                user.points = user
                    .points
                    .checked_add(p.points_earned)
                    .ok_or_else(|| self.invalid("points balance overflow"))?;
            }
        }

        user.updated_at = Some(self.event_at);
        user.version = self.version;
        Ok(())
    }
}
