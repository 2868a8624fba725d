// Copyright (c) 2025 - Cowboy AI, Inc.
//! User Domain Events
//!
//! One payload struct per event type, serialized as camelCase JSON. Every
//! payload validates its required fields both when constructed and when
//! decoded from storage.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::EventType;

/// Payload validation and decoding failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("event missing payload")]
    Missing,

    #[error("required field {0} is blank")]
    BlankField(&'static str),

    #[error("points earned must be greater than zero")]
    ZeroPoints,

    #[error("deletedAt must be after the Unix epoch")]
    InvalidDeletedAt,

    #[error("invalid referral status: {0}")]
    InvalidStatus(String),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

fn require(field: &'static str, value: &str) -> Result<(), PayloadError> {
    if value.trim().is_empty() {
        return Err(PayloadError::BlankField(field));
    }
    Ok(())
}

/// Lifecycle of a referral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferralStatus {
    Created,
    Sent,
    Completed,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::Created => "Created",
            ReferralStatus::Sent => "Sent",
            ReferralStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferralStatus {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(ReferralStatus::Created),
            "Sent" => Ok(ReferralStatus::Sent),
            "Completed" => Ok(ReferralStatus::Completed),
            other => Err(PayloadError::InvalidStatus(other.to_string())),
        }
    }
}

/// User signed up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPayload {
    pub username: String,
    pub email: String,

    /// Code this user hands out to others
    pub referral_code: String,

    /// Code of the user who referred this one, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_by_code: Option<String>,
}

impl CreatedPayload {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        referral_code: impl Into<String>,
        referred_by_code: Option<String>,
    ) -> Result<Self, PayloadError> {
        let payload = Self {
            username: username.into(),
            email: email.into(),
            referral_code: referral_code.into(),
            referred_by_code,
        };
        payload.validate()?;
        Ok(payload)
    }

    pub fn validate(&self) -> Result<(), PayloadError> {
        require("username", &self.username)?;
        require("email", &self.email)?;
        require("referralCode", &self.referral_code)
    }
}

/// User was soft-deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedPayload {
    pub deleted_at: DateTime<Utc>,
}

impl DeletedPayload {
    pub fn new(deleted_at: DateTime<Utc>) -> Result<Self, PayloadError> {
        let payload = Self { deleted_at };
        payload.validate()?;
        Ok(payload)
    }

    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.deleted_at.timestamp() <= 0 {
            return Err(PayloadError::InvalidDeletedAt);
        }
        Ok(())
    }
}

/// Referral recorded against the referring user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralCreatedPayload {
    pub referral_id: String,
    pub referral_code: String,
    pub referred_user_email: String,
    pub referral_status: ReferralStatus,
}

impl ReferralCreatedPayload {
    pub fn new(
        referral_id: impl Into<String>,
        referral_code: impl Into<String>,
        referred_user_email: impl Into<String>,
        referral_status: ReferralStatus,
    ) -> Result<Self, PayloadError> {
        let payload = Self {
            referral_id: referral_id.into(),
            referral_code: referral_code.into(),
            referred_user_email: referred_user_email.into(),
            referral_status,
        };
        payload.validate()?;
        Ok(payload)
    }

    pub fn validate(&self) -> Result<(), PayloadError> {
        require("referralId", &self.referral_id)?;
        require("referralCode", &self.referral_code)?;
        require("referredUserEmail", &self.referred_user_email)
    }
}

/// Existing referral reached Completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralCompletedPayload {
    pub referral_id: String,
}

impl ReferralCompletedPayload {
    pub fn new(referral_id: impl Into<String>) -> Result<Self, PayloadError> {
        let payload = Self {
            referral_id: referral_id.into(),
        };
        payload.validate()?;
        Ok(payload)
    }

    pub fn validate(&self) -> Result<(), PayloadError> {
        require("referralId", &self.referral_id)
    }
}

/// Points added to the user's running total
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsEarnedPayload {
    pub points_earned: u32,
}

impl PointsEarnedPayload {
    pub fn new(points_earned: u32) -> Result<Self, PayloadError> {
        let payload = Self { points_earned };
        payload.validate()?;
        Ok(payload)
    }

    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.points_earned == 0 {
            return Err(PayloadError::ZeroPoints);
        }
        Ok(())
    }
}

/// Typed view of a user event payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEvent {
    Created(CreatedPayload),
    Deleted(DeletedPayload),
    ReferralCreated(ReferralCreatedPayload),
    ReferralCompleted(ReferralCompletedPayload),
    PointsEarned(PointsEarnedPayload),
}

impl UserEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            UserEvent::Created(_) => EventType::UserCreated,
            UserEvent::Deleted(_) => EventType::UserDeleted,
            UserEvent::ReferralCreated(_) => EventType::UserReferralCreated,
            UserEvent::ReferralCompleted(_) => EventType::UserReferralCompleted,
            UserEvent::PointsEarned(_) => EventType::PointsEarned,
        }
    }

    /// Serialize the inner payload
    pub fn encode(&self) -> Result<String, PayloadError> {
        let encoded = match self {
            UserEvent::Created(p) => serde_json::to_string(p),
            UserEvent::Deleted(p) => serde_json::to_string(p),
            UserEvent::ReferralCreated(p) => serde_json::to_string(p),
            UserEvent::ReferralCompleted(p) => serde_json::to_string(p),
            UserEvent::PointsEarned(p) => serde_json::to_string(p),
        };
        encoded.map_err(|err| PayloadError::Malformed(err.to_string()))
    }

    /// Deserialize and validate a payload of the given type
    pub fn decode(event_type: EventType, payload: Option<&str>) -> Result<Self, PayloadError> {
        let raw = payload.ok_or(PayloadError::Missing)?;
        let decoded = match event_type {
            EventType::UserCreated => {
                let p: CreatedPayload = parse(raw)?;
                p.validate()?;
                UserEvent::Created(p)
            }
            EventType::UserDeleted => {
                let p: DeletedPayload = parse(raw)?;
                p.validate()?;
                UserEvent::Deleted(p)
            }
            EventType::UserReferralCreated => {
                let p: ReferralCreatedPayload = parse(raw)?;
                p.validate()?;
                UserEvent::ReferralCreated(p)
            }
            EventType::UserReferralCompleted => {
                let p: ReferralCompletedPayload = parse(raw)?;
                p.validate()?;
                UserEvent::ReferralCompleted(p)
            }
            EventType::PointsEarned => {
                let p: PointsEarnedPayload = parse(raw)?;
                p.validate()?;
                UserEvent::PointsEarned(p)
            }
        };
        Ok(decoded)
    }
}

fn parse<T: for<'de> Deserialize<'de>>(raw: &str) -> Result<T, PayloadError> {
    serde_json::from_str(raw).map_err(|err| PayloadError::Malformed(err.to_string()))
}
