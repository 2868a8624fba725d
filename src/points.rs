// Copyright (c) 2025 - Cowboy AI, Inc.
//! Points awarded per loyalty action

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{EventSourceError, EventSourceResult};

/// Action that earns points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointsAction {
    /// Someone signed up with this user's referral code
    ReferUser,
    SignUpWithReferral,
    SignUpWithoutReferral,
}

impl PointsAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointsAction::ReferUser => "ReferUser",
            PointsAction::SignUpWithReferral => "SignUpWithReferral",
            PointsAction::SignUpWithoutReferral => "SignUpWithoutReferral",
        }
    }
}

impl fmt::Display for PointsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PointsAction {
    type Err = EventSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ReferUser" => Ok(PointsAction::ReferUser),
            "SignUpWithReferral" => Ok(PointsAction::SignUpWithReferral),
            "SignUpWithoutReferral" => Ok(PointsAction::SignUpWithoutReferral),
            other => Err(EventSourceError::UnknownPointsAction(other.to_string())),
        }
    }
}

/// Maps loyalty actions to point values
#[derive(Debug, Clone, Copy, Default)]
pub struct PointsMappingService;

impl PointsMappingService {
    pub fn new() -> Self {
        Self
    }

    /// Points for a typed action
    pub fn points_for(&self, action: PointsAction) -> u32 {
        match action {
            PointsAction::ReferUser | PointsAction::SignUpWithReferral => 200,
            PointsAction::SignUpWithoutReferral => 100,
        }
    }

    /// Points for an action name; unknown names are an error
    pub fn map(&self, action: &str) -> EventSourceResult<u32> {
        Ok(self.points_for(action.parse()?))
    }
}
