// Copyright (c) 2025 - Cowboy AI, Inc.
//! Referral saga
//!
//! Reacts to `UserCreated` by awarding sign-up points and, when the new user
//! came with a referral code, completing the referral on the referrer:
//!
//! ```text
//! UserCreated (no code)  → EarnPoints(self, SignUpWithoutReferral)
//!
//! UserCreated (code)     → read model: referrer = user_by_referral_code(code)
//!                        → CompleteReferral(referrer)
//!                        → EarnPoints(referrer, ReferUser)
//!                        → EarnPoints(self, SignUpWithReferral)
//! ```
//!
//! Steps run in sequence and the first failure stops the rest. Nothing is
//! compensated. A redelivered `UserCreated` dispatches the commands again;
//! `CompleteReferral` converges but points are awarded a second time.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument};

use crate::aggregate::{CompleteReferral, EarnPoints};
use crate::bus::EventHandler;
use crate::dispatcher::Dispatch;
use crate::errors::EventSourceResult;
use crate::events::{CreatedPayload, Event, EventType, UserEvent};
use crate::points::{PointsAction, PointsMappingService};
use crate::projection::ReadRepo;

/// Cross-aggregate workflow run on every new user
pub struct ReferralSaga {
    dispatcher: Arc<dyn Dispatch>,
    read_repo: Arc<dyn ReadRepo>,
    points: PointsMappingService,
}

impl ReferralSaga {
    pub fn new(
        dispatcher: Arc<dyn Dispatch>,
        read_repo: Arc<dyn ReadRepo>,
        points: PointsMappingService,
    ) -> Self {
        Self {
            dispatcher,
            read_repo,
            points,
        }
    }

    async fn earn(&self, user_id: &str, action: PointsAction) -> EventSourceResult<()> {
        self.dispatcher
            .dispatch(
                EarnPoints {
                    user_id: user_id.to_string(),
                    points: self.points.points_for(action),
                }
                .into(),
            )
            .await
    }

    async fn user_created(&self, user_id: &str, payload: CreatedPayload) -> EventSourceResult<()> {
        let Some(code) = payload.referred_by_code else {
            return self.earn(user_id, PointsAction::SignUpWithoutReferral).await;
        };

        let referrer = self
            .read_repo
            .user_by_referral_code(&code)
            .await
            .inspect_err(|err| {
                error!(referral_code = %code, error = %err, "Referring user not found");
            })?;

        self.dispatcher
            .dispatch(
                CompleteReferral {
                    user_id: referrer.user_id.clone(),
                    referred_user_id: user_id.to_string(),
                    referred_user_email: payload.email,
                    referred_by_code: code,
                }
                .into(),
            )
            .await?;
        self.earn(&referrer.user_id, PointsAction::ReferUser).await?;
        self.earn(user_id, PointsAction::SignUpWithReferral).await?;

        info!(referrer = %referrer.user_id, "Referral rewarded");
        Ok(())
    }
}

#[async_trait]
impl EventHandler for ReferralSaga {
    fn name(&self) -> &str {
        "referral-saga"
    }

    fn event_types_handled(&self) -> Vec<EventType> {
        vec![EventType::UserCreated]
    }

    #[instrument(skip(self, event), fields(aggregate_id = %event.aggregate_id))]
    async fn handle(&self, event: &Event) -> EventSourceResult<()> {
        match event.decode()? {
            UserEvent::Created(payload) => self.user_created(&event.aggregate_id, payload).await,
            _ => Ok(()),
        }
    }
}
