// Copyright (c) 2025 - Cowboy AI, Inc.
//! Projects user events into the read model

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{ReadRepo, UserDto};
use crate::aggregate::{Referral, ReferralStatus};
use crate::bus::EventHandler;
use crate::errors::{EventSourceError, EventSourceResult};
use crate::event_store::EventStore;
use crate::events::{Event, EventType, UserEvent};

/// Keeps [`ReadRepo`] in step with the event stream
pub struct UserProjector {
    read_repo: Arc<dyn ReadRepo>,
    store: Arc<dyn EventStore>,
}

impl UserProjector {
    pub fn new(read_repo: Arc<dyn ReadRepo>, store: Arc<dyn EventStore>) -> Self {
        Self { read_repo, store }
    }

    /// Version already projected for an aggregate, 0 when absent
    async fn projected_version(&self, aggregate_id: &str) -> EventSourceResult<u64> {
        match self.read_repo.user(aggregate_id).await {
            Ok(user) => Ok(user.version),
            Err(err) if err.is_not_found() => Ok(0),
            Err(err) => Err(err),
        }
    }

    async fn project(&self, event: &Event) -> EventSourceResult<()> {
        let user_id = event.aggregate_id.as_str();
        match event.decode()? {
            UserEvent::Created(p) => {
                self.read_repo
                    .create_user(UserDto {
                        user_id: user_id.to_string(),
                        username: p.username,
                        email: p.email,
                        points: 0,
                        referral_code: p.referral_code,
                        referred_by_code: p.referred_by_code,
                        referrals: Vec::new(),
                        version: event.version,
                        created_at: event.event_at,
                        updated_at: event.event_at,
                        deleted_at: None,
                    })
                    .await
            }
            UserEvent::Deleted(p) => {
                self.read_repo
                    .delete_user(user_id, p.deleted_at, event.version)
                    .await
            }
            UserEvent::ReferralCreated(p) => {
                self.read_repo
                    .create_referral(
                        user_id,
                        Referral {
                            id: p.referral_id,
                            referral_code: p.referral_code,
                            referred_user_email: p.referred_user_email,
                            status: p.referral_status,
                            created_at: event.event_at,
                            updated_at: event.event_at,
                        },
                        event.version,
                    )
                    .await
            }
            UserEvent::ReferralCompleted(p) => {
                self.read_repo
                    .update_referral_status(
                        user_id,
                        &p.referral_id,
                        ReferralStatus::Completed,
                        event.version,
                    )
                    .await
            }
            UserEvent::PointsEarned(p) => {
                self.read_repo
                    .earn_points(user_id, p.points_earned, event.version)
                    .await
            }
        }
    }
}

#[async_trait]
impl EventHandler for UserProjector {
    fn name(&self) -> &str {
        "user-projector"
    }

    fn event_types_handled(&self) -> Vec<EventType> {
        EventType::ALL.to_vec()
    }

    async fn handle(&self, event: &Event) -> EventSourceResult<()> {
        let current = self.projected_version(&event.aggregate_id).await?;
        if event.version <= current {
            debug!(
                aggregate_id = %event.aggregate_id,
                version = event.version,
                "Event already projected"
            );
            return Ok(());
        }
        if event.version != current + 1 {
            return Err(EventSourceError::EventOutOfOrder {
                aggregate_id: event.aggregate_id.clone(),
                current,
                received: event.version,
            });
        }
        self.project(event).await
    }

    /// Replay whatever the read model is missing for this aggregate
    async fn sync(&self, aggregate_id: &str) -> EventSourceResult<()> {
        let current = self.projected_version(aggregate_id).await?;
        let missing = self.store.load_after(aggregate_id, current).await?.sorted();
        if missing.is_empty() {
            return Ok(());
        }

        info!(
            aggregate_id = %aggregate_id,
            from_version = current,
            count = missing.len(),
            "Syncing read model"
        );
        for event in &missing {
            self.project(event).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_store::InMemoryEventStore;
    use crate::events::{CreatedPayload, PointsEarnedPayload};
    use crate::projection::InMemoryReadRepo;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn created(id: &str) -> Event {
        Event::from_payload(
            id,
            1,
            &UserEvent::Created(CreatedPayload::new("alice", "a@x.com", "ABC123", None).unwrap()),
            Utc::now(),
        )
        .unwrap()
    }

    fn points(id: &str, version: u64, amount: u32) -> Event {
        Event::from_payload(
            id,
            version,
            &UserEvent::PointsEarned(PointsEarnedPayload::new(amount).unwrap()),
            Utc::now(),
        )
        .unwrap()
    }

    fn projector() -> (UserProjector, Arc<InMemoryReadRepo>, Arc<InMemoryEventStore>) {
        let read_repo = Arc::new(InMemoryReadRepo::new());
        let store = Arc::new(InMemoryEventStore::new());
        (
            UserProjector::new(read_repo.clone(), store.clone()),
            read_repo,
            store,
        )
    }

    #[tokio::test]
    async fn test_redelivered_event_is_skipped() {
        let (projector, read_repo, _) = projector();
        projector.handle(&created("u1")).await.unwrap();
        projector.handle(&points("u1", 2, 50)).await.unwrap();
        projector.handle(&points("u1", 2, 50)).await.unwrap();

        assert_eq!(read_repo.user("u1").await.unwrap().points, 50);
    }

    #[tokio::test]
    async fn test_gap_is_out_of_order() {
        let (projector, _, _) = projector();
        projector.handle(&created("u1")).await.unwrap();
        let err = projector.handle(&points("u1", 3, 50)).await.unwrap_err();
        assert!(matches!(err, EventSourceError::EventOutOfOrder { .. }));
    }

    #[tokio::test]
    async fn test_sync_replays_missing_history() {
        let (projector, read_repo, store) = projector();
        store
            .save(&[created("u1"), points("u1", 2, 100), points("u1", 3, 200)])
            .await
            .unwrap();

        projector.sync("u1").await.unwrap();

        let user = read_repo.user("u1").await.unwrap();
        assert_eq!(user.version, 3);
        assert_eq!(user.points, 300);

        // the live event that triggered the sync is already in
        projector.handle(&points("u1", 3, 200)).await.unwrap();
        assert_eq!(read_repo.user("u1").await.unwrap().points, 300);
    }
}
