// Copyright (c) 2025 - Cowboy AI, Inc.
//! User command handler
//!
//! Each command is one transaction:
//! 1. Load the user from the repository (except CreateUser)
//! 2. Run the pure rule from [`crate::aggregate::handlers`]
//! 3. Apply the events with the optimistic version check
//! 4. Publish them on the bus
//!
//! A publish failure is reported to the caller but the events stay
//! persisted.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::aggregate::handlers::*;
use crate::aggregate::{Command, CommandKind, User};
use crate::bus::EventBus;
use crate::dispatcher::CommandHandler;
use crate::errors::EventSourceResult;
use crate::repository::EventRepo;

const REFERRAL_CODE_LEN: usize = 8;
const REFERRAL_CODE_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Short URL-safe code a user shares to refer others
pub fn generate_referral_code() -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(REFERRAL_CODE_LEN)
        .map(|byte| REFERRAL_CODE_ALPHABET[usize::from(byte & 0x3f)] as char)
        .collect()
}

/// Handles every user command
pub struct UserCommandHandler {
    repo: Arc<dyn EventRepo>,
    bus: Arc<EventBus>,
}

impl UserCommandHandler {
    pub fn new(repo: Arc<dyn EventRepo>, bus: Arc<EventBus>) -> Self {
        Self { repo, bus }
    }

    async fn load_user(&self, aggregate_id: &str) -> EventSourceResult<User> {
        self.repo.load(aggregate_id).await
    }
}

#[async_trait]
impl CommandHandler for UserCommandHandler {
    fn commands_handled(&self) -> Vec<CommandKind> {
        vec![
            CommandKind::CreateUser,
            CommandKind::DeleteUser,
            CommandKind::CreateReferral,
            CommandKind::CompleteReferral,
            CommandKind::EarnPoints,
        ]
    }

    #[instrument(
        skip(self, command),
        fields(command = %command.kind(), aggregate_id = %command.aggregate_id())
    )]
    async fn handle(&self, command: &Command) -> EventSourceResult<()> {
        let now = Utc::now();
        let events = match command {
            Command::CreateUser(c) => handle_create_user(c, &generate_referral_code(), now)?,
            Command::DeleteUser(c) => {
                let user = self.load_user(&c.user_id).await?;
                handle_delete_user(&user, c, now)?
            }
            Command::CreateReferral(c) => {
                let user = self.load_user(&c.user_id).await?;
                handle_create_referral(&user, c, &Uuid::now_v7().to_string(), now)?
            }
            Command::CompleteReferral(c) => {
                let user = self.load_user(&c.user_id).await?;
                handle_complete_referral(&user, c, &Uuid::now_v7().to_string(), now)?
            }
            Command::EarnPoints(c) => {
                let user = self.load_user(&c.user_id).await?;
                handle_earn_points(&user, c, now)?
            }
        };

        let applied = self.repo.apply(events.clone()).await?;
        debug!(version = applied.version, "Publishing events");
        self.bus.publish(&events).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{
        CompleteReferral, CreateReferral, CreateUser, DeleteUser, EarnPoints, ReferralStatus,
    };
    use crate::bus::EventHandler;
    use crate::config::EventBusConfig;
    use crate::errors::EventSourceError;
    use crate::event_store::InMemoryEventStore;
    use crate::events::{Event, EventType};
    use crate::repository::EventRepository;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn event_types_handled(&self) -> Vec<EventType> {
            EventType::ALL.to_vec()
        }

        async fn handle(&self, event: &Event) -> EventSourceResult<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct Harness {
        handler: UserCommandHandler,
        repo: Arc<EventRepository>,
        recorder: Arc<Recorder>,
    }

    fn harness() -> Harness {
        let repo = Arc::new(EventRepository::new(Arc::new(InMemoryEventStore::new())));
        let bus = Arc::new(EventBus::new(EventBusConfig::new(
            Duration::from_millis(1),
            Duration::from_millis(50),
            1,
        )));
        let recorder = Arc::new(Recorder::default());
        bus.register_handler(recorder.clone());
        Harness {
            handler: UserCommandHandler::new(repo.clone(), bus),
            repo,
            recorder,
        }
    }

    fn create(id: &str) -> Command {
        CreateUser {
            user_id: id.to_string(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            referred_by_code: None,
        }
        .into()
    }

    #[test]
    fn test_referral_code_shape() {
        let code = generate_referral_code();
        assert_eq!(code.len(), REFERRAL_CODE_LEN);
        assert!(code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
    }

    #[tokio::test]
    async fn test_create_user_persists_and_publishes() {
        let h = harness();
        h.handler.handle(&create("u1")).await.unwrap();

        let user = h.repo.load("u1").await.unwrap();
        assert_eq!(user.version, 1);
        assert_eq!(user.referral_code.as_ref().map(String::len), Some(8));

        let published = h.recorder.events.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event_type, EventType::UserCreated);
    }

    #[tokio::test]
    async fn test_invalid_create_persists_nothing() {
        let h = harness();
        let command: Command = CreateUser {
            user_id: "u1".to_string(),
            username: String::new(),
            email: "alice@x.com".to_string(),
            referred_by_code: None,
        }
        .into();

        let err = h.handler.handle(&command).await.unwrap_err();
        assert!(matches!(err, EventSourceError::Validation(_)));
        assert!(h.repo.load("u1").await.unwrap_err().is_not_found());
        assert!(h.recorder.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_create_is_concurrency_conflict() {
        let h = harness();
        h.handler.handle(&create("u1")).await.unwrap();
        let err = h.handler.handle(&create("u1")).await.unwrap_err();
        assert!(matches!(err, EventSourceError::ConcurrencyConflict { .. }));
    }

    #[tokio::test]
    async fn test_delete_twice_rejected_without_new_event() {
        let h = harness();
        h.handler.handle(&create("u1")).await.unwrap();
        let delete: Command = DeleteUser {
            user_id: "u1".to_string(),
        }
        .into();

        h.handler.handle(&delete).await.unwrap();
        let err = h.handler.handle(&delete).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(h.repo.load("u1").await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_command_on_missing_user_is_not_found() {
        let h = harness();
        let command: Command = EarnPoints {
            user_id: "ghost".to_string(),
            points: 10,
        }
        .into();
        assert!(h.handler.handle(&command).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_referral_then_completion() {
        let h = harness();
        h.handler.handle(&create("u1")).await.unwrap();
        let code = h.repo.load("u1").await.unwrap().referral_code.unwrap();

        h.handler
            .handle(
                &CreateReferral {
                    user_id: "u1".to_string(),
                    referred_user_email: "bob@x.com".to_string(),
                }
                .into(),
            )
            .await
            .unwrap();
        h.handler
            .handle(
                &CompleteReferral {
                    user_id: "u1".to_string(),
                    referred_user_id: "u2".to_string(),
                    referred_user_email: "bob@x.com".to_string(),
                    referred_by_code: code,
                }
                .into(),
            )
            .await
            .unwrap();

        let user = h.repo.load("u1").await.unwrap();
        assert_eq!(user.version, 3);
        assert_eq!(user.referrals.len(), 1);
        assert_eq!(user.referrals[0].status, ReferralStatus::Completed);
    }

    #[tokio::test]
    async fn test_earn_points_accumulates() {
        let h = harness();
        h.handler.handle(&create("u1")).await.unwrap();
        for points in [100, 200] {
            h.handler
                .handle(
                    &EarnPoints {
                        user_id: "u1".to_string(),
                        points,
                    }
                    .into(),
                )
                .await
                .unwrap();
        }
        assert_eq!(h.repo.load("u1").await.unwrap().points, 300);
    }
}
