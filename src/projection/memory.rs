// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory read model

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{ReadRepo, UserDto};
use crate::aggregate::{Referral, ReferralStatus};
use crate::errors::{EventSourceError, EventSourceResult};

/// [`ReadRepo`] over a map of user id to row
#[derive(Debug, Default)]
pub struct InMemoryReadRepo {
    users: RwLock<HashMap<String, UserDto>>,
}

impl InMemoryReadRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a versioned change to an existing row
    async fn update<F>(&self, user_id: &str, version: u64, change: F) -> EventSourceResult<()>
    where
        F: FnOnce(&mut UserDto) -> EventSourceResult<()> + Send,
    {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| EventSourceError::AggregateNotFound(user_id.to_string()))?;
        if version != user.version + 1 {
            return Err(EventSourceError::EventOutOfOrder {
                aggregate_id: user_id.to_string(),
                current: user.version,
                received: version,
            });
        }
        change(user)?;
        user.version = version;
        Ok(())
    }
}

#[async_trait]
impl ReadRepo for InMemoryReadRepo {
    async fn create_user(&self, user: UserDto) -> EventSourceResult<()> {
        let mut users = self.users.write().await;
        if let Some(existing) = users.get(&user.user_id) {
            return Err(EventSourceError::EventOutOfOrder {
                aggregate_id: user.user_id.clone(),
                current: existing.version,
                received: user.version,
            });
        }
        users.insert(user.user_id.clone(), user);
        Ok(())
    }

    async fn delete_user(
        &self,
        user_id: &str,
        deleted_at: DateTime<Utc>,
        version: u64,
    ) -> EventSourceResult<()> {
        self.update(user_id, version, |user| {
            user.deleted_at = Some(deleted_at);
            user.updated_at = deleted_at;
            Ok(())
        })
        .await
    }

    async fn create_referral(
        &self,
        user_id: &str,
        referral: Referral,
        version: u64,
    ) -> EventSourceResult<()> {
        self.update(user_id, version, |user| {
            user.updated_at = referral.updated_at;
            user.referrals.push(referral);
            Ok(())
        })
        .await
    }

    async fn update_referral_status(
        &self,
        user_id: &str,
        referral_id: &str,
        status: ReferralStatus,
        version: u64,
    ) -> EventSourceResult<()> {
        self.update(user_id, version, |user| {
            let referral = user
                .referrals
                .iter_mut()
                .find(|referral| referral.id == referral_id)
                .ok_or_else(|| {
                    EventSourceError::ReadModel(format!(
                        "referral {referral_id} not found for user {user_id}"
                    ))
                })?;
            referral.status = status;
            referral.updated_at = Utc::now();
            Ok(())
        })
        .await
    }

    async fn earn_points(
        &self,
        user_id: &str,
        points: u32,
        version: u64,
    ) -> EventSourceResult<()> {
        self.update(user_id, version, |user| {
            user.points = user.points.checked_add(points).ok_or_else(|| {
                EventSourceError::ReadModel(format!("points overflow for user {user_id}"))
            })?;
            user.updated_at = Utc::now();
            Ok(())
        })
        .await
    }

    async fn users(&self) -> EventSourceResult<Vec<UserDto>> {
        let mut users: Vec<UserDto> = self
            .users
            .read()
            .await
            .values()
            .filter(|user| user.deleted_at.is_none())
            .cloned()
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.user_id.cmp(&b.user_id)));
        Ok(users)
    }

    async fn user(&self, user_id: &str) -> EventSourceResult<UserDto> {
        self.users
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| EventSourceError::AggregateNotFound(user_id.to_string()))
    }

    async fn referrals(&self, user_id: &str) -> EventSourceResult<Vec<Referral>> {
        Ok(self.user(user_id).await?.referrals)
    }

    async fn user_by_referral_code(&self, referral_code: &str) -> EventSourceResult<UserDto> {
        self.users
            .read()
            .await
            .values()
            .find(|user| user.deleted_at.is_none() && user.referral_code == referral_code)
            .cloned()
            .ok_or_else(|| {
                EventSourceError::AggregateNotFound(format!("referral code {referral_code}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dto(id: &str, code: &str) -> UserDto {
        let now = Utc::now();
        UserDto {
            user_id: id.to_string(),
            username: id.to_string(),
            email: format!("{id}@x.com"),
            points: 0,
            referral_code: code.to_string(),
            referred_by_code: None,
            referrals: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_versioned_writes() {
        let repo = InMemoryReadRepo::new();
        repo.create_user(dto("u1", "ABC123")).await.unwrap();
        repo.earn_points("u1", 100, 2).await.unwrap();

        let err = repo.earn_points("u1", 100, 4).await.unwrap_err();
        assert!(matches!(
            err,
            EventSourceError::EventOutOfOrder { current: 2, received: 4, .. }
        ));
        assert!(err.is_retryable());

        let user = repo.user("u1").await.unwrap();
        assert_eq!(user.points, 100);
        assert_eq!(user.version, 2);
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let repo = InMemoryReadRepo::new();
        assert!(repo.earn_points("ghost", 1, 2).await.unwrap_err().is_not_found());
        assert!(repo.user_by_referral_code("NOPE").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_deleted_users_hidden_from_queries() {
        let repo = InMemoryReadRepo::new();
        repo.create_user(dto("u1", "ABC123")).await.unwrap();
        repo.create_user(dto("u2", "DEF456")).await.unwrap();
        repo.delete_user("u1", Utc::now(), 2).await.unwrap();

        let ids: Vec<String> = repo
            .users()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.user_id)
            .collect();
        assert_eq!(ids, vec!["u2".to_string()]);
        assert!(repo.user_by_referral_code("ABC123").await.is_err());
        assert!(repo.user("u1").await.unwrap().deleted_at.is_some());
    }

    #[tokio::test]
    async fn test_referral_status_update() {
        let repo = InMemoryReadRepo::new();
        repo.create_user(dto("u1", "ABC123")).await.unwrap();
        let now = Utc::now();
        repo.create_referral(
            "u1",
            Referral {
                id: "r-1".to_string(),
                referral_code: "ABC123".to_string(),
                referred_user_email: "bob@x.com".to_string(),
                status: ReferralStatus::Created,
                created_at: now,
                updated_at: now,
            },
            2,
        )
        .await
        .unwrap();
        repo.update_referral_status("u1", "r-1", ReferralStatus::Completed, 3)
            .await
            .unwrap();

        let referrals = repo.referrals("u1").await.unwrap();
        assert_eq!(referrals[0].status, ReferralStatus::Completed);
    }
}
