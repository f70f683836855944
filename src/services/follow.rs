//! Follow service

use crate::db::repositories::{FollowRepository, UserRepository};
use crate::models::{FollowUser, PagedResult};
use crate::services::ServiceError;
use anyhow::Context;
use std::sync::Arc;

pub struct FollowService {
    follow_repo: Arc<dyn FollowRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl FollowService {
    pub fn new(follow_repo: Arc<dyn FollowRepository>, user_repo: Arc<dyn UserRepository>) -> Self {
        Self {
            follow_repo,
            user_repo,
        }
    }

    /// Follow another user
    pub async fn follow(&self, follower_id: i64, following_id: i64) -> Result<(), ServiceError> {
        if follower_id == following_id {
            return Err(ServiceError::Validation(
                "You cannot follow yourself".to_string(),
            ));
        }

        self.user_repo
            .get_by_id(following_id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", following_id)))?;

        // Following twice is a no-op, not an error
        self.follow_repo
            .follow(follower_id, following_id)
            .await
            .context("Failed to follow")?;
        Ok(())
    }

    /// Stop following a user
    pub async fn unfollow(&self, follower_id: i64, following_id: i64) -> Result<(), ServiceError> {
        self.follow_repo
            .unfollow(follower_id, following_id)
            .await
            .context("Failed to unfollow")?;
        Ok(())
    }

    /// Whether follower follows following
    pub async fn is_following(
        &self,
        follower_id: i64,
        following_id: i64,
    ) -> Result<bool, ServiceError> {
        Ok(self
            .follow_repo
            .is_following(follower_id, following_id)
            .await
            .context("Failed to check follow")?)
    }

    /// Who follows this user
    pub async fn followers(
        &self,
        user_id: i64,
        page: u32,
        per_page: u32,
    ) -> Result<PagedResult<FollowUser>, ServiceError> {
        self.require_user(user_id).await?;
        let (items, total) = self
            .follow_repo
            .followers(user_id, page, per_page)
            .await
            .context("Failed to list followers")?;
        Ok(PagedResult::new(items, total, page, per_page))
    }

    /// Who this user follows
    pub async fn following(
        &self,
        user_id: i64,
        page: u32,
        per_page: u32,
    ) -> Result<PagedResult<FollowUser>, ServiceError> {
        self.require_user(user_id).await?;
        let (items, total) = self
            .follow_repo
            .following(user_id, page, per_page)
            .await
            .context("Failed to list following")?;
        Ok(PagedResult::new(items, total, page, per_page))
    }

    async fn require_user(&self, user_id: i64) -> Result<(), ServiceError> {
        self.user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxFollowRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{User, UserRole};

    async fn setup() -> (FollowService, i64, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let a = users
            .create(&User::new(
                "alice".to_string(),
                "alice@example.com".to_string(),
                "hash".to_string(),
                UserRole::Artist,
            ))
            .await
            .expect("create failed");
        let b = users
            .create(&User::new(
                "bob".to_string(),
                "bob@example.com".to_string(),
                "hash".to_string(),
                UserRole::Community,
            ))
            .await
            .expect("create failed");

        let service = FollowService::new(
            SqlxFollowRepository::boxed(pool.clone()),
            SqlxUserRepository::boxed(pool),
        );
        (service, a.id, b.id)
    }

    #[tokio::test]
    async fn test_follow_cycle() {
        let (service, alice_id, bob_id) = setup().await;

        service.follow(bob_id, alice_id).await.expect("follow failed");
        assert!(service
            .is_following(bob_id, alice_id)
            .await
            .expect("check failed"));

        let followers = service
            .followers(alice_id, 1, 20)
            .await
            .expect("followers failed");
        assert_eq!(followers.total, 1);

        service.unfollow(bob_id, alice_id).await.expect("unfollow failed");
        assert!(!service
            .is_following(bob_id, alice_id)
            .await
            .expect("check failed"));
    }

    #[tokio::test]
    async fn test_cannot_follow_self() {
        let (service, alice_id, _) = setup().await;
        assert!(matches!(
            service.follow(alice_id, alice_id).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_follow_missing_user() {
        let (service, alice_id, _) = setup().await;
        assert!(matches!(
            service.follow(alice_id, 999).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
