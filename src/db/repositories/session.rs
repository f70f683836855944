//! Session repository
//!
//! Database operations for bearer-token sessions.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::Session;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by ID (token)
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Delete a session
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete all sessions for a user
    async fn delete_by_user(&self, user_id: i64) -> Result<()>;

    /// Delete expired sessions, returning how many were removed
    async fn delete_expired(&self) -> Result<i64>;
}

/// SQLx-based session repository implementation
pub struct SqlxSessionRepository {
    pool: SqlitePool,
}

impl SqlxSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;
        Ok(session.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        let row = sqlx::query("SELECT * FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Session {
            id: r.get("id"),
            user_id: r.get("user_id"),
            expires_at: r.get("expires_at"),
            created_at: r.get("created_at"),
        }))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_by_user(&self, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_expired(&self) -> Result<i64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{User, UserRole};
    use chrono::Duration;

    async fn setup() -> (SqlxSessionRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Migrations failed");

        let users = SqlxUserRepository::new(pool.clone());
        let user = users
            .create(&User::new(
                "tester".to_string(),
                "tester@example.com".to_string(),
                "hash".to_string(),
                UserRole::Community,
            ))
            .await
            .expect("create user failed");

        (SqlxSessionRepository::new(pool), user.id)
    }

    fn session(user_id: i64, hours: i64) -> Session {
        Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            expires_at: Utc::now() + Duration::hours(hours),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (repo, user_id) = setup().await;
        let created = repo
            .create(&session(user_id, 24))
            .await
            .expect("create failed");

        let fetched = repo
            .get_by_id(&created.id)
            .await
            .expect("get failed")
            .expect("session missing");
        assert_eq!(fetched.user_id, user_id);
        assert!(!fetched.is_expired());
    }

    #[tokio::test]
    async fn test_delete() {
        let (repo, user_id) = setup().await;
        let created = repo
            .create(&session(user_id, 24))
            .await
            .expect("create failed");

        repo.delete(&created.id).await.expect("delete failed");
        assert!(repo
            .get_by_id(&created.id)
            .await
            .expect("get failed")
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let (repo, user_id) = setup().await;
        repo.create(&session(user_id, -1))
            .await
            .expect("create failed");
        repo.create(&session(user_id, 24))
            .await
            .expect("create failed");

        let removed = repo.delete_expired().await.expect("cleanup failed");
        assert_eq!(removed, 1);
    }
}
