//! Follow repository
//!
//! A follow is a directed edge between users. Both sides carry cached counts
//! (`follower_count`, `following_count`), so edge insert/delete and the two
//! counter updates run inside one transaction.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::FollowUser;

/// Follow repository trait
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Create a follow edge. Returns false if it already existed.
    async fn follow(&self, follower_id: i64, following_id: i64) -> Result<bool>;

    /// Remove a follow edge. Returns false if there was none.
    async fn unfollow(&self, follower_id: i64, following_id: i64) -> Result<bool>;

    /// Check whether follower follows following
    async fn is_following(&self, follower_id: i64, following_id: i64) -> Result<bool>;

    /// List the users following `user_id`, newest first
    async fn followers(&self, user_id: i64, page: u32, per_page: u32)
        -> Result<(Vec<FollowUser>, i64)>;

    /// List the users `user_id` follows, newest first
    async fn following(&self, user_id: i64, page: u32, per_page: u32)
        -> Result<(Vec<FollowUser>, i64)>;
}

/// SQLx-based follow repository implementation
pub struct SqlxFollowRepository {
    pool: SqlitePool,
}

impl SqlxFollowRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn FollowRepository> {
        Arc::new(Self::new(pool))
    }
}

fn map_follow_user_row(row: &sqlx::sqlite::SqliteRow) -> FollowUser {
    FollowUser {
        id: row.get("id"),
        username: row.get("username"),
        display_name: row.get("display_name"),
        avatar: row.get("avatar"),
        role: row
            .get::<String, _>("role")
            .parse()
            .unwrap_or_default(),
        followed_at: row.get("followed_at"),
    }
}

#[async_trait]
impl FollowRepository for SqlxFollowRepository {
    async fn follow(&self, follower_id: i64, following_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT OR IGNORE INTO follows (follower_id, following_id) VALUES (?, ?)",
        )
        .bind(follower_id)
        .bind(following_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE users SET following_count = following_count + 1 WHERE id = ?")
            .bind(follower_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET follower_count = follower_count + 1 WHERE id = ?")
            .bind(following_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn unfollow(&self, follower_id: i64, following_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result =
            sqlx::query("DELETE FROM follows WHERE follower_id = ? AND following_id = ?")
                .bind(follower_id)
                .bind(following_id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "UPDATE users SET following_count = MAX(0, following_count - 1) WHERE id = ?",
        )
        .bind(follower_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "UPDATE users SET follower_count = MAX(0, follower_count - 1) WHERE id = ?",
        )
        .bind(following_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn is_following(&self, follower_id: i64, following_id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ? AND following_id = ?",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn followers(
        &self,
        user_id: i64,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<FollowUser>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE following_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let offset = (page.saturating_sub(1) as i64).saturating_mul(per_page as i64);
        let rows = sqlx::query(
            r#"SELECT u.id, u.username, u.display_name, u.avatar, u.role,
                      f.created_at AS followed_at
               FROM follows f
               JOIN users u ON u.id = f.follower_id
               WHERE f.following_id = ?
               ORDER BY f.created_at DESC
               LIMIT ? OFFSET ?"#,
        )
        .bind(user_id)
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.iter().map(map_follow_user_row).collect(), total))
    }

    async fn following(
        &self,
        user_id: i64,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<FollowUser>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let offset = (page.saturating_sub(1) as i64).saturating_mul(per_page as i64);
        let rows = sqlx::query(
            r#"SELECT u.id, u.username, u.display_name, u.avatar, u.role,
                      f.created_at AS followed_at
               FROM follows f
               JOIN users u ON u.id = f.following_id
               WHERE f.follower_id = ?
               ORDER BY f.created_at DESC
               LIMIT ? OFFSET ?"#,
        )
        .bind(user_id)
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.iter().map(map_follow_user_row).collect(), total))
    }
}
