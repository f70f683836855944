//! Like repository
//!
//! Likes are stored in one table keyed by (target_type, target_id, user_id).
//! Artwork likes also maintain the cached `like_count` column on the artwork
//! row; comment like counts are computed on read by the comment repository.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::models::LikeTargetType;

/// Like repository trait
#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Add a like. Returns false if it already existed.
    async fn add(&self, target_type: LikeTargetType, target_id: i64, user_id: i64)
        -> Result<bool>;

    /// Remove a like. Returns false if there was none.
    async fn remove(
        &self,
        target_type: LikeTargetType,
        target_id: i64,
        user_id: i64,
    ) -> Result<bool>;

    /// Check whether the user has liked the target
    async fn is_liked(
        &self,
        target_type: LikeTargetType,
        target_id: i64,
        user_id: i64,
    ) -> Result<bool>;

    /// Count likes on the target
    async fn count(&self, target_type: LikeTargetType, target_id: i64) -> Result<i64>;
}

/// SQLx-based like repository implementation
pub struct SqlxLikeRepository {
    pool: SqlitePool,
}

impl SqlxLikeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn LikeRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl LikeRepository for SqlxLikeRepository {
    async fn add(
        &self,
        target_type: LikeTargetType,
        target_id: i64,
        user_id: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO likes (target_type, target_id, user_id) VALUES (?, ?, ?)",
        )
        .bind(target_type.to_string())
        .bind(target_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            if target_type == LikeTargetType::Artwork {
                sqlx::query("UPDATE artworks SET like_count = like_count + 1 WHERE id = ?")
                    .bind(target_id)
                    .execute(&self.pool)
                    .await?;
            }
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn remove(
        &self,
        target_type: LikeTargetType,
        target_id: i64,
        user_id: i64,
    ) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM likes WHERE target_type = ? AND target_id = ? AND user_id = ?")
                .bind(target_type.to_string())
                .bind(target_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() > 0 {
            if target_type == LikeTargetType::Artwork {
                sqlx::query(
                    "UPDATE artworks SET like_count = MAX(0, like_count - 1) WHERE id = ?",
                )
                .bind(target_id)
                .execute(&self.pool)
                .await?;
            }
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn is_liked(
        &self,
        target_type: LikeTargetType,
        target_id: i64,
        user_id: i64,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM likes WHERE target_type = ? AND target_id = ? AND user_id = ?",
        )
        .bind(target_type.to_string())
        .bind(target_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn count(&self, target_type: LikeTargetType, target_id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE target_type = ? AND target_id = ?")
                .bind(target_type.to_string())
                .bind(target_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
