//! Comment repository
//!
//! Comments support one level of threading. The listing query pulls every
//! comment on the artwork in one pass along with author info and like counts,
//! then assembles replies under their parents in memory.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{Comment, CommentWithMeta};

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a comment
    async fn create(
        &self,
        artwork_id: i64,
        user_id: i64,
        parent_id: Option<i64>,
        content: &str,
    ) -> Result<Comment>;

    /// Get a comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// List an artwork's comments as a threaded tree, oldest first.
    /// `viewer_id` controls the `is_liked` flag on each node.
    async fn list_for_artwork(
        &self,
        artwork_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<Vec<CommentWithMeta>>;

    /// Blank a comment's content and mark it deleted. Returns false if missing.
    async fn soft_delete(&self, id: i64) -> Result<bool>;

    /// Count non-deleted comments on an artwork
    async fn count_for_artwork(&self, artwork_id: i64) -> Result<i64>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: SqlitePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

fn map_comment_row(row: &sqlx::sqlite::SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        artwork_id: row.get("artwork_id"),
        user_id: row.get("user_id"),
        parent_id: row.get("parent_id"),
        content: row.get("content"),
        deleted: row.get::<i64, _>("deleted") != 0,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(
        &self,
        artwork_id: i64,
        user_id: i64,
        parent_id: Option<i64>,
        content: &str,
    ) -> Result<Comment> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"INSERT INTO comments (artwork_id, user_id, parent_id, content, deleted, created_at, updated_at)
               VALUES (?, ?, ?, ?, 0, ?, ?)"#,
        )
        .bind(artwork_id)
        .bind(user_id)
        .bind(parent_id)
        .bind(content)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            artwork_id,
            user_id,
            parent_id,
            content: content.to_string(),
            deleted: false,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| map_comment_row(&r)))
    }

    async fn list_for_artwork(
        &self,
        artwork_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<Vec<CommentWithMeta>> {
        let rows = sqlx::query(
            r#"SELECT c.id, c.artwork_id, c.user_id, c.parent_id, c.content, c.deleted,
                      c.created_at, u.username AS author_name, u.avatar AS author_avatar,
                      (SELECT COUNT(*) FROM likes l
                       WHERE l.target_type = 'comment' AND l.target_id = c.id) AS like_count,
                      (SELECT COUNT(*) FROM likes l
                       WHERE l.target_type = 'comment' AND l.target_id = c.id
                         AND l.user_id = ?) AS viewer_liked
               FROM comments c
               JOIN users u ON u.id = c.user_id
               WHERE c.artwork_id = ?
               ORDER BY c.created_at ASC, c.id ASC"#,
        )
        .bind(viewer_id.unwrap_or(0))
        .bind(artwork_id)
        .fetch_all(&self.pool)
        .await?;

        let mut top_level: Vec<CommentWithMeta> = Vec::new();
        let mut index_by_id: HashMap<i64, usize> = HashMap::new();

        for row in &rows {
            let deleted = row.get::<i64, _>("deleted") != 0;
            let node = CommentWithMeta {
                id: row.get("id"),
                artwork_id: row.get("artwork_id"),
                user_id: row.get("user_id"),
                parent_id: row.get("parent_id"),
                author_name: row.get("author_name"),
                author_avatar: row.get("author_avatar"),
                content: if deleted {
                    String::new()
                } else {
                    row.get("content")
                },
                deleted,
                like_count: row.get("like_count"),
                is_liked: row.get::<i64, _>("viewer_liked") > 0,
                created_at: row.get("created_at"),
                replies: Vec::new(),
            };

            match node.parent_id {
                Some(parent_id) => {
                    // Replies of a missing or deleted-parent thread still attach
                    // as long as the parent row exists in this artwork's set.
                    if let Some(&idx) = index_by_id.get(&parent_id) {
                        top_level[idx].replies.push(node);
                    }
                }
                None => {
                    index_by_id.insert(node.id, top_level.len());
                    top_level.push(node);
                }
            }
        }

        Ok(top_level)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE comments SET content = '', deleted = 1, updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_for_artwork(&self, artwork_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM comments WHERE artwork_id = ? AND deleted = 0",
        )
        .bind(artwork_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        ArtworkRepository, LikeRepository, SqlxArtworkRepository, SqlxLikeRepository,
        SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateArtworkInput, LikeTargetType, User, UserRole};

    async fn setup() -> (SqlxCommentRepository, SqlitePool, i64, i64) {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Migrations failed");

        let users = SqlxUserRepository::new(pool.clone());
        let artist = users
            .create(&User::new(
                "artist".to_string(),
                "artist@example.com".to_string(),
                "hash".to_string(),
                UserRole::Artist,
            ))
            .await
            .expect("create artist failed");
        let visitor = users
            .create(&User::new(
                "visitor".to_string(),
                "visitor@example.com".to_string(),
                "hash".to_string(),
                UserRole::Community,
            ))
            .await
            .expect("create visitor failed");

        let artworks = SqlxArtworkRepository::new(pool.clone());
        let artwork = artworks
            .create(
                artist.id,
                CreateArtworkInput {
                    title: "Discussed".to_string(),
                    description: String::new(),
                    category: "painting".to_string(),
                    price_minor: 100,
                    currency: "USD".to_string(),
                    images: vec![],
                },
            )
            .await
            .expect("create artwork failed");

        (
            SqlxCommentRepository::new(pool.clone()),
            pool,
            artwork.id,
            visitor.id,
        )
    }

    #[tokio::test]
    async fn test_create_and_thread() {
        let (comments, _, artwork_id, visitor_id) = setup().await;

        let parent = comments
            .create(artwork_id, visitor_id, None, "Lovely piece")
            .await
            .expect("create failed");
        comments
            .create(artwork_id, visitor_id, Some(parent.id), "Agreed")
            .await
            .expect("create reply failed");

        let tree = comments
            .list_for_artwork(artwork_id, None)
            .await
            .expect("list failed");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].content, "Lovely piece");
        assert_eq!(tree[0].replies.len(), 1);
        assert_eq!(tree[0].replies[0].content, "Agreed");
    }

    #[tokio::test]
    async fn test_soft_delete_keeps_thread_shape() {
        let (comments, _, artwork_id, visitor_id) = setup().await;

        let parent = comments
            .create(artwork_id, visitor_id, None, "Will vanish")
            .await
            .expect("create failed");
        comments
            .create(artwork_id, visitor_id, Some(parent.id), "Still here")
            .await
            .expect("create reply failed");

        assert!(comments.soft_delete(parent.id).await.expect("delete failed"));

        let tree = comments
            .list_for_artwork(artwork_id, None)
            .await
            .expect("list failed");
        assert_eq!(tree.len(), 1);
        assert!(tree[0].deleted);
        assert_eq!(tree[0].content, "");
        assert_eq!(tree[0].replies.len(), 1);
        assert_eq!(
            comments
                .count_for_artwork(artwork_id)
                .await
                .expect("count failed"),
            1
        );
    }

    #[tokio::test]
    async fn test_like_flags() {
        let (comments, pool, artwork_id, visitor_id) = setup().await;

        let comment = comments
            .create(artwork_id, visitor_id, None, "Like me")
            .await
            .expect("create failed");
        let likes = SqlxLikeRepository::new(pool);
        likes
            .add(LikeTargetType::Comment, comment.id, visitor_id)
            .await
            .expect("like failed");

        let tree = comments
            .list_for_artwork(artwork_id, Some(visitor_id))
            .await
            .expect("list failed");
        assert_eq!(tree[0].like_count, 1);
        assert!(tree[0].is_liked);

        let tree = comments
            .list_for_artwork(artwork_id, None)
            .await
            .expect("list failed");
        assert!(!tree[0].is_liked);
    }
}
