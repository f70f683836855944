//! Comment service
//!
//! Threaded comments on artworks, one reply level deep, with likes and
//! soft deletion.

use crate::db::repositories::{ArtworkRepository, CommentRepository, LikeRepository};
use crate::models::{Comment, CommentWithMeta, CreateCommentInput, LikeTargetType, User};
use crate::services::ServiceError;
use anyhow::Context;
use std::sync::Arc;

const CONTENT_MAX: usize = 2000;

pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository>,
    artwork_repo: Arc<dyn ArtworkRepository>,
    like_repo: Arc<dyn LikeRepository>,
}

impl CommentService {
    pub fn new(
        comment_repo: Arc<dyn CommentRepository>,
        artwork_repo: Arc<dyn ArtworkRepository>,
        like_repo: Arc<dyn LikeRepository>,
    ) -> Self {
        Self {
            comment_repo,
            artwork_repo,
            like_repo,
        }
    }

    /// Post a comment or a reply
    pub async fn create(
        &self,
        user: &User,
        input: CreateCommentInput,
    ) -> Result<Comment, ServiceError> {
        let content = input.content.trim();
        if content.is_empty() {
            return Err(ServiceError::Validation(
                "Comment cannot be empty".to_string(),
            ));
        }
        if content.len() > CONTENT_MAX {
            return Err(ServiceError::Validation(format!(
                "Comment too long (max {} characters)",
                CONTENT_MAX
            )));
        }

        let artwork = self
            .artwork_repo
            .get_by_id(input.artwork_id)
            .await
            .context("Failed to get artwork")?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Artwork {} not found", input.artwork_id))
            })?;

        if let Some(parent_id) = input.parent_id {
            let parent = self
                .comment_repo
                .get_by_id(parent_id)
                .await
                .context("Failed to get parent comment")?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Comment {} not found", parent_id))
                })?;
            if parent.artwork_id != artwork.id {
                return Err(ServiceError::Validation(
                    "Parent comment belongs to a different artwork".to_string(),
                ));
            }
            // Threads are one level deep
            if parent.parent_id.is_some() {
                return Err(ServiceError::Validation(
                    "Cannot reply to a reply".to_string(),
                ));
            }
        }

        Ok(self
            .comment_repo
            .create(artwork.id, user.id, input.parent_id, content)
            .await
            .context("Failed to create comment")?)
    }

    /// An artwork's comment thread
    pub async fn list(
        &self,
        artwork_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<Vec<CommentWithMeta>, ServiceError> {
        self.artwork_repo
            .get_by_id(artwork_id)
            .await
            .context("Failed to get artwork")?
            .ok_or_else(|| ServiceError::NotFound(format!("Artwork {} not found", artwork_id)))?;

        Ok(self
            .comment_repo
            .list_for_artwork(artwork_id, viewer_id)
            .await
            .context("Failed to list comments")?)
    }

    /// Soft-delete a comment. Allowed for its author, the artwork's artist,
    /// and admins.
    pub async fn delete(&self, user: &User, comment_id: i64) -> Result<(), ServiceError> {
        let comment = self
            .comment_repo
            .get_by_id(comment_id)
            .await
            .context("Failed to get comment")?
            .ok_or_else(|| ServiceError::NotFound(format!("Comment {} not found", comment_id)))?;

        let mut allowed = user.can_manage(comment.user_id);
        if !allowed {
            let artwork = self
                .artwork_repo
                .get_by_id(comment.artwork_id)
                .await
                .context("Failed to get artwork")?;
            allowed = artwork.map(|a| a.artist_id == user.id).unwrap_or(false);
        }
        if !allowed {
            return Err(ServiceError::Forbidden(
                "You cannot delete this comment".to_string(),
            ));
        }

        self.comment_repo
            .soft_delete(comment_id)
            .await
            .context("Failed to delete comment")?;
        Ok(())
    }

    /// Like a comment. Returns the new like count.
    pub async fn like(&self, user_id: i64, comment_id: i64) -> Result<i64, ServiceError> {
        self.comment_repo
            .get_by_id(comment_id)
            .await
            .context("Failed to get comment")?
            .ok_or_else(|| ServiceError::NotFound(format!("Comment {} not found", comment_id)))?;

        self.like_repo
            .add(LikeTargetType::Comment, comment_id, user_id)
            .await
            .context("Failed to add like")?;
        Ok(self
            .like_repo
            .count(LikeTargetType::Comment, comment_id)
            .await
            .context("Failed to count likes")?)
    }

    /// Remove a comment like. Returns the new like count.
    pub async fn unlike(&self, user_id: i64, comment_id: i64) -> Result<i64, ServiceError> {
        self.like_repo
            .remove(LikeTargetType::Comment, comment_id, user_id)
            .await
            .context("Failed to remove like")?;
        Ok(self
            .like_repo
            .count(LikeTargetType::Comment, comment_id)
            .await
            .context("Failed to count likes")?)
    }
}
