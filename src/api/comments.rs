//! Comment API endpoints
//!
//! Threads are read publicly (with per-viewer like flags when a session is
//! present); posting, deleting, and liking require authentication.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::artworks::LikeResponse;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, MaybeUser};
use crate::models::{CommentWithMeta, CreateCommentInput};

/// Build public comment routes
pub fn public_router() -> Router<AppState> {
    Router::new().route("/artworks/{id}/comments", get(list_comments))
}

/// Build protected comment routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/artworks/{id}/comments", post(create_comment))
        .route("/comments/{id}", delete(delete_comment))
        .route("/comments/{id}/like", post(like_comment))
        .route("/comments/{id}/like", delete(unlike_comment))
}

/// GET /api/v1/artworks/{id}/comments
async fn list_comments(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(artwork_id): Path<i64>,
) -> Result<Json<Vec<CommentWithMeta>>, ApiError> {
    let comments = state
        .comment_service
        .list(artwork_id, viewer.map(|u| u.id))
        .await?;
    Ok(Json(comments))
}

/// Request body for posting a comment
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
    pub parent_id: Option<i64>,
}

/// POST /api/v1/artworks/{id}/comments
async fn create_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(artwork_id): Path<i64>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .comment_service
        .create(
            &user.0,
            CreateCommentInput {
                artwork_id,
                parent_id: body.parent_id,
                content: body.content,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// DELETE /api/v1/comments/{id}
///
/// Author, the artwork's artist, or an admin. Soft delete.
async fn delete_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.comment_service.delete(&user.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/comments/{id}/like
async fn like_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<LikeResponse>, ApiError> {
    let like_count = state.comment_service.like(user.0.id, id).await?;
    Ok(Json(LikeResponse {
        liked: true,
        like_count,
    }))
}

/// DELETE /api/v1/comments/{id}/like
async fn unlike_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<LikeResponse>, ApiError> {
    let like_count = state.comment_service.unlike(user.0.id, id).await?;
    Ok(Json(LikeResponse {
        liked: false,
        like_count,
    }))
}
