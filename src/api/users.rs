//! User profile and follow API endpoints
//!
//! Profiles and follow edges are keyed by user id; a `by-username` lookup
//! covers profile links.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::common::PaginationQuery;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::PublicUserResponse;
use crate::models::{FollowUser, PagedResult};

/// Build public user routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_profile))
        .route("/by-username/{username}", get(get_profile_by_username))
        .route("/{id}/followers", get(list_followers))
        .route("/{id}/following", get(list_following))
}

/// Build protected user routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/{id}/follow", post(follow))
        .route("/{id}/follow", delete(unfollow))
        .route("/{id}/follow", get(follow_state))
}

/// GET /api/v1/users/{id}
async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PublicUserResponse>, ApiError> {
    let user = state
        .user_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(user.into()))
}

/// GET /api/v1/users/by-username/{username}
async fn get_profile_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PublicUserResponse>, ApiError> {
    let user = state
        .user_service
        .get_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(user.into()))
}

/// GET /api/v1/users/{id}/followers
async fn list_followers(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<PagedResult<FollowUser>>, ApiError> {
    let (page, page_size) = pagination.clamped();
    let page = state.follow_service.followers(id, page, page_size).await?;
    Ok(Json(page))
}

/// GET /api/v1/users/{id}/following
async fn list_following(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<PagedResult<FollowUser>>, ApiError> {
    let (page, page_size) = pagination.clamped();
    let page = state.follow_service.following(id, page, page_size).await?;
    Ok(Json(page))
}

/// POST /api/v1/users/{id}/follow
async fn follow(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.follow_service.follow(user.0.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/users/{id}/follow
async fn unfollow(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.follow_service.unfollow(user.0.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Response for the follow-state check
#[derive(Debug, Serialize)]
pub struct FollowStateResponse {
    pub following: bool,
}

/// GET /api/v1/users/{id}/follow
async fn follow_state(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<FollowStateResponse>, ApiError> {
    let following = state.follow_service.is_following(user.0.id, id).await?;
    Ok(Json(FollowStateResponse { following }))
}
