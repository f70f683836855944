//! Admin API endpoints
//!
//! User moderation, order oversight and refunds, content removal, and
//! platform statistics. Every route here sits behind the admin middleware.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::str::FromStr;

use crate::api::common::{clamp_pagination, default_page, default_page_size};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{OrderResponse, UserResponse};
use crate::models::{OrderStatus, PagedResult, UserRole, UserStatus};
use crate::services::analytics::PlatformStats;

/// Build the admin router (requires auth + admin middleware)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}/status", put(set_user_status))
        .route("/users/{id}/role", put(set_user_role))
        .route("/users/{id}/rating", put(set_user_rating))
        .route("/orders", get(list_orders))
        .route("/orders/{id}/refund", post(refund_order))
        .route("/artworks/{id}", delete(delete_artwork))
        .route("/comments/{id}", delete(delete_comment))
        .route("/stats", get(platform_stats))
}

/// Query parameters for the user listing
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    pub role: Option<String>,
    pub status: Option<String>,
}

/// GET /api/v1/admin/users
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<PagedResult<UserResponse>>, ApiError> {
    let role = query
        .role
        .as_deref()
        .map(UserRole::from_str)
        .transpose()
        .map_err(|e| ApiError::validation_error(e.to_string()))?;
    let status = query
        .status
        .as_deref()
        .map(UserStatus::from_str)
        .transpose()
        .map_err(|e| ApiError::validation_error(e.to_string()))?;

    let (page, page_size) = clamp_pagination(query.page, query.page_size);
    let (users, total) = state
        .user_service
        .list_users(page, page_size, role, status)
        .await?;

    let page = PagedResult::new(users, total, page, page_size);
    Ok(Json(page.map(Into::into)))
}

/// Request body for banning or unbanning a user
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: UserStatus,
}

/// PUT /api/v1/admin/users/{id}/status
///
/// Banning revokes every session the account holds. Admins cannot be banned.
async fn set_user_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.user_service.set_status(id, body.status).await?;
    Ok(Json(user.into()))
}

/// Request body for changing a user's role
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: UserRole,
}

/// PUT /api/v1/admin/users/{id}/role
async fn set_user_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.user_service.set_role(id, body.role).await?;
    Ok(Json(user.into()))
}

/// Request body for setting an artist's rating
#[derive(Debug, Deserialize)]
pub struct SetRatingRequest {
    pub rating: f64,
}

/// PUT /api/v1/admin/users/{id}/rating
async fn set_user_rating(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<SetRatingRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.user_service.set_rating(id, body.rating).await?;
    Ok(Json(user.into()))
}

/// Query parameters for the order listing
#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    pub status: Option<String>,
}

/// GET /api/v1/admin/orders
async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<PagedResult<OrderResponse>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(OrderStatus::from_str)
        .transpose()
        .map_err(|e| ApiError::validation_error(e.to_string()))?;

    let (page, page_size) = clamp_pagination(query.page, query.page_size);
    let (orders, total) = state
        .checkout_service
        .list_all_orders(page, page_size, status)
        .await?;

    let page = PagedResult::new(orders, total, page, page_size);
    Ok(Json(page.map(Into::into)))
}

/// POST /api/v1/admin/orders/{id}/refund
///
/// Paid orders only; the sold artworks go back on sale.
async fn refund_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.checkout_service.refund(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/admin/artworks/{id}
async fn delete_artwork(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.artwork_service.delete(&user.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/admin/comments/{id}
async fn delete_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.comment_service.delete(&user.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/stats
async fn platform_stats(
    State(state): State<AppState>,
) -> Result<Json<PlatformStats>, ApiError> {
    let stats = state.analytics_service.platform_stats().await?;
    Ok(Json(stats))
}
