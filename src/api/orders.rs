//! Checkout and order API endpoints
//!
//! Checkout converts the caller's cart into a pending order and returns the
//! payment provider's hosted checkout URL. Payment confirmation arrives
//! asynchronously on the webhook route.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::common::PaginationQuery;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::OrderResponse;
use crate::models::PagedResult;

/// Build checkout and order routes (requires auth middleware)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout))
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/cancel", post(cancel_order))
}

/// Response for a started checkout
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order: OrderResponse,
    /// Hosted payment page to redirect the buyer to
    pub payment_url: String,
}

/// POST /api/v1/checkout
async fn checkout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.checkout_service.checkout(&user.0).await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order: result.order.into(),
            payment_url: result.payment_url,
        }),
    ))
}

/// GET /api/v1/orders
async fn list_orders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<PagedResult<OrderResponse>>, ApiError> {
    let (page, page_size) = pagination.clamped();
    let (orders, total) = state
        .checkout_service
        .list_orders(user.0.id, page, page_size)
        .await?;

    let page = PagedResult::new(orders, total, page, page_size);
    Ok(Json(page.map(Into::into)))
}

/// GET /api/v1/orders/{id}
async fn get_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.checkout_service.get_order(&user.0, id).await?;
    Ok(Json(order.into()))
}

/// POST /api/v1/orders/{id}/cancel
///
/// Only pending orders can be cancelled; reserved artworks go back on sale.
async fn cancel_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.checkout_service.cancel(&user.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
