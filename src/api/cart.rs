//! Cart API endpoints
//!
//! The cart is per-user and holds unique artworks; everything here requires
//! authentication.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::CartItemDetail;

/// Build cart routes (requires auth middleware)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/", delete(clear_cart))
        .route("/items", post(add_item))
        .route("/items/{artwork_id}", delete(remove_item))
}

/// Cart contents with a precomputed total over still-purchasable items
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItemDetail>,
    pub total_minor: i64,
}

/// GET /api/v1/cart
async fn get_cart(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<CartResponse>, ApiError> {
    let items = state.cart_service.items(user.0.id).await?;
    let total_minor = items
        .iter()
        .filter(|i| i.is_purchasable())
        .map(|i| i.price_minor)
        .sum();

    Ok(Json(CartResponse { items, total_minor }))
}

/// Request body for adding a cart item
#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub artwork_id: i64,
}

/// POST /api/v1/cart/items
async fn add_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<AddCartItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.cart_service.add(user.0.id, body.artwork_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/cart/items/{artwork_id}
async fn remove_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(artwork_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.cart_service.remove(user.0.id, artwork_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/cart
async fn clear_cart(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    state.cart_service.clear(user.0.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
