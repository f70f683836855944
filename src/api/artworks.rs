//! Artwork API endpoints
//!
//! Public catalog browsing plus protected management and like routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::common::{clamp_pagination, default_page, default_page_size};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, MaybeUser};
use crate::api::responses::ArtworkResponse;
use crate::models::{
    ArtworkListParams, ArtworkSort, CreateArtworkInput, PagedResult, UpdateArtworkInput,
};

/// Build public artwork routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_artworks))
        .route("/{id}", get(get_artwork))
        .route("/{id}/view", post(record_view))
}

/// Build protected artwork routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_artwork))
        .route("/{id}", put(update_artwork))
        .route("/{id}", delete(delete_artwork))
        .route("/{id}/like", post(like_artwork))
        .route("/{id}/like", delete(unlike_artwork))
        .route("/{id}/like", get(like_state))
}

/// Query parameters for catalog listings
#[derive(Debug, Deserialize)]
pub struct ListArtworksQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    pub category: Option<String>,
    pub artist_id: Option<i64>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub search: Option<String>,
    pub sort: Option<String>,
    /// Include reserved and sold pieces; owner and admin only
    #[serde(default)]
    pub include_unavailable: bool,
}

/// GET /api/v1/artworks
async fn list_artworks(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<ListArtworksQuery>,
) -> Result<Json<PagedResult<ArtworkResponse>>, ApiError> {
    let sort = match query.sort.as_deref() {
        Some(s) => ArtworkSort::from_str(s)
            .map_err(|_| ApiError::validation_error(format!("Invalid sort order: {}", s)))?,
        None => ArtworkSort::default(),
    };

    // Only an artist looking at their own listings (or an admin) sees
    // reserved and sold pieces
    let include_unavailable = query.include_unavailable
        && viewer.as_ref().is_some_and(|u| {
            u.is_admin() || query.artist_id.is_some_and(|artist_id| artist_id == u.id)
        });

    let (page, page_size) = clamp_pagination(query.page, query.page_size);
    let params = ArtworkListParams {
        page,
        page_size,
        category: query.category,
        artist_id: query.artist_id,
        min_price: query.min_price,
        max_price: query.max_price,
        search: query.search,
        sort,
        include_unavailable,
    };

    let page = state.artwork_service.list(&params).await?;
    Ok(Json(page.map(Into::into)))
}

/// GET /api/v1/artworks/{id}
async fn get_artwork(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ArtworkResponse>, ApiError> {
    let artwork = state.artwork_service.get(id, false).await?;
    Ok(Json(artwork.into()))
}

/// POST /api/v1/artworks/{id}/view
///
/// Clients call this once per detail-page visit so cache hits and
/// prefetches do not inflate the counter.
async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.artwork_service.get(id, true).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/artworks
async fn create_artwork(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(input): Json<CreateArtworkInput>,
) -> Result<impl IntoResponse, ApiError> {
    let artwork = state.artwork_service.create(&user.0, input).await?;
    Ok((StatusCode::CREATED, Json(ArtworkResponse::from(artwork))))
}

/// PUT /api/v1/artworks/{id}
async fn update_artwork(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateArtworkInput>,
) -> Result<Json<ArtworkResponse>, ApiError> {
    let artwork = state.artwork_service.update(&user.0, id, input).await?;
    Ok(Json(artwork.into()))
}

/// DELETE /api/v1/artworks/{id}
async fn delete_artwork(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.artwork_service.delete(&user.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Response for like operations
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: i64,
}

/// POST /api/v1/artworks/{id}/like
async fn like_artwork(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<LikeResponse>, ApiError> {
    let like_count = state.artwork_service.like(user.0.id, id).await?;
    Ok(Json(LikeResponse {
        liked: true,
        like_count,
    }))
}

/// DELETE /api/v1/artworks/{id}/like
async fn unlike_artwork(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<LikeResponse>, ApiError> {
    let like_count = state.artwork_service.unlike(user.0.id, id).await?;
    Ok(Json(LikeResponse {
        liked: false,
        like_count,
    }))
}

/// GET /api/v1/artworks/{id}/like
async fn like_state(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let liked = state.artwork_service.is_liked(user.0.id, id).await?;
    Ok(Json(serde_json::json!({ "liked": liked })))
}
