//! Exhibition API endpoints
//!
//! Physical and virtual exhibitions share one model and one management
//! surface (`/exhibitions`); browsing is split into `/exhibitions` and
//! `/virtual-exhibitions` namespaces, and only virtual events accept visits.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{clamp_pagination, default_page, default_page_size};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::ExhibitionResponse;
use crate::models::{
    CreateExhibitionInput, ExhibitionKind, PagedResult, Registrant, UpdateExhibitionInput,
};

/// Build public exhibition routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/exhibitions", get(list_physical))
        .route("/exhibitions/{id}", get(get_exhibition))
        .route("/virtual-exhibitions", get(list_virtual))
        .route("/virtual-exhibitions/{id}", get(get_exhibition))
        .route("/virtual-exhibitions/{id}/visit", post(visit))
}

/// Build protected exhibition routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/exhibitions", post(create_exhibition))
        .route("/exhibitions/{id}", put(update_exhibition))
        .route("/exhibitions/{id}", delete(delete_exhibition))
        .route("/exhibitions/{id}/register", post(register))
        .route("/exhibitions/{id}/register", delete(unregister))
        .route("/exhibitions/{id}/registration", get(registration_state))
        .route("/exhibitions/{id}/registrants", get(list_registrants))
}

/// Query parameters for exhibition listings
#[derive(Debug, Deserialize)]
pub struct ListExhibitionsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Only events that have not ended yet
    #[serde(default)]
    pub upcoming_only: bool,
}

/// GET /api/v1/exhibitions
async fn list_physical(
    State(state): State<AppState>,
    Query(query): Query<ListExhibitionsQuery>,
) -> Result<Json<PagedResult<ExhibitionResponse>>, ApiError> {
    list_by_kind(&state, ExhibitionKind::Physical, query).await
}

/// GET /api/v1/virtual-exhibitions
async fn list_virtual(
    State(state): State<AppState>,
    Query(query): Query<ListExhibitionsQuery>,
) -> Result<Json<PagedResult<ExhibitionResponse>>, ApiError> {
    list_by_kind(&state, ExhibitionKind::Virtual, query).await
}

async fn list_by_kind(
    state: &AppState,
    kind: ExhibitionKind,
    query: ListExhibitionsQuery,
) -> Result<Json<PagedResult<ExhibitionResponse>>, ApiError> {
    let (page, page_size) = clamp_pagination(query.page, query.page_size);
    let page = state
        .exhibition_service
        .list(kind, query.upcoming_only, page, page_size)
        .await?;
    Ok(Json(page.map(Into::into)))
}

/// GET /api/v1/exhibitions/{id}
///
/// Bumps the view counter on every fetch.
async fn get_exhibition(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ExhibitionResponse>, ApiError> {
    let exhibition = state.exhibition_service.get(id, true).await?;
    Ok(Json(exhibition.into()))
}

/// POST /api/v1/exhibitions
async fn create_exhibition(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(input): Json<CreateExhibitionInput>,
) -> Result<impl IntoResponse, ApiError> {
    let exhibition = state.exhibition_service.create(&user.0, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ExhibitionResponse::from(exhibition)),
    ))
}

/// PUT /api/v1/exhibitions/{id}
async fn update_exhibition(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateExhibitionInput>,
) -> Result<Json<ExhibitionResponse>, ApiError> {
    let exhibition = state.exhibition_service.update(&user.0, id, input).await?;
    Ok(Json(exhibition.into()))
}

/// DELETE /api/v1/exhibitions/{id}
async fn delete_exhibition(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.exhibition_service.delete(&user.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/exhibitions/{id}/register
async fn register(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.exhibition_service.register(user.0.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/exhibitions/{id}/register
async fn unregister(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.exhibition_service.unregister(user.0.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Response for the registration-state check
#[derive(Debug, Serialize)]
pub struct RegistrationStateResponse {
    pub registered: bool,
}

/// GET /api/v1/exhibitions/{id}/registration
async fn registration_state(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<RegistrationStateResponse>, ApiError> {
    let registered = state.exhibition_service.is_registered(user.0.id, id).await?;
    Ok(Json(RegistrationStateResponse { registered }))
}

/// GET /api/v1/exhibitions/{id}/registrants
///
/// Organizer and admin only.
async fn list_registrants(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Registrant>>, ApiError> {
    let registrants = state.exhibition_service.registrants(&user.0, id).await?;
    Ok(Json(registrants))
}

/// POST /api/v1/virtual-exhibitions/{id}/visit
///
/// Virtual events only; returns the updated exhibition.
async fn visit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ExhibitionResponse>, ApiError> {
    let exhibition = state.exhibition_service.visit(id).await?;
    Ok(Json(exhibition.into()))
}
