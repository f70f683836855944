//! Analytics API endpoints
//!
//! The artist dashboard aggregates the caller's own catalog and sales.
//! Platform-wide stats live under the admin router.

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::services::analytics::ArtistDashboard;

/// Build analytics routes (requires auth middleware)
pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(artist_dashboard))
}

/// GET /api/v1/analytics/dashboard
async fn artist_dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ArtistDashboard>, ApiError> {
    if !user.0.is_artist() && !user.0.is_admin() {
        return Err(ApiError::forbidden("Artist account required"));
    }

    let dashboard = state.analytics_service.artist_dashboard(user.0.id).await?;
    Ok(Json(dashboard))
}
