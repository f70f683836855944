//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api/v1`. Routes come in three groups:
//! public (catalog browsing, profiles, exhibitions, webhooks), protected
//! (anything acting as a user), and admin.

pub mod admin;
pub mod analytics;
pub mod artworks;
pub mod auth;
pub mod cart;
pub mod comments;
pub mod common;
pub mod exhibitions;
pub mod messages;
pub mod middleware;
pub mod orders;
pub mod responses;
pub mod users;
pub mod webhooks;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser, MaybeUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .nest("/admin", admin::router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not admin)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/users", users::protected_router())
        .nest("/artworks", artworks::protected_router())
        .nest("/cart", cart::router())
        .nest("/messages", messages::router())
        .nest("/analytics", analytics::router())
        .merge(comments::protected_router())
        .merge(orders::router())
        .merge(exhibitions::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes; optional auth personalizes responses for logged-in
    // callers (viewer like flags, owner catalog views)
    Router::new()
        .nest("/auth", auth::public_router())
        .nest("/users", users::public_router())
        .nest("/artworks", artworks::public_router())
        .nest("/webhooks", webhooks::router())
        .merge(comments::public_router())
        .merge(exhibitions::public_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ))
        .merge(admin_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
