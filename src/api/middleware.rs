//! API middleware
//!
//! Session-token authentication, role checks, and the shared JSON error
//! envelope used by every endpoint.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::User;
use crate::services::user::{UserService, UserServiceError};
use crate::services::ServiceError;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::SqlitePool,
    pub user_service: Arc<UserService>,
    pub artwork_service: Arc<crate::services::artwork::ArtworkService>,
    pub cart_service: Arc<crate::services::cart::CartService>,
    pub checkout_service: Arc<crate::services::checkout::CheckoutService>,
    pub comment_service: Arc<crate::services::comment::CommentService>,
    pub follow_service: Arc<crate::services::follow::FollowService>,
    pub message_service: Arc<crate::services::message::MessageService>,
    pub exhibition_service: Arc<crate::services::exhibition::ExhibitionService>,
    pub analytics_service: Arc<crate::services::analytics::AnalyticsService>,
    pub rate_limiter: Arc<crate::services::rate_limiter::LoginRateLimiter>,
    /// Shared secret for payment webhook signature checks
    pub webhook_secret: Arc<String>,
}

/// Authenticated user extracted from request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Optionally authenticated user; never rejects.
///
/// Routes behind `optional_auth` use this to personalize public responses
/// (like flags on comment threads) for logged-in callers.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl<S> axum::extract::FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|au| au.0.clone()),
        ))
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn rate_limited(message: impl Into<String>, retry_after_secs: u64) -> Self {
        Self::with_details(
            "RATE_LIMIT",
            message,
            serde_json::json!({ "retry_after": retry_after_secs }),
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "USER_BANNED" => StatusCode::FORBIDDEN,
            "RATE_LIMIT" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::validation_error(msg),
            ServiceError::NotFound(msg) => Self::not_found(msg),
            ServiceError::Forbidden(msg) => Self::forbidden(msg),
            ServiceError::Conflict(msg) => Self::conflict(msg),
            ServiceError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                Self::internal_error("Internal server error")
            }
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::AuthenticationError(msg) => Self::unauthorized(msg),
            UserServiceError::Banned => Self::new("USER_BANNED", "Account is banned"),
            UserServiceError::ValidationError(msg) => Self::validation_error(msg),
            UserServiceError::UserExists(msg) => Self::conflict(msg),
            UserServiceError::NotFound => Self::not_found("User not found"),
            UserServiceError::InternalError(err) => {
                tracing::error!("Internal error: {:#}", err);
                Self::internal_error("Internal server error")
            }
        }
    }
}

/// Extract session token from request
fn extract_session_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Optional authentication middleware
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(&request) {
        if let Ok(Some(user)) = state.user_service.validate_session(&token).await {
            request.extensions_mut().insert(AuthenticatedUser(user));
        }
    }
    next.run(request).await
}

/// Admin authorization middleware
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_admin() {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};

    fn create_request_with_auth(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    fn create_request_with_cookie(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(header::COOKIE, format!("session={}", token))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_session_token_from_bearer() {
        let request = create_request_with_auth("test-token-123");
        assert_eq!(
            extract_session_token(&request),
            Some("test-token-123".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_from_cookie() {
        let request = create_request_with_cookie("test-token-456");
        assert_eq!(
            extract_session_token(&request),
            Some("test-token-456".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_bearer_priority() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer bearer-token")
            .header(header::COOKIE, "session=cookie-token")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            extract_session_token(&request),
            Some("bearer-token".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_none() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        assert!(extract_session_token(&request).is_none());
    }

    #[test]
    fn test_extract_session_token_invalid_bearer() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Basic invalid")
            .body(Body::empty())
            .unwrap();
        assert!(extract_session_token(&request).is_none());
    }

    #[test]
    fn test_api_error_codes() {
        assert_eq!(ApiError::unauthorized("x").error.code, "UNAUTHORIZED");
        assert_eq!(ApiError::forbidden("x").error.code, "FORBIDDEN");
        assert_eq!(ApiError::conflict("x").error.code, "CONFLICT");
        assert_eq!(ApiError::not_found("x").error.code, "NOT_FOUND");
    }

    #[test]
    fn test_api_error_with_details() {
        let details = serde_json::json!({"field": "username"});
        let error = ApiError::with_details("VALIDATION_ERROR", "Invalid", details.clone());
        assert_eq!(error.error.details, Some(details));
    }

    #[test]
    fn test_service_error_conversion() {
        let err: ApiError = ServiceError::NotFound("Artwork 3 not found".to_string()).into();
        assert_eq!(err.error.code, "NOT_FOUND");

        let err: ApiError = ServiceError::Conflict("already reserved".to_string()).into();
        assert_eq!(err.error.code, "CONFLICT");

        let err: ApiError = UserServiceError::Banned.into();
        assert_eq!(err.error.code, "USER_BANNED");
    }

    #[tokio::test]
    async fn test_extractors_read_request_extensions() {
        use crate::models::UserRole;
        use axum::extract::FromRequestParts;

        let (mut parts, _) = Request::builder()
            .uri("/test")
            .body(Body::empty())
            .unwrap()
            .into_parts();

        assert!(AuthenticatedUser::from_request_parts(&mut parts, &())
            .await
            .is_err());
        let MaybeUser(viewer) = MaybeUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(viewer.is_none());

        let user = User::new(
            "alice".to_string(),
            "alice@example.com".to_string(),
            "hash".to_string(),
            UserRole::Community,
        );
        parts.extensions.insert(AuthenticatedUser(user));

        let extracted = AuthenticatedUser::from_request_parts(&mut parts, &())
            .await
            .expect("extract failed");
        assert_eq!(extracted.0.username, "alice");
        let MaybeUser(viewer) = MaybeUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(viewer.is_some());
    }
}
