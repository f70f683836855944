//! Authentication API endpoints
//!
//! - POST /api/v1/auth/register
//! - POST /api/v1/auth/login
//! - POST /api/v1/auth/logout
//! - GET  /api/v1/auth/me
//! - PUT  /api/v1/auth/profile
//! - PUT  /api/v1/auth/password

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::UserResponse;
use crate::models::UserRole;
use crate::services::user::{LoginInput, RegisterInput};

const SESSION_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// Request body for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// "artist" or "community"; defaults to community
    #[serde(default)]
    pub role: UserRole,
}

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
        .route("/profile", put(update_profile))
        .route("/password", put(change_password))
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let password = body.password.clone();
    let input = RegisterInput {
        username: body.username,
        email: body.email,
        password: body.password,
        role: body.role,
    };

    let user = state.user_service.register(input).await?;

    // Log the new user straight in
    let session = state
        .user_service
        .login(LoginInput {
            username_or_email: user.username.clone(),
            password,
        })
        .await?;

    let headers = session_cookie_headers(&session.id)?;

    Ok((
        StatusCode::CREATED,
        headers,
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // IP rate limit first, then per-account failed-attempt limit
    if let Some(ip) = extract_ip_address(&headers).and_then(|s| s.parse().ok()) {
        if state.rate_limiter.is_ip_limited(ip).await {
            return Err(ApiError::rate_limited("Too many requests, slow down", 60));
        }
        state.rate_limiter.record_ip_request(ip).await;
    }

    if state
        .rate_limiter
        .is_account_limited(&body.username_or_email)
        .await
    {
        return Err(ApiError::rate_limited(
            "Too many failed login attempts, try again later",
            900,
        ));
    }

    let session = match state
        .user_service
        .login(LoginInput {
            username_or_email: body.username_or_email.clone(),
            password: body.password,
        })
        .await
    {
        Ok(session) => session,
        Err(err) => {
            state
                .rate_limiter
                .record_failed_attempt(&body.username_or_email)
                .await;
            tracing::info!(account = %body.username_or_email, "Failed login attempt");
            return Err(err.into());
        }
    };

    state
        .rate_limiter
        .clear_account(&body.username_or_email)
        .await;

    let user = state
        .user_service
        .validate_session(&session.id)
        .await?
        .ok_or_else(|| ApiError::internal_error("Session validation failed"))?;

    let response_headers = session_cookie_headers(&session.id)?;

    Ok((
        response_headers,
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .or_else(|| {
            headers
                .get(header::COOKIE)
                .and_then(|h| h.to_str().ok())
                .and_then(|s| {
                    s.split(';')
                        .map(|c| c.trim())
                        .find_map(|c| c.strip_prefix("session="))
                })
        })
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    state.user_service.logout(token).await?;

    let clear_cookie = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";
    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, HeaderValue::from_static(clear_cookie));

    Ok((StatusCode::NO_CONTENT, response_headers))
}

/// GET /api/v1/auth/me
async fn get_current_user(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(user.0.into())
}

/// Request body for updating profile
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

/// PUT /api/v1/auth/profile
async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let updated = state
        .user_service
        .update_profile(user.0.id, body.display_name, body.bio, body.avatar)
        .await?;

    Ok(Json(updated.into()))
}

/// Request body for changing password
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// PUT /api/v1/auth/password
///
/// Changing the password revokes every session, including the current one.
async fn change_password(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .user_service
        .change_password(user.0.id, &body.current_password, &body.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

fn session_cookie_headers(token: &str) -> Result<HeaderMap, ApiError> {
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token, SESSION_MAX_AGE_SECS
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|_| ApiError::internal_error("Invalid session cookie"))?,
    );
    Ok(headers)
}

/// Extract the client IP from proxy headers
fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(ip) = forwarded_str.split(',').next() {
                return Some(ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}
