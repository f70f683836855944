//! Direct message API endpoints
//!
//! Conversations are two-party and auto-created on first message. Fetching a
//! conversation's messages also marks it read for the caller.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::PaginationQuery;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Conversation, ConversationSummary, Message, PagedResult};

/// Build message routes (requires auth middleware)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_conversations))
        .route("/", post(send_message))
        .route("/unread-count", get(unread_count))
        .route("/with/{user_id}", post(open_conversation))
        .route("/{conversation_id}", get(list_messages))
        .route("/{conversation_id}/read", post(mark_read))
}

/// GET /api/v1/messages
async fn list_conversations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    let conversations = state.message_service.conversations(user.0.id).await?;
    Ok(Json(conversations))
}

/// Request body for sending a message
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub recipient_id: i64,
    pub content: String,
}

/// POST /api/v1/messages
async fn send_message(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state
        .message_service
        .send(user.0.id, body.recipient_id, &body.content)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// POST /api/v1/messages/with/{user_id}
///
/// Returns the existing conversation with the user, creating it if needed.
async fn open_conversation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Conversation>, ApiError> {
    let conversation = state.message_service.open(user.0.id, user_id).await?;
    Ok(Json(conversation))
}

/// GET /api/v1/messages/{conversation_id}
///
/// Newest messages first. Marks the conversation read for the caller.
async fn list_messages(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(conversation_id): Path<i64>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<PagedResult<Message>>, ApiError> {
    let (page, page_size) = pagination.clamped();
    let page = state
        .message_service
        .messages(user.0.id, conversation_id, page, page_size)
        .await?;
    Ok(Json(page))
}

/// POST /api/v1/messages/{conversation_id}/read
async fn mark_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(conversation_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .message_service
        .mark_read(user.0.id, conversation_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/messages/unread-count
async fn unread_count(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let unread = state.message_service.unread_count(user.0.id).await?;
    Ok(Json(serde_json::json!({ "unread": unread })))
}
