use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::repository::MessagingRepository;
use super::service::{ConversationSeed, MessagingError, MessagingService};
use crate::domain::{ConversationId, UserId};

/// Router builder exposing HTTP endpoints for the conversation relay.
pub fn messaging_router<R>(service: Arc<MessagingService<R>>) -> Router
where
    R: MessagingRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/conversations",
            post(open_handler::<R>).get(inbox_handler::<R>),
        )
        .route(
            "/api/v1/conversations/:conversation_id/messages",
            post(send_handler::<R>).get(thread_handler::<R>),
        )
        .route(
            "/api/v1/conversations/:conversation_id/read",
            post(mark_read_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenRequest {
    pub(crate) me: UserId,
    pub(crate) other: UserId,
    #[serde(flatten)]
    pub(crate) seed: ConversationSeed,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InboxParams {
    pub(crate) user: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendRequest {
    pub(crate) sender: UserId,
    pub(crate) text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MarkReadRequest {
    pub(crate) user: UserId,
}

pub(crate) async fn open_handler<R>(
    State(service): State<Arc<MessagingService<R>>>,
    axum::Json(request): axum::Json<OpenRequest>,
) -> Response
where
    R: MessagingRepository + 'static,
{
    match service
        .find_or_create(&request.me, &request.other, request.seed)
        .await
    {
        Ok(conversation) => (StatusCode::OK, axum::Json(conversation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn inbox_handler<R>(
    State(service): State<Arc<MessagingService<R>>>,
    Query(params): Query<InboxParams>,
) -> Response
where
    R: MessagingRepository + 'static,
{
    match service.conversations_for(&params.user).await {
        Ok(conversations) => (StatusCode::OK, axum::Json(conversations)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn send_handler<R>(
    State(service): State<Arc<MessagingService<R>>>,
    Path(conversation_id): Path<String>,
    axum::Json(request): axum::Json<SendRequest>,
) -> Response
where
    R: MessagingRepository + 'static,
{
    match service
        .send(
            &ConversationId(conversation_id),
            &request.sender,
            &request.text,
        )
        .await
    {
        Ok(message) => (StatusCode::CREATED, axum::Json(message)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn thread_handler<R>(
    State(service): State<Arc<MessagingService<R>>>,
    Path(conversation_id): Path<String>,
) -> Response
where
    R: MessagingRepository + 'static,
{
    match service.messages(&ConversationId(conversation_id)).await {
        Ok(messages) => (StatusCode::OK, axum::Json(messages)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn mark_read_handler<R>(
    State(service): State<Arc<MessagingService<R>>>,
    Path(conversation_id): Path<String>,
    axum::Json(request): axum::Json<MarkReadRequest>,
) -> Response
where
    R: MessagingRepository + 'static,
{
    match service
        .mark_read(&ConversationId(conversation_id), &request.user)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: MessagingError) -> Response {
    let status = match &error {
        MessagingError::ConversationNotFound => StatusCode::NOT_FOUND,
        MessagingError::NotParticipant => StatusCode::FORBIDDEN,
        MessagingError::EmptyMessage => StatusCode::UNPROCESSABLE_ENTITY,
        MessagingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
