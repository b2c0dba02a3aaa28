//! Message endpoints and the chat exchange.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use concourse_auth::JwtValidator;
use concourse_chat::{
    ChatId, ChatService, CreateMessageRequest, ExchangeRequest, MessageId, PageParams,
    UpdateMessageRequest,
};
use concourse_core::RoleGroup;

use crate::context::RequestContext;
use crate::error::ApiError;
use crate::state::GatewayState;

// =============================================================================
// Messages
// =============================================================================

/// List messages across all chats.
///
/// # Errors
///
/// Returns an error if the caller lacks access or the store fails.
pub async fn list_messages<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    context: RequestContext,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError>
where
    C: ChatService + 'static,
    V: JwtValidator + 'static,
{
    context.require(RoleGroup::Private, state.config.mode)?;
    let page = state.chats.list_messages(params).await?;
    Ok(Json(page))
}

/// Get a single message.
///
/// # Errors
///
/// Returns an error if the caller lacks access or the message doesn't exist.
pub async fn get_message<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    context: RequestContext,
    Path(message_id): Path<MessageId>,
) -> Result<impl IntoResponse, ApiError>
where
    C: ChatService + 'static,
    V: JwtValidator + 'static,
{
    context.require(RoleGroup::Private, state.config.mode)?;
    let message = state.chats.get_message(message_id).await?;
    Ok(Json(message))
}

/// Append a message to a chat.
///
/// # Errors
///
/// Returns an error if the caller lacks access or the chat doesn't exist.
pub async fn create_message<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    context: RequestContext,
    Path(chat_id): Path<ChatId>,
    Json(body): Json<CreateMessageRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    C: ChatService + 'static,
    V: JwtValidator + 'static,
{
    context.require(RoleGroup::Private, state.config.mode)?;
    let message = state
        .chats
        .create_message(chat_id, body.role, body.content)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Update a message's role or content.
///
/// # Errors
///
/// Returns an error if the caller lacks access or the message doesn't exist.
pub async fn update_message<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    context: RequestContext,
    Path(message_id): Path<MessageId>,
    Json(body): Json<UpdateMessageRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    C: ChatService + 'static,
    V: JwtValidator + 'static,
{
    context.require(RoleGroup::Private, state.config.mode)?;
    let message = state.chats.update_message(message_id, body).await?;
    Ok(Json(message))
}

/// Delete a message.
///
/// # Errors
///
/// Returns an error if the caller lacks access or the message doesn't exist.
pub async fn delete_message<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    context: RequestContext,
    Path(message_id): Path<MessageId>,
) -> Result<impl IntoResponse, ApiError>
where
    C: ChatService + 'static,
    V: JwtValidator + 'static,
{
    context.require(RoleGroup::Private, state.config.mode)?;
    state.chats.delete_message(message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Exchange
// =============================================================================

/// Store the caller's message and the assistant's reply.
///
/// Responds with `[user_message, assistant_message]`.
///
/// # Errors
///
/// Returns an error if:
/// - The body's chat id differs from the path (400)
/// - The caller lacks access (403)
/// - The chat doesn't exist (404)
/// - The reply generator fails
pub async fn exchange<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    context: RequestContext,
    Path(chat_id): Path<ChatId>,
    Json(body): Json<ExchangeRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    C: ChatService + 'static,
    V: JwtValidator + 'static,
{
    if body.chat_id != chat_id {
        return Err(ApiError::BadRequest(format!(
            "chat id {} in body does not match chat id {chat_id} in path",
            body.chat_id
        )));
    }

    let user = context.require(RoleGroup::Common, state.config.mode)?;
    let messages = state
        .exchange
        .exchange(user.id, chat_id, &body.message)
        .await?;

    Ok((StatusCode::CREATED, Json(messages)))
}
