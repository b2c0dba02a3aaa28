//! Chat endpoints.
//!
//! Chats live in the local store. Every endpoint requires a role from the
//! private group.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use concourse_auth::JwtValidator;
use concourse_chat::{ChatId, ChatService, CreateChatRequest, PageParams, UpdateChatRequest};
use concourse_core::RoleGroup;

use crate::context::RequestContext;
use crate::error::ApiError;
use crate::state::GatewayState;

/// List chats, one page at a time.
///
/// # Errors
///
/// Returns an error if the caller lacks access or the store fails.
pub async fn list_chats<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    context: RequestContext,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError>
where
    C: ChatService + 'static,
    V: JwtValidator + 'static,
{
    context.require(RoleGroup::Private, state.config.mode)?;
    let page = state.chats.list_chats(params).await?;
    Ok(Json(page))
}

/// Create a chat, owned by the caller unless the body names another user.
///
/// # Errors
///
/// Returns an error if the caller lacks access or the store fails.
pub async fn create_chat<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    context: RequestContext,
    Json(body): Json<CreateChatRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    C: ChatService + 'static,
    V: JwtValidator + 'static,
{
    let user = context.require(RoleGroup::Private, state.config.mode)?;
    let owner = body.user_id.unwrap_or(user.id);
    let chat = state.chats.create_chat(owner, body.title).await?;

    Ok((StatusCode::CREATED, Json(chat)))
}

/// Get a single chat.
///
/// # Errors
///
/// Returns an error if the caller lacks access or the chat doesn't exist.
pub async fn get_chat<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    context: RequestContext,
    Path(chat_id): Path<ChatId>,
) -> Result<impl IntoResponse, ApiError>
where
    C: ChatService + 'static,
    V: JwtValidator + 'static,
{
    context.require(RoleGroup::Private, state.config.mode)?;
    let chat = state.chats.get_chat(chat_id).await?;
    Ok(Json(chat))
}

/// Update a chat's title.
///
/// # Errors
///
/// Returns an error if the caller lacks access or the chat doesn't exist.
pub async fn update_chat<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    context: RequestContext,
    Path(chat_id): Path<ChatId>,
    Json(body): Json<UpdateChatRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    C: ChatService + 'static,
    V: JwtValidator + 'static,
{
    context.require(RoleGroup::Private, state.config.mode)?;
    let chat = state.chats.update_chat(chat_id, body).await?;
    Ok(Json(chat))
}

/// Delete a chat and its messages.
///
/// # Errors
///
/// Returns an error if the caller lacks access or the chat doesn't exist.
pub async fn delete_chat<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    context: RequestContext,
    Path(chat_id): Path<ChatId>,
) -> Result<impl IntoResponse, ApiError>
where
    C: ChatService + 'static,
    V: JwtValidator + 'static,
{
    context.require(RoleGroup::Private, state.config.mode)?;
    state.chats.delete_chat(chat_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
