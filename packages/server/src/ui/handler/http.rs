//! HTTP API endpoint handlers.

use std::{fmt::Display, sync::Arc};

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    domain::{GroupId, MessageBody, RoomKey, UserId},
    infrastructure::dto::{
        http::{ErrorDto, HistoryQuery, HubSnapshotDto, SendMessageRequest},
        websocket::MessageDto,
    },
    ui::state::AppState,
};

/// Error response rendered as `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl ApiError {
    fn bad_request(e: impl Display) -> Self {
        Self(StatusCode::BAD_REQUEST, e.to_string())
    }

    fn internal(e: impl Display) -> Self {
        Self(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError(status, error) = self;
        (status, Json(ErrorDto { error })).into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint listing live connections and room sizes (for testing purposes)
pub async fn debug_rooms(State(state): State<Arc<AppState>>) -> Json<HubSnapshotDto> {
    Json(HubSnapshotDto::from(state.hub.snapshot().await))
}

/// Send a direct message to a friend
pub async fn send_direct_message(
    State(state): State<Arc<AppState>>,
    Path(friend_id): Path<String>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let Json(request) = payload.map_err(ApiError::bad_request)?;
    let sender = UserId::new(request.sender).map_err(ApiError::bad_request)?;
    let friend = UserId::new(friend_id).map_err(ApiError::bad_request)?;
    let body = MessageBody::new(request.body).map_err(ApiError::bad_request)?;

    let room = RoomKey::direct(&sender, &friend);
    let message = state.send_message_usecase.execute(room, sender, body).await;

    Ok((StatusCode::CREATED, Json(MessageDto::from(&message))))
}

/// Send a message to a group
pub async fn send_group_message(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let Json(request) = payload.map_err(ApiError::bad_request)?;
    let group = GroupId::new(group_id).map_err(ApiError::bad_request)?;
    let sender = UserId::new(request.sender).map_err(ApiError::bad_request)?;
    let body = MessageBody::new(request.body).map_err(ApiError::bad_request)?;

    let room = RoomKey::group(&group);
    let message = state.send_message_usecase.execute(room, sender, body).await;

    Ok((StatusCode::CREATED, Json(MessageDto::from(&message))))
}

/// Get the history of a direct conversation (`?user_id=` names the other side)
pub async fn get_direct_history(
    State(state): State<Arc<AppState>>,
    Path(friend_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let user = UserId::new(query.user_id.unwrap_or_default()).map_err(ApiError::bad_request)?;
    let friend = UserId::new(friend_id).map_err(ApiError::bad_request)?;

    room_history(&state, &RoomKey::direct(&user, &friend)).await
}

/// Get the history of a group
pub async fn get_group_history(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let group = GroupId::new(group_id).map_err(ApiError::bad_request)?;

    room_history(&state, &RoomKey::group(&group)).await
}

async fn room_history(
    state: &AppState,
    room: &RoomKey,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let messages = state
        .get_room_history_usecase
        .execute(room)
        .await
        .map_err(ApiError::internal)?;

    // Domain Model から DTO への変換
    Ok(Json(messages.iter().map(MessageDto::from).collect()))
}
