//! Per-connection protocol session.
//!
//! `Unauthenticated → Registered → Closed`:
//!
//! - Authentication happens before the upgrade (see `websocket_handler`); a
//!   failure never creates a session or any Hub state.
//! - [`ConnectionSession::open`] registers the connection with the Hub.
//! - [`ConnectionSession::close`] consumes the session and unregisters it, so
//!   teardown runs once per session.

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, MessageBody, RoomKey, UserId},
    infrastructure::{
        dto::websocket::InboundFrame,
        hub::{ClientRecord, outbound::ConnectionWriter},
    },
    ui::state::AppState,
};

pub struct ConnectionSession {
    state: Arc<AppState>,
    connection_id: ConnectionId,
    user_id: UserId,
}

impl ConnectionSession {
    /// Register an authenticated connection and start its delivery loop.
    pub async fn open(
        state: Arc<AppState>,
        user_id: UserId,
        writer: Box<dyn ConnectionWriter>,
    ) -> (Self, Arc<ClientRecord>) {
        let connection_id = ConnectionId::next();
        let record = state
            .hub
            .register(connection_id, user_id.clone(), writer)
            .await;
        (
            Self {
                state,
                connection_id,
                user_id,
            },
            record,
        )
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Handle one inbound text frame. Bad frames are logged and skipped.
    pub async fn handle_text(&self, text: &str) {
        let frame = match serde_json::from_str::<InboundFrame>(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(
                    "Ignoring malformed frame from '{}': {}",
                    self.connection_id,
                    e
                );
                return;
            }
        };

        match &frame {
            InboundFrame::Join { .. } => {
                if let Some(room) = self.target_room(&frame) {
                    self.state.hub.join(self.connection_id, room).await;
                }
            }
            InboundFrame::Leave { .. } => {
                if let Some(room) = self.target_room(&frame) {
                    self.state.hub.leave(self.connection_id, &room).await;
                }
            }
            InboundFrame::MessageNew { .. } => self.send_message(&frame).await,
            InboundFrame::Unknown => {
                // echo back as a debugging aid
                tracing::debug!(
                    "Echoing unrecognized frame from '{}': {}",
                    self.connection_id,
                    text
                );
                self.state
                    .hub
                    .push_to(self.connection_id, Arc::from(text))
                    .await;
            }
        }
    }

    async fn send_message(&self, frame: &InboundFrame) {
        let Some(room) = self.target_room(frame) else {
            return;
        };
        let body = match MessageBody::new(frame.body().unwrap_or_default().to_string()) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(
                    "Dropping message from '{}' to '{}': {}",
                    self.connection_id,
                    room,
                    e
                );
                return;
            }
        };

        self.state
            .send_message_usecase
            .execute(room, self.user_id.clone(), body)
            .await;
    }

    fn target_room(&self, frame: &InboundFrame) -> Option<RoomKey> {
        let room = frame
            .target_room()
            .map(|room| RoomKey::new(room.to_string()));
        match room {
            Some(Ok(room)) => Some(room),
            _ => {
                tracing::warn!(
                    "Ignoring frame without a room from '{}'",
                    self.connection_id
                );
                None
            }
        }
    }

    /// Leave every room and stop delivery.
    pub async fn close(self) {
        self.state.hub.unregister(self.connection_id).await;
        tracing::info!(
            "Session '{}' of '{}' closed",
            self.connection_id,
            self.user_id
        );
    }
}
