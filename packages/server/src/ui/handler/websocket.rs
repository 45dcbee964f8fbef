//! WebSocket connection handlers.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Deserialize;

use crate::{
    domain::UserId,
    infrastructure::hub::{TransportError, outbound::ConnectionWriter},
    ui::{handler::session::ConnectionSession, state::AppState},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    #[serde(default)]
    pub token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let credential = query.token.unwrap_or_default();

    // Authenticate before the upgrade so a rejected peer never touches the Hub
    let user_id = match state.authenticator.authenticate(&credential) {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::warn!("Rejecting WebSocket connection: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    tracing::info!("User '{}' authenticated, upgrading connection", user_id);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

/// Outbound half of an axum WebSocket.
struct WebSocketWriter {
    sink: SplitSink<WebSocket, Message>,
}

#[async_trait]
impl ConnectionWriter for WebSocketWriter {
    async fn write(&mut self, payload: &str) -> Result<(), TransportError> {
        self.sink
            .send(Message::Text(payload.to_string().into()))
            .await
            .map_err(|e| TransportError::WriteFailed(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.sink.close().await {
            tracing::debug!("Error while closing WebSocket: {}", e);
        }
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: UserId) {
    let (sender, mut receiver) = socket.split();

    let (session, record) =
        ConnectionSession::open(state, user_id, Box::new(WebSocketWriter { sink: sender })).await;
    tracing::info!(
        "Session '{}' opened for '{}'",
        session.connection_id(),
        session.user_id()
    );

    // Resolves when the Hub tears this connection down (e.g. delivery failure)
    let closed = record.closed();
    drop(record);
    tokio::pin!(closed);

    loop {
        let message = tokio::select! {
            _ = &mut closed => {
                tracing::debug!("Session '{}' closed by the hub", session.connection_id());
                break;
            }
            next = receiver.next() => match next {
                Some(Ok(message)) => message,
                Some(Err(e)) => {
                    tracing::warn!(
                        "WebSocket read error on '{}': {}",
                        session.connection_id(),
                        e
                    );
                    break;
                }
                None => break,
            },
        };

        match message {
            Message::Text(text) => session.handle_text(text.as_str()).await,
            Message::Close(_) => {
                tracing::debug!("Session '{}' sent close", session.connection_id());
                break;
            }
            Message::Binary(_) => {
                tracing::debug!(
                    "Ignoring binary frame on '{}'",
                    session.connection_id()
                );
            }
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    session.close().await;
}
