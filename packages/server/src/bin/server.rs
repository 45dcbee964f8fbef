//! Tsudoi chat fan-out server.
//!
//! Authenticated WebSocket clients join rooms and receive every message
//! sent to them, over WebSocket or the REST API.
//!
//! Run with:
//! ```not_rust
//! JWT_SECRET=change-me cargo run --bin tsudoi-server
//! JWT_SECRET=change-me cargo run --bin tsudoi-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use tsudoi_server::{
    config::ServerConfig,
    infrastructure::{auth::JwtAuthenticator, hub::Hub, repository::InMemoryMessageLog},
    ui::{AppState, Server},
    usecase::{GetRoomHistoryUseCase, SendMessageUseCase},
};
use tsudoi_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }
    let cors_origin = match config.cors_origin() {
        Ok(origin) => origin,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize dependencies in order:
    // 1. Hub and MessageLog
    // 2. Authenticator
    // 3. UseCases
    // 4. AppState
    // 5. Server

    // 1. Create Hub (connection / room registry) and MessageLog (in-memory)
    let hub = Hub::new(config.queue_capacity);
    let message_log = Arc::new(InMemoryMessageLog::new());
    tracing::info!(
        "Hub created with outbound queue capacity {}",
        hub.queue_capacity()
    );

    // 2. Create Authenticator (HS256 JWT)
    let authenticator = Arc::new(JwtAuthenticator::new(config.jwt_secret.as_bytes()));

    // 3. Create UseCases
    let send_message_usecase = Arc::new(SendMessageUseCase::new(
        message_log.clone(),
        Arc::new(hub.clone()),
    ));
    let get_room_history_usecase = Arc::new(GetRoomHistoryUseCase::new(message_log));

    // 4. Create AppState
    let app_state = Arc::new(AppState {
        hub,
        authenticator,
        send_message_usecase,
        get_room_history_usecase,
    });

    // 5. Create and run the server
    let server = Server::new(app_state, cors_origin);
    if let Err(e) = server.run(config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
