//! UseCase layer.
//!
//! Entry points shared by the WebSocket session and the HTTP handlers, so
//! that every message reaches clients through the same broadcast path.

pub mod error;
pub mod get_room_history;
pub mod send_message;

pub use error::GetRoomHistoryError;
pub use get_room_history::GetRoomHistoryUseCase;
pub use send_message::SendMessageUseCase;
