//! Domain layer for the chat fan-out server.
//!
//! This module contains value objects, entities and the traits of the
//! external collaborators (message log, authentication, message pushing).
//! It does not depend on transport or storage details.

pub mod auth;
pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use auth::Authenticator;
pub use entity::{ChatMessage, RoomEvent};
pub use error::{AuthError, RepositoryError, ValueObjectError};
pub use message_pusher::MessagePusher;
pub use repository::MessageLog;
pub use value_object::{
    ConnectionId, GroupId, MessageBody, MessageId, RoomKey, Timestamp, UserId,
};
