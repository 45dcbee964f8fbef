//! Domain entities.

use super::value_object::{MessageBody, MessageId, RoomKey, Timestamp, UserId};

/// A chat message, immutable once created.
///
/// Ownership moves to the message log; a copy travels inside a [`RoomEvent`]
/// for fan-out. The Hub does not retain messages after dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub room: RoomKey,
    pub sender: UserId,
    pub body: MessageBody,
    pub created_at: Timestamp,
}

impl ChatMessage {
    /// Create a new message with a freshly generated ID.
    pub fn new(room: RoomKey, sender: UserId, body: MessageBody, created_at: Timestamp) -> Self {
        Self {
            id: MessageId::generate(),
            room,
            sender,
            body,
            created_at,
        }
    }
}

/// Events fanned out to the members of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// A message was created in the room.
    MessageNew { room: RoomKey, message: ChatMessage },
}

impl RoomEvent {
    /// The room whose members receive this event.
    pub fn room(&self) -> &RoomKey {
        match self {
            RoomEvent::MessageNew { room, .. } => room,
        }
    }
}
