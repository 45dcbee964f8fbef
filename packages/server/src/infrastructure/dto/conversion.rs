//! Conversion logic between DTOs and domain entities.

use tsudoi_shared::time::timestamp_to_rfc3339;

use crate::{
    domain::{ChatMessage, RoomEvent},
    infrastructure::{
        dto::{
            http::{HubSnapshotDto, RoomSizeDto},
            websocket::{MessageDto, OutboundEnvelope},
        },
        hub::HubSnapshot,
    },
};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&ChatMessage> for MessageDto {
    fn from(model: &ChatMessage) -> Self {
        Self {
            id: model.id.as_str().to_string(),
            sender: model.sender.as_str().to_string(),
            body: model.body.as_str().to_string(),
            created_at: timestamp_to_rfc3339(model.created_at.value()),
        }
    }
}

impl From<&RoomEvent> for OutboundEnvelope {
    fn from(event: &RoomEvent) -> Self {
        match event {
            RoomEvent::MessageNew { room, message } => Self::MessageNew {
                room: room.as_str().to_string(),
                message: message.into(),
            },
        }
    }
}

impl From<HubSnapshot> for HubSnapshotDto {
    fn from(snapshot: HubSnapshot) -> Self {
        Self {
            connections: snapshot.connections,
            rooms: snapshot
                .rooms
                .into_iter()
                .map(|(room, members)| RoomSizeDto {
                    room: room.into_string(),
                    members,
                })
                .collect(),
        }
    }
}
