//! WebSocket frame DTOs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frame received from a client: `{type, room, payload}`.
///
/// `payload` is opaque; `room` and `body` are read from it only when present
/// as strings, so an odd payload never invalidates an otherwise usable frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum InboundFrame {
    #[serde(rename = "join")]
    Join {
        #[serde(default)]
        room: Option<String>,
        #[serde(default)]
        payload: Option<Value>,
    },

    #[serde(rename = "leave")]
    Leave {
        #[serde(default)]
        room: Option<String>,
        #[serde(default)]
        payload: Option<Value>,
    },

    #[serde(rename = "message:new")]
    MessageNew {
        #[serde(default)]
        room: Option<String>,
        #[serde(default)]
        payload: Option<Value>,
    },

    /// Any other `type`.
    #[serde(other)]
    Unknown,
}

impl InboundFrame {
    /// The room named by the frame; falls back to `payload.room` when `room` is missing or empty.
    pub fn target_room(&self) -> Option<&str> {
        let (room, payload) = match self {
            InboundFrame::Join { room, payload }
            | InboundFrame::Leave { room, payload }
            | InboundFrame::MessageNew { room, payload } => (room, payload),
            InboundFrame::Unknown => return None,
        };
        room.as_deref()
            .filter(|r| !r.is_empty())
            .or_else(|| payload_str(payload, "room").filter(|r| !r.is_empty()))
    }

    /// Message body of a `message:new` frame.
    pub fn body(&self) -> Option<&str> {
        match self {
            InboundFrame::MessageNew { payload, .. } => payload_str(payload, "body"),
            _ => None,
        }
    }
}

fn payload_str<'a>(payload: &'a Option<Value>, key: &str) -> Option<&'a str> {
    payload.as_ref()?.get(key).and_then(Value::as_str)
}

/// Message as seen by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: String,
    pub sender: String,
    pub body: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Envelope pushed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundEnvelope {
    #[serde(rename = "message:new")]
    MessageNew { room: String, message: MessageDto },
}
