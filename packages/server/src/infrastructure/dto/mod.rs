//! Data Transfer Objects (DTOs) for wire formats.
//!
//! - `websocket`: inbound frames and outbound envelopes on the WebSocket
//! - `http`: REST request/response bodies

pub mod conversion;
pub mod http;
pub mod websocket;
