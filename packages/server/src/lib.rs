//! Real-time room fan-out server library.
//!
//! Live WebSocket connections are registered with a [`infrastructure::hub::Hub`],
//! grouped into rooms (direct conversations and groups), and every new chat
//! message is broadcast to the connections currently joined to its room.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
