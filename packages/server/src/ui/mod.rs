//! WebSocket / HTTP surface of the chat server.

mod handler;
mod server;
mod signal;
pub mod state;

pub use handler::session::ConnectionSession;
pub use server::Server;
pub use state::AppState;
