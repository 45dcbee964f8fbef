//! Shared utilities for the Tsudoi workspace.

pub mod logger;
pub mod time;
