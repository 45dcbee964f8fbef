//! Message log implementations.

pub mod inmemory;

pub use inmemory::InMemoryMessageLog;
