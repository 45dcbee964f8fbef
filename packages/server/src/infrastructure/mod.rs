//! Infrastructure layer: the Hub, collaborator implementations and DTOs.

pub mod auth;
pub mod dto;
pub mod hub;
pub mod repository;
