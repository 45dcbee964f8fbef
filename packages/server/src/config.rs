//! Server configuration.
//!
//! Values come from command-line flags with environment-variable fallbacks and
//! are handed explicitly to the components that need them.

use axum::http::HeaderValue;
use clap::Parser;
use thiserror::Error;

use crate::infrastructure::hub::DEFAULT_QUEUE_CAPACITY;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid frontend origin '{0}'")]
    InvalidOrigin(String),

    #[error("JWT secret must not be empty")]
    EmptySecret,

    #[error("Queue capacity must be at least 1")]
    ZeroQueueCapacity,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "tsudoi-server")]
#[command(about = "Real-time room fan-out server for Tsudoi chat", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "TSUDOI_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "4000")]
    pub port: u16,

    /// Secret used to verify HS256 connection tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Bound of every client's outbound queue
    #[arg(long, env = "TSUDOI_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Origin allowed by CORS
    #[arg(long, env = "FRONTEND_ORIGIN", default_value = "http://localhost:5173")]
    pub frontend_origin: String,

    /// Default log level, overridden by RUST_LOG
    #[arg(long, default_value = "debug")]
    pub log_level: String,
}

impl ServerConfig {
    /// Reject values that parse but cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        self.cors_origin()?;
        Ok(())
    }

    pub fn cors_origin(&self) -> Result<HeaderValue, ConfigError> {
        HeaderValue::from_str(&self.frontend_origin)
            .map_err(|_| ConfigError::InvalidOrigin(self.frontend_origin.clone()))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
