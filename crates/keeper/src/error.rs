//! Error types for the keeper service

use mapt_core::MaptError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeeperError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] MaptError),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Health check failed: {0}")]
    Unhealthy(String),
}

pub type KeeperResult<T> = Result<T, KeeperError>;

impl From<std::io::Error> for KeeperError {
    fn from(err: std::io::Error) -> Self {
        KeeperError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for KeeperError {
    fn from(err: serde_json::Error) -> Self {
        KeeperError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for KeeperError {
    fn from(err: toml::de::Error) -> Self {
        KeeperError::InvalidConfig(err.to_string())
    }
}

impl From<toml::ser::Error> for KeeperError {
    fn from(err: toml::ser::Error) -> Self {
        KeeperError::SerializationError(err.to_string())
    }
}
