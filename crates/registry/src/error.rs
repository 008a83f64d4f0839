//! Error types for the registry core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("network {0} not found")]
    NetworkNotFound(String),

    #[error("remote for network {0} not found")]
    RemoteNotFound(String),

    #[error("network {0} is still in use")]
    NetworkInUse(String),

    #[error("malformed request: {0}")]
    MalformedMessage(String),

    #[error("draining domain {domain} timed out after {attempts} attempts")]
    DrainTimeout { domain: String, attempts: u32 },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
