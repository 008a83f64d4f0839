//! Top-level error type of the leafside binary.

use thiserror::Error;

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("Registry error: {0}")]
    Registry(#[from] leafside_registry::RegistryError),

    #[error("Client error: {0}")]
    Client(#[from] leafside_client::ClientError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task error: {0}")]
    Join(#[from] tokio::task::JoinError),
}
