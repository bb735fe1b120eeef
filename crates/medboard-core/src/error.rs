//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] medboard_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] medboard_session::SessionError),

    #[error("API error: {0}")]
    Api(#[from] medboard_api::ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
