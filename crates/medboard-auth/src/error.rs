//! Token lifecycle error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Renewal rejected by backend: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),
}
