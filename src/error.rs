//! Error types for vault-env operations

use std::io;
use thiserror::Error;

use vaultenv_core::ParseError;

/// The main error type for vault-env operations
///
/// Every failure is fatal for a run: the first error aborts processing and
/// nothing is retried.
#[derive(Error, Debug)]
pub enum VaultEnvError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid configuration: {0}")]
    Config(ParseError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid vault address: {0}")]
    Address(#[from] url::ParseError),
    #[error("Invalid header value: {0}")]
    Header(#[from] http::header::InvalidHeaderValue),
    #[error("No secret detected at {0}")]
    SecretNotFound(String),
    #[error("Malformed response for {path}: {reason}")]
    MalformedResponse { path: String, reason: String },
    #[error("Secret store returned {status} for {path}: {message}")]
    Store {
        path: String,
        status: u16,
        message: String,
    },
}

/// A type alias for `Result<T, VaultEnvError>`
pub type Result<T> = std::result::Result<T, VaultEnvError>;

impl From<ParseError> for VaultEnvError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Io(io_err) => VaultEnvError::Io(io_err),
            other => VaultEnvError::Config(other),
        }
    }
}
