//! Dispatch error types

use thiserror::Error;

/// Transport-level failures talking to a single backend
///
/// These are always isolated to the backend that produced them; a transport
/// error never aborts the sibling backend calls in a dispatch.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Socket-level failure (bind, send, receive)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Reply arrived but could not be understood
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Reply failed Response Authenticator verification
    #[error("Response authenticator verification failed")]
    BadAuthenticator,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
