//! OTP engine error types

use thiserror::Error;

/// Errors produced by code generation and validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    /// Secret material could not be interpreted as key bytes
    #[error("Invalid secret: {0}")]
    InvalidSecret(String),

    /// Digit count outside the supported 1..=10 range
    #[error("Invalid digit count: {0} (must be 1-10)")]
    InvalidDigits(u32),
}

/// Errors produced by counter store backends
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend-specific failure (I/O, connection, serialization)
    #[error("Counter store backend error: {0}")]
    Backend(String),
}

/// Result type for engine operations
pub type OtpResult<T> = Result<T, OtpError>;
