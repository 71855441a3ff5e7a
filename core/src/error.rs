//! Core Error Types

use thiserror::Error;

use crate::crypto::CryptoError;
use crate::permissions::AuthorizationDenied;

/// Errors surfaced by the core stores.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed input (e.g. a bad panel URL). Reported to the invoking
    /// user, never retried.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No panel credentials stored for this (guild, user).
    #[error("Panel credentials are not configured")]
    NotConfigured,

    /// Encryption or decryption failure. Surfaced generically; the cause
    /// stays in the logs.
    #[error("Credential encryption error")]
    Crypto(#[from] CryptoError),

    /// The actor is not allowed to perform the action.
    #[error(transparent)]
    Denied(#[from] AuthorizationDenied),

    /// Database error.
    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
