//! Common error types for StashPoint.

use thiserror::Error;

/// Top-level error type for StashPoint operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No vault with the given name exists.
    #[error("Vault not found: {0}")]
    VaultNotFound(String),

    /// The entered passkey matched no tier for the vault.
    #[error("Incorrect passkey")]
    IncorrectPasskey,

    /// A session record could not be durably written.
    ///
    /// The login that triggered the write must be treated as failed.
    #[error("Session could not be persisted: {0}")]
    SessionPersist(String),

    /// A vault with the same name (ignoring case) already exists.
    #[error("Vault name already taken: {0}")]
    DuplicateVaultName(String),

    /// Object storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Rename target already exists.
    #[error("Rename conflict: {0} already exists")]
    RenameConflict(String),

    /// Table store operation failed.
    #[error("Table store error: {0}")]
    Table(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation not permitted for the caller's tier.
    #[error("Not permitted: {0}")]
    NotPermitted(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
