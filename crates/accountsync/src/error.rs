//! Synchronizer error types

use common::AccountId;
use thiserror::Error;

/// Errors that can occur in the synchronizer
#[derive(Error, Debug)]
pub enum SyncError {
    /// Invalid input: inverted filter bounds, malformed callback payload
    #[error("Validation error: {0}")]
    Validation(String),

    /// Account not found or not owned by the calling user
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Engine call failed where the engine's confirmation is required
    ///
    /// Only settlement completion treats this as blocking; configuration
    /// mirroring swallows engine failures entirely.
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Provider account-id resolution failed
    ///
    /// Never surfaces to users; callers degrade to unscoped mirroring.
    #[error("Provider resolution unavailable: {0}")]
    ResolutionUnavailable(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for synchronizer operations
pub type SyncResult<T> = std::result::Result<T, SyncError>;
