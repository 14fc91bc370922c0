//! Error types for venue calls.

use std::time::Duration;

use thiserror::Error;

use crate::dex::DexError;

/// Failure reported by (or while talking to) the venue
#[derive(Debug, Error)]
pub enum VenueError {
    /// Address string is not a valid base58 pubkey
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Account does not exist or is owned by another program
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// RPC transport failure (connection, HTTP, I/O)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Venue processed the request and refused it
    #[error("Rejected by venue: {0}")]
    Rejected(String),

    /// Account data could not be decoded or an amount could not be encoded
    #[error("DEX error: {0}")]
    Dex(#[from] DexError),

    /// Call did not complete within the session's request timeout
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl VenueError {
    /// Whether the failure is a transport problem rather than a venue decision
    pub fn is_transient(&self) -> bool {
        matches!(self, VenueError::Transport(_) | VenueError::Timeout { .. })
    }
}

/// Result type alias for venue operations
pub type VenueResult<T> = Result<T, VenueError>;
