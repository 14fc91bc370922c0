//! Error types for session operations.

use solana_pubkey::Pubkey;
use thiserror::Error;

use crate::venue::VenueError;

/// Session-level errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// Operation attempted before a successful `initialize`
    #[error("Session not initialized")]
    NotInitialized,

    /// `initialize` called on a session that is already ready
    #[error("Session already initialized")]
    AlreadyInitialized,

    /// Operation attempted after `close`
    #[error("Session closed")]
    Closed,

    /// Caller-supplied argument rejected before reaching the venue
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Market could not be loaded or addresses were malformed
    #[error("Initialization failed: {0}")]
    InitializationFailure(#[source] VenueError),

    /// Venue could not be reached
    #[error("Network failure: {0}")]
    NetworkFailure(#[source] VenueError),

    /// Venue call exceeded the request timeout
    #[error("Timeout: {0}")]
    Timeout(#[source] VenueError),

    /// Venue refused the order
    #[error("Order submission failed: {0}")]
    SubmissionFailure(#[source] VenueError),

    /// A cancellation failed. Orders in `cancelled` were cancelled before it.
    #[error("Cancellation of order {failed} failed after {} cancelled: {source}", .cancelled.len())]
    CancellationFailure {
        cancelled: Vec<u128>,
        failed: u128,
        #[source]
        source: VenueError,
    },

    /// A settlement failed. Accounts in `settled` were settled before it.
    #[error("Settlement of {failed} failed after {} settled: {source}", .settled.len())]
    SettlementFailure {
        settled: Vec<Pubkey>,
        failed: Pubkey,
        #[source]
        source: VenueError,
    },

    /// Venue read failed for a reason other than transport or timeout
    #[error("Venue error: {0}")]
    Venue(#[source] VenueError),
}

impl SessionError {
    /// Classify a venue failure, using `otherwise` for non-transient errors.
    pub(crate) fn from_venue(err: VenueError, otherwise: fn(VenueError) -> SessionError) -> Self {
        match err {
            VenueError::Timeout { .. } => SessionError::Timeout(err),
            VenueError::Transport(_) => SessionError::NetworkFailure(err),
            other => otherwise(other),
        }
    }

    /// The underlying venue error, if any.
    pub fn venue_error(&self) -> Option<&VenueError> {
        match self {
            SessionError::InitializationFailure(err)
            | SessionError::NetworkFailure(err)
            | SessionError::Timeout(err)
            | SessionError::SubmissionFailure(err)
            | SessionError::Venue(err) => Some(err),
            SessionError::CancellationFailure { source, .. }
            | SessionError::SettlementFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;
