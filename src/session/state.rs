//! Session lifecycle state.

use std::sync::Arc;

use crate::error::SessionError;
use crate::market::Market;

/// Observable lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Created, market not yet loaded
    Uninitialized,
    /// Market loaded, operations allowed
    Ready,
    /// Torn down, every operation fails
    Closed,
}

/// Lifecycle state. The market only exists while ready.
#[derive(Debug, Default)]
pub(crate) enum SessionState {
    #[default]
    Uninitialized,
    Ready(Arc<Market>),
    Closed,
}

impl SessionState {
    pub(crate) fn status(&self) -> SessionStatus {
        match self {
            SessionState::Uninitialized => SessionStatus::Uninitialized,
            SessionState::Ready(_) => SessionStatus::Ready,
            SessionState::Closed => SessionStatus::Closed,
        }
    }

    /// The loaded market, or the error for the current state.
    pub(crate) fn market(&self) -> Result<Arc<Market>, SessionError> {
        match self {
            SessionState::Ready(market) => Ok(Arc::clone(market)),
            SessionState::Uninitialized => Err(SessionError::NotInitialized),
            SessionState::Closed => Err(SessionError::Closed),
        }
    }
}
