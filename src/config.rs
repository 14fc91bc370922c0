//! Session configuration.

use std::time::Duration;

/// Default upper bound on a single venue call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of price levels per side returned by `get_orderbook_default`.
pub const DEFAULT_ORDERBOOK_DEPTH: usize = 20;

/// Default number of event queue entries inspected by `get_fills`.
pub const DEFAULT_FILL_HISTORY_LIMIT: usize = 100;

/// Tunables for an [`OrderBookSession`](crate::session::OrderBookSession)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Upper bound on each venue call. Expiry is reported as a timeout and never retried.
    pub request_timeout: Duration,
    /// Levels per side used by `get_orderbook_default`
    pub default_depth: usize,
    /// Maximum fills returned by `get_fills`
    pub fill_history_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            default_depth: DEFAULT_ORDERBOOK_DEPTH,
            fill_history_limit: DEFAULT_FILL_HISTORY_LIMIT,
        }
    }
}

impl SessionConfig {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_default_depth(mut self, depth: usize) -> Self {
        self.default_depth = depth;
        self
    }

    pub fn with_fill_history_limit(mut self, limit: usize) -> Self {
        self.fill_history_limit = limit;
        self
    }
}
