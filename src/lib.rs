//! # Serum Session
//!
//! A client session manager for one market of a Serum DEX v3 order book.
//!
//! ## Modules
//!
//! - [`session`]: [`OrderBookSession`](session::OrderBookSession), the lifecycle
//!   and consistency layer: initialization, order placement, cancellation
//!   sweeps and settlement
//! - [`venue`]: the [`Venue`](venue::Venue) trait the session trades against,
//!   and [`RpcVenue`](venue::RpcVenue) over Solana JSON-RPC (`rpc` feature)
//! - [`dex`]: Serum DEX v3 account layouts and instruction builders
//! - [`market`]: loaded market metadata and lot conversions
//! - [`book`]: L2 order book aggregation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use serum_session::prelude::*;
//! use rust_decimal_macros::dec;
//! use solana_keypair::Keypair;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = OrderBookSession::new(RpcVenue::new(DEFAULT_RPC_URL), Keypair::new());
//!     session
//!         .initialize(
//!             "9wFFyRfZBsuAha4YcuxcXLKwMxJR43S7fPfQLusDBzvT",
//!             &SERUM_DEX_V3_PROGRAM_ID.to_string(),
//!         )
//!         .await?;
//!
//!     let book = session.get_orderbook(10).await?;
//!     println!("Spread: {:?}", book.spread());
//!
//!     let report = session.cancel_all_orders().await?;
//!     println!("Cancelled {} orders", report.cancelled.len());
//!     Ok(())
//! }
//! ```

// ============================================================================
// MODULES
// ============================================================================

/// Serum DEX v3 layouts and instructions.
pub mod dex;

/// Domain types shared by sessions and venues.
pub mod types;

/// Market metadata and lot conversions.
pub mod market;

/// Order book aggregation.
pub mod book;

/// Venue trait and the Solana RPC venue.
pub mod venue;

/// Session lifecycle and operations.
pub mod session;

/// Session error types.
pub mod error;

/// Session configuration.
pub mod config;

/// Solana RPC URL constants.
pub mod network;

// ============================================================================
// PRELUDE
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use serum_session::prelude::*;
/// ```
pub mod prelude {
    pub use crate::session::{OrderBookSession, SessionStatus};
    pub use crate::config::SessionConfig;
    pub use crate::error::{SessionError, SessionResult};

    pub use crate::types::{
        CancelReport, Fill, NewOrder, OpenOrdersAccount, Order, OrderType, SettlementReport, Side,
    };
    pub use crate::book::{OrderbookSnapshot, PriceLevel};
    pub use crate::market::Market;

    pub use crate::venue::{Venue, VenueError, VenueResult};
    #[cfg(feature = "rpc")]
    pub use crate::venue::RpcVenue;

    pub use crate::dex::{DexError, DexResult, SERUM_DEX_V3_PROGRAM_ID};

    pub use crate::network::{DEFAULT_RPC_URL, DEVNET_RPC_URL};
}
