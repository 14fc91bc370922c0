//! The venue a session trades against.
//!
//! [`Venue`] is the boundary between the session and the exchange
//! infrastructure. [`RpcVenue`] speaks Serum DEX v3 over Solana JSON-RPC;
//! tests drive sessions with scripted implementations.

pub mod error;
#[cfg(feature = "rpc")]
pub mod rpc;

use async_trait::async_trait;
use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signature::Signature;

use crate::market::Market;
use crate::types::{Fill, NewOrder, OpenOrdersAccount, Order};

pub use error::{VenueError, VenueResult};
#[cfg(feature = "rpc")]
pub use rpc::RpcVenue;

/// Reads and writes against one exchange.
///
/// Read methods must not mutate venue state. Write methods submit exactly one
/// transaction signed by `owner` and must not resubmit on ambiguous failure.
#[async_trait]
pub trait Venue: Send + Sync {
    /// Load market metadata for `address` under `program_id`.
    async fn load_market(&self, address: &Pubkey, program_id: &Pubkey) -> VenueResult<Market>;

    /// Resting bids, in any order.
    async fn load_bids(&self, market: &Market) -> VenueResult<Vec<Order>>;

    /// Resting asks, in any order.
    async fn load_asks(&self, market: &Market) -> VenueResult<Vec<Order>>;

    /// Resting orders held by any of `owner`'s open orders accounts.
    async fn load_orders_for_owner(&self, market: &Market, owner: &Pubkey)
        -> VenueResult<Vec<Order>>;

    /// Most recent fills on the market from any trader, newest first, at most `limit`.
    async fn load_fills(&self, market: &Market, limit: usize) -> VenueResult<Vec<Fill>>;

    /// Open orders accounts belonging to `owner` on this market.
    async fn find_open_orders_accounts_for_owner(
        &self,
        market: &Market,
        owner: &Pubkey,
    ) -> VenueResult<Vec<OpenOrdersAccount>>;

    /// Submit a new order.
    async fn place_order(
        &self,
        market: &Market,
        owner: &Keypair,
        order: &NewOrder,
    ) -> VenueResult<Signature>;

    /// Cancel one resting order.
    async fn cancel_order(
        &self,
        market: &Market,
        owner: &Keypair,
        order: &Order,
    ) -> VenueResult<Signature>;

    /// Move free balances of `open_orders` into the owner's wallets.
    async fn settle_funds(
        &self,
        market: &Market,
        owner: &Keypair,
        open_orders: &OpenOrdersAccount,
        base_wallet: &Pubkey,
        quote_wallet: &Pubkey,
    ) -> VenueResult<Signature>;
}
