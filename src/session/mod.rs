//! Order book session over one market.
//!
//! An [`OrderBookSession`] owns the trading keypair and a [`Venue`] handle,
//! tracks the session lifecycle, and serialises every call that mutates
//! venue state. Reads run concurrently with each other and with mutations.
//!
//! # Example
//!
//! ```rust,ignore
//! use serum_session::prelude::*;
//! use rust_decimal_macros::dec;
//!
//! let session = OrderBookSession::new(RpcVenue::new(DEFAULT_RPC_URL), keypair);
//! session.initialize(MARKET, &SERUM_DEX_V3_PROGRAM_ID.to_string()).await?;
//!
//! session
//!     .place_order(NewOrder::limit(Side::Buy, dec!(20.5), dec!(10), usdc_account))
//!     .await?;
//! let open = session.get_open_orders().await?;
//! ```

mod state;

use std::collections::HashSet;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use tokio::sync::{Mutex, RwLock};

use crate::book::{aggregate_levels, OrderbookSnapshot};
use crate::config::SessionConfig;
use crate::dex::DexError;
use crate::error::{SessionError, SessionResult};
use crate::market::Market;
use crate::types::{CancelReport, Fill, NewOrder, OpenOrdersAccount, Order, SettlementReport, Side};
use crate::venue::{Venue, VenueError, VenueResult};

pub use state::SessionStatus;
use state::SessionState;

/// Client session against one market of a Serum-style venue
pub struct OrderBookSession<V: Venue> {
    venue: V,
    owner: Keypair,
    config: SessionConfig,
    state: RwLock<SessionState>,
    /// Held for the whole of every mutating call, including multi-item sweeps
    mutation: Mutex<()>,
}

impl<V: Venue> OrderBookSession<V> {
    /// Create an uninitialized session with default configuration.
    pub fn new(venue: V, owner: Keypair) -> Self {
        Self::with_config(venue, owner, SessionConfig::default())
    }

    /// Create an uninitialized session with custom configuration.
    pub fn with_config(venue: V, owner: Keypair, config: SessionConfig) -> Self {
        Self {
            venue,
            owner,
            config,
            state: RwLock::new(SessionState::Uninitialized),
            mutation: Mutex::new(()),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub async fn status(&self) -> SessionStatus {
        self.state.read().await.status()
    }

    /// The loaded market, if the session is ready.
    pub async fn market(&self) -> Option<Arc<Market>> {
        self.state.read().await.market().ok()
    }

    pub fn owner(&self) -> Pubkey {
        self.owner.pubkey()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn venue(&self) -> &V {
        &self.venue
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Load the market and make the session ready.
    ///
    /// Both addresses are base58 pubkeys. On failure the session stays
    /// uninitialized and `initialize` may be called again.
    pub async fn initialize(&self, market_address: &str, program_address: &str) -> SessionResult<()> {
        // Write lock held across the load serialises concurrent initializers
        let mut state = self.state.write().await;
        match &*state {
            SessionState::Ready(_) => return Err(SessionError::AlreadyInitialized),
            SessionState::Closed => return Err(SessionError::Closed),
            SessionState::Uninitialized => {}
        }

        let address = parse_address(market_address)?;
        let program_id = parse_address(program_address)?;

        tracing::debug!(market = %address, program = %program_id, "Loading market");
        let market = self
            .timed("load_market", self.venue.load_market(&address, &program_id))
            .await
            .map_err(|e| {
                tracing::warn!(market = %address, "Market load failed: {}", e);
                SessionError::from_venue(e, SessionError::InitializationFailure)
            })?;

        if market.state().is_disabled() {
            tracing::warn!(market = %address, "Market is disabled");
            return Err(SessionError::InitializationFailure(
                DexError::InvalidMarket(format!("market {} is disabled", address)).into(),
            ));
        }

        tracing::info!(
            market = %address,
            base_mint = %market.base_mint(),
            quote_mint = %market.quote_mint(),
            "Session initialized"
        );
        *state = SessionState::Ready(Arc::new(market));
        Ok(())
    }

    /// Tear the session down. Every later call fails with [`SessionError::Closed`].
    pub async fn close(&self) {
        let mut state = self.state.write().await;
        if !matches!(*state, SessionState::Closed) {
            tracing::info!(owner = %self.owner.pubkey(), "Session closed");
        }
        *state = SessionState::Closed;
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Snapshot of the book with at most `depth` levels per side.
    pub async fn get_orderbook(&self, depth: usize) -> SessionResult<OrderbookSnapshot> {
        let market = self.ready_market().await?;
        if depth == 0 {
            return Err(SessionError::InvalidParameter(
                "depth must be at least 1".to_string(),
            ));
        }

        let (bids, asks) = tokio::try_join!(
            self.timed("load_bids", self.venue.load_bids(&market)),
            self.timed("load_asks", self.venue.load_asks(&market)),
        )
        .map_err(|e| SessionError::from_venue(e, SessionError::Venue))?;

        let snapshot = OrderbookSnapshot {
            bids: aggregate_levels(&market, &bids, Side::Buy, depth).map_err(decode_error)?,
            asks: aggregate_levels(&market, &asks, Side::Sell, depth).map_err(decode_error)?,
        };
        tracing::debug!(
            bids = snapshot.bids.len(),
            asks = snapshot.asks.len(),
            "Orderbook loaded"
        );
        Ok(snapshot)
    }

    /// Snapshot of the book at the configured default depth.
    pub async fn get_orderbook_default(&self) -> SessionResult<OrderbookSnapshot> {
        self.get_orderbook(self.config.default_depth).await
    }

    /// The owner's resting orders on this market.
    pub async fn get_open_orders(&self) -> SessionResult<Vec<Order>> {
        let market = self.ready_market().await?;
        self.load_open_orders(&market).await
    }

    /// The owner's most recent fills, newest first.
    ///
    /// The event queue is shared by every trader on the market; only fills
    /// against one of the owner's open orders accounts are returned.
    pub async fn get_fills(&self) -> SessionResult<Vec<Fill>> {
        let market = self.ready_market().await?;
        let limit = self.config.fill_history_limit;
        let owner = self.owner.pubkey();

        let (fills, accounts) = tokio::try_join!(
            self.timed("load_fills", self.venue.load_fills(&market, limit)),
            self.timed(
                "find_open_orders_accounts",
                self.venue.find_open_orders_accounts_for_owner(&market, &owner),
            ),
        )
        .map_err(|e| SessionError::from_venue(e, SessionError::Venue))?;

        let owned: HashSet<Pubkey> = accounts.iter().map(|account| account.address).collect();
        let fills: Vec<Fill> = fills
            .into_iter()
            .filter(|fill| owned.contains(&fill.open_orders))
            .take(limit)
            .collect();
        tracing::debug!(fills = fills.len(), accounts = owned.len(), "Fills loaded");
        Ok(fills)
    }

    /// The owner's open orders accounts on this market.
    pub async fn find_open_orders_accounts(&self) -> SessionResult<Vec<OpenOrdersAccount>> {
        let market = self.ready_market().await?;
        self.load_open_orders_accounts(&market).await
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Submit a new order. Sent exactly once.
    pub async fn place_order(&self, order: NewOrder) -> SessionResult<Signature> {
        let market = self.ready_market().await?;
        validate_order(&market, &order)?;

        let _guard = self.mutation.lock().await;
        let signature = self
            .timed("place_order", self.venue.place_order(&market, &self.owner, &order))
            .await
            .map_err(|e| {
                tracing::warn!(side = ?order.side, price = %order.price, "Order submission failed: {}", e);
                SessionError::from_venue(e, SessionError::SubmissionFailure)
            })?;

        tracing::info!(
            %signature,
            side = ?order.side,
            price = %order.price,
            size = %order.size,
            "Order placed"
        );
        Ok(signature)
    }

    /// Cancel one resting order.
    pub async fn cancel_order(&self, order: &Order) -> SessionResult<Signature> {
        let market = self.ready_market().await?;
        let _guard = self.mutation.lock().await;
        self.cancel_one(&market, order)
            .await
            .map_err(|source| SessionError::CancellationFailure {
                cancelled: Vec::new(),
                failed: order.order_id,
                source,
            })
    }

    /// Cancel every resting order of the owner, in the order the venue lists them.
    ///
    /// Stops at the first failure. Orders cancelled before it stay cancelled
    /// and are listed in the error.
    pub async fn cancel_all_orders(&self) -> SessionResult<CancelReport> {
        let market = self.ready_market().await?;
        let _guard = self.mutation.lock().await;

        let orders = self.load_open_orders(&market).await?;
        let mut cancelled = Vec::with_capacity(orders.len());
        for order in &orders {
            if let Err(source) = self.cancel_one(&market, order).await {
                tracing::warn!(
                    order_id = order.order_id,
                    cancelled = cancelled.len(),
                    remaining = orders.len() - cancelled.len() - 1,
                    "Cancel failed, aborting sweep: {}",
                    source
                );
                return Err(SessionError::CancellationFailure {
                    cancelled,
                    failed: order.order_id,
                    source,
                });
            }
            cancelled.push(order.order_id);
        }

        tracing::info!(cancelled = cancelled.len(), "Cancelled all orders");
        Ok(CancelReport { cancelled })
    }

    /// Settle free balances of every open orders account into the given wallets.
    ///
    /// Accounts without free balance are skipped. Stops at the first failure;
    /// accounts settled before it are listed in the error.
    pub async fn settle_funds(
        &self,
        base_wallet: &Pubkey,
        quote_wallet: &Pubkey,
    ) -> SessionResult<SettlementReport> {
        let market = self.ready_market().await?;
        let _guard = self.mutation.lock().await;

        let accounts = self.load_open_orders_accounts(&market).await?;
        let mut report = SettlementReport::default();
        for account in &accounts {
            if !account.has_free_balance() {
                tracing::debug!(open_orders = %account.address, "No free balance, skipping");
                report.skipped.push(account.address);
                continue;
            }

            let settled = self
                .timed(
                    "settle_funds",
                    self.venue
                        .settle_funds(&market, &self.owner, account, base_wallet, quote_wallet),
                )
                .await;
            match settled {
                Ok(signature) => {
                    tracing::debug!(open_orders = %account.address, %signature, "Settled");
                    report.settled.push(account.address);
                }
                Err(source) => {
                    tracing::warn!(
                        open_orders = %account.address,
                        settled = report.settled.len(),
                        "Settlement failed, aborting sweep: {}",
                        source
                    );
                    return Err(SessionError::SettlementFailure {
                        settled: report.settled,
                        failed: account.address,
                        source,
                    });
                }
            }
        }

        tracing::info!(
            settled = report.settled.len(),
            skipped = report.skipped.len(),
            "Settlement finished"
        );
        Ok(report)
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    /// Clone the market out so no lock is held across venue calls.
    async fn ready_market(&self) -> SessionResult<Arc<Market>> {
        self.state.read().await.market()
    }

    async fn load_open_orders(&self, market: &Market) -> SessionResult<Vec<Order>> {
        self.timed(
            "load_orders_for_owner",
            self.venue.load_orders_for_owner(market, &self.owner.pubkey()),
        )
        .await
        .map_err(|e| SessionError::from_venue(e, SessionError::Venue))
    }

    async fn load_open_orders_accounts(
        &self,
        market: &Market,
    ) -> SessionResult<Vec<OpenOrdersAccount>> {
        self.timed(
            "find_open_orders_accounts",
            self.venue
                .find_open_orders_accounts_for_owner(market, &self.owner.pubkey()),
        )
        .await
        .map_err(|e| SessionError::from_venue(e, SessionError::Venue))
    }

    async fn cancel_one(&self, market: &Market, order: &Order) -> VenueResult<Signature> {
        let signature = self
            .timed("cancel_order", self.venue.cancel_order(market, &self.owner, order))
            .await?;
        tracing::debug!(order_id = order.order_id, %signature, "Order cancelled");
        Ok(signature)
    }

    /// Bound a venue call by the request timeout.
    async fn timed<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = VenueResult<T>>,
    ) -> VenueResult<T> {
        let after = self.config.request_timeout;
        match tokio::time::timeout(after, call).await {
            Ok(result) => result,
            Err(_) => Err(VenueError::Timeout { operation, after }),
        }
    }
}

fn parse_address(address: &str) -> SessionResult<Pubkey> {
    Pubkey::from_str(address).map_err(|e| {
        SessionError::InitializationFailure(VenueError::InvalidAddress(format!(
            "{}: {}",
            address, e
        )))
    })
}

fn decode_error(err: DexError) -> SessionError {
    SessionError::Venue(err.into())
}

fn validate_order(market: &Market, order: &NewOrder) -> SessionResult<()> {
    if order.price <= Decimal::ZERO {
        return Err(SessionError::InvalidParameter(format!(
            "price must be positive, got {}",
            order.price
        )));
    }
    if order.size <= Decimal::ZERO {
        return Err(SessionError::InvalidParameter(format!(
            "size must be positive, got {}",
            order.size
        )));
    }

    let invalid = |e: DexError| SessionError::InvalidParameter(e.to_string());
    if market.price_number_to_lots(order.price).map_err(invalid)? == 0 {
        return Err(SessionError::InvalidParameter(format!(
            "price {} is below the tick size {}",
            order.price,
            market.tick_size()
        )));
    }
    if market.base_size_number_to_lots(order.size).map_err(invalid)? == 0 {
        return Err(SessionError::InvalidParameter(format!(
            "size {} is below the minimum order size {}",
            order.size,
            market.min_order_size()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::test_utils::sol_usdc_market;
    use rust_decimal_macros::dec;

    fn order(price: Decimal, size: Decimal) -> NewOrder {
        NewOrder::limit(Side::Buy, price, size, Pubkey::new_from_array([7; 32]))
    }

    #[test]
    fn test_validate_order_accepts_lot_multiples() {
        let market = sol_usdc_market();
        assert!(validate_order(&market, &order(dec!(20.5), dec!(10))).is_ok());
    }

    #[test]
    fn test_validate_order_rejects_non_positive() {
        let market = sol_usdc_market();
        assert!(matches!(
            validate_order(&market, &order(dec!(0), dec!(10))),
            Err(SessionError::InvalidParameter(_))
        ));
        assert!(matches!(
            validate_order(&market, &order(dec!(20), dec!(-1))),
            Err(SessionError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_validate_order_rejects_sub_lot() {
        let market = sol_usdc_market();
        // Tick is 0.001, minimum size is 0.1
        assert!(matches!(
            validate_order(&market, &order(dec!(0.0001), dec!(10))),
            Err(SessionError::InvalidParameter(_))
        ));
        assert!(matches!(
            validate_order(&market, &order(dec!(20), dec!(0.01))),
            Err(SessionError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_parse_address() {
        assert!(parse_address("9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin").is_ok());
        assert!(matches!(
            parse_address("not-a-pubkey"),
            Err(SessionError::InitializationFailure(VenueError::InvalidAddress(_)))
        ));
    }
}
