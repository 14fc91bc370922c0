//! Scripted venue for driving sessions in tests.
#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serum_session::dex::MarketState;
use serum_session::prelude::*;
use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use tokio::sync::Barrier;

pub const MARKET_BYTE: u8 = 1;
pub const PROGRAM_BYTE: u8 = 9;

pub fn market_address() -> Pubkey {
    Pubkey::new_from_array([MARKET_BYTE; 32])
}

pub fn program_id() -> Pubkey {
    Pubkey::new_from_array([PROGRAM_BYTE; 32])
}

/// SOL/USDC-shaped market: tick 0.001, minimum size 0.1.
pub fn test_market() -> Market {
    test_market_with_flags(0)
}

pub fn test_market_with_flags(account_flags: u64) -> Market {
    let state = MarketState {
        account_flags,
        own_address: market_address(),
        base_mint: Pubkey::new_from_array([2; 32]),
        quote_mint: Pubkey::new_from_array([3; 32]),
        bids: Pubkey::new_from_array([4; 32]),
        asks: Pubkey::new_from_array([5; 32]),
        event_queue: Pubkey::new_from_array([6; 32]),
        base_lot_size: 100_000_000,
        quote_lot_size: 100,
        fee_rate_bps: 22,
        ..Default::default()
    };
    Market::new(market_address(), program_id(), state, 9, 6).unwrap()
}

pub const OWNER_OPEN_ORDERS_BYTE: u8 = 42;

/// Open orders account used for every order the mock places.
pub fn owner_open_orders() -> Pubkey {
    Pubkey::new_from_array([OWNER_OPEN_ORDERS_BYTE; 32])
}

pub fn resting_order(side: Side, order_id: u128, price_lots: u64, size_lots: u64) -> Order {
    let market = test_market();
    Order {
        order_id,
        client_id: 0,
        side,
        price: market.price_lots_to_number(price_lots).unwrap(),
        size: market.base_size_lots_to_number(size_lots).unwrap(),
        price_lots,
        size_lots,
        open_orders_address: owner_open_orders(),
        fee_tier: 0,
    }
}

pub fn open_orders_account(byte: u8, base_free: u64, quote_free: u64) -> OpenOrdersAccount {
    OpenOrdersAccount {
        address: Pubkey::new_from_array([byte; 32]),
        market: market_address(),
        base_token_free: base_free,
        base_token_total: base_free,
        quote_token_free: quote_free,
        quote_token_total: quote_free,
        ..Default::default()
    }
}

pub fn fill(seq_num: u64) -> Fill {
    fill_on(owner_open_orders(), seq_num)
}

pub fn fill_on(open_orders: Pubkey, seq_num: u64) -> Fill {
    Fill {
        order_id: seq_num as u128,
        client_order_id: 0,
        side: Side::Buy,
        price: Decimal::ONE,
        size: Decimal::ONE,
        fee_cost: Decimal::ZERO,
        maker: false,
        open_orders,
        seq_num,
    }
}

#[derive(Default)]
struct Book {
    bids: Vec<Order>,
    asks: Vec<Order>,
}

/// In-memory venue with scripted failures and call accounting.
#[derive(Default)]
pub struct MockVenue {
    book: Mutex<Book>,
    accounts: Mutex<Vec<OpenOrdersAccount>>,
    fills: Vec<Fill>,
    next_order_id: AtomicUsize,

    market_errors: Mutex<VecDeque<VenueError>>,
    place_errors: Mutex<VecDeque<VenueError>>,
    failing_cancels: HashSet<u128>,
    failing_settlements: HashSet<Pubkey>,

    market_flags: u64,
    read_barrier: Option<Arc<Barrier>>,
    mutation_delay: Option<Duration>,

    pub load_market_calls: AtomicUsize,
    pub place_calls: AtomicUsize,
    pub fill_limits: Mutex<Vec<usize>>,
    /// Cancel attempts, in call order
    pub cancel_attempts: Mutex<Vec<u128>>,
    /// Settlement attempts, in call order
    pub settle_attempts: Mutex<Vec<Pubkey>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockVenue {
    pub fn new() -> Self {
        Self {
            next_order_id: AtomicUsize::new(1_000),
            ..Default::default()
        }
    }

    pub fn with_bids(self, bids: Vec<Order>) -> Self {
        self.book.lock().unwrap().bids = bids;
        self
    }

    pub fn with_asks(self, asks: Vec<Order>) -> Self {
        self.book.lock().unwrap().asks = asks;
        self
    }

    pub fn with_accounts(self, accounts: Vec<OpenOrdersAccount>) -> Self {
        *self.accounts.lock().unwrap() = accounts;
        self
    }

    pub fn with_fills(mut self, fills: Vec<Fill>) -> Self {
        self.fills = fills;
        self
    }

    /// Fail the next `load_market` call with `err`.
    pub fn with_market_error(self, err: VenueError) -> Self {
        self.market_errors.lock().unwrap().push_back(err);
        self
    }

    /// Fail the next `place_order` call with `err`.
    pub fn with_place_error(self, err: VenueError) -> Self {
        self.place_errors.lock().unwrap().push_back(err);
        self
    }

    pub fn failing_cancel(mut self, order_id: u128) -> Self {
        self.failing_cancels.insert(order_id);
        self
    }

    pub fn failing_settlement(mut self, address: Pubkey) -> Self {
        self.failing_settlements.insert(address);
        self
    }

    /// Serve a market with `flags` set in its account flags.
    pub fn with_market_flags(mut self, flags: u64) -> Self {
        self.market_flags = flags;
        self
    }

    /// Make `load_bids` and `load_asks` wait for each other.
    pub fn with_read_barrier(mut self) -> Self {
        self.read_barrier = Some(Arc::new(Barrier::new(2)));
        self
    }

    /// Hold every mutating call open for `delay`.
    pub fn with_mutation_delay(mut self, delay: Duration) -> Self {
        self.mutation_delay = Some(delay);
        self
    }

    pub fn place_count(&self) -> usize {
        self.place_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_attempts(&self) -> Vec<u128> {
        self.cancel_attempts.lock().unwrap().clone()
    }

    pub fn settle_attempts(&self) -> Vec<Pubkey> {
        self.settle_attempts.lock().unwrap().clone()
    }

    pub fn max_concurrent_mutations(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn mutate(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.mutation_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    async fn wait_for_other_side(&self) {
        if let Some(barrier) = &self.read_barrier {
            barrier.wait().await;
        }
    }
}

#[async_trait]
impl Venue for MockVenue {
    async fn load_market(&self, address: &Pubkey, program_id: &Pubkey) -> VenueResult<Market> {
        self.load_market_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.market_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        let market = test_market_with_flags(self.market_flags);
        if market.address() != address || market.program_id() != program_id {
            return Err(VenueError::AccountNotFound(address.to_string()));
        }
        Ok(market)
    }

    async fn load_bids(&self, _market: &Market) -> VenueResult<Vec<Order>> {
        self.wait_for_other_side().await;
        Ok(self.book.lock().unwrap().bids.clone())
    }

    async fn load_asks(&self, _market: &Market) -> VenueResult<Vec<Order>> {
        self.wait_for_other_side().await;
        Ok(self.book.lock().unwrap().asks.clone())
    }

    async fn load_orders_for_owner(
        &self,
        _market: &Market,
        _owner: &Pubkey,
    ) -> VenueResult<Vec<Order>> {
        let book = self.book.lock().unwrap();
        Ok(book
            .bids
            .iter()
            .chain(book.asks.iter())
            .filter(|order| order.open_orders_address == owner_open_orders())
            .cloned()
            .collect())
    }

    async fn load_fills(&self, _market: &Market, limit: usize) -> VenueResult<Vec<Fill>> {
        self.fill_limits.lock().unwrap().push(limit);
        Ok(self.fills.iter().take(limit).cloned().collect())
    }

    async fn find_open_orders_accounts_for_owner(
        &self,
        _market: &Market,
        _owner: &Pubkey,
    ) -> VenueResult<Vec<OpenOrdersAccount>> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn place_order(
        &self,
        market: &Market,
        _owner: &Keypair,
        order: &NewOrder,
    ) -> VenueResult<Signature> {
        self.place_calls.fetch_add(1, Ordering::SeqCst);
        self.mutate().await;
        if let Some(err) = self.place_errors.lock().unwrap().pop_front() {
            return Err(err);
        }

        let price_lots = market.price_number_to_lots(order.price)?;
        let size_lots = market.base_size_number_to_lots(order.size)?;
        let order_id = self.next_order_id.fetch_add(1, Ordering::SeqCst) as u128;
        let mut resting = resting_order(order.side, order_id, price_lots, size_lots);
        resting.client_id = order.client_id.unwrap_or_default();

        let mut book = self.book.lock().unwrap();
        match order.side {
            Side::Buy => book.bids.push(resting),
            Side::Sell => book.asks.push(resting),
        }
        Ok(Signature::default())
    }

    async fn cancel_order(
        &self,
        _market: &Market,
        _owner: &Keypair,
        order: &Order,
    ) -> VenueResult<Signature> {
        self.cancel_attempts.lock().unwrap().push(order.order_id);
        self.mutate().await;
        if self.failing_cancels.contains(&order.order_id) {
            return Err(VenueError::Rejected(format!("order {} not found", order.order_id)));
        }

        let mut book = self.book.lock().unwrap();
        book.bids.retain(|o| o.order_id != order.order_id);
        book.asks.retain(|o| o.order_id != order.order_id);
        Ok(Signature::default())
    }

    async fn settle_funds(
        &self,
        _market: &Market,
        _owner: &Keypair,
        open_orders: &OpenOrdersAccount,
        _base_wallet: &Pubkey,
        _quote_wallet: &Pubkey,
    ) -> VenueResult<Signature> {
        self.settle_attempts.lock().unwrap().push(open_orders.address);
        self.mutate().await;
        if self.failing_settlements.contains(&open_orders.address) {
            return Err(VenueError::Rejected("settlement rejected".to_string()));
        }

        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.iter_mut().find(|a| a.address == open_orders.address) {
            account.base_token_total -= account.base_token_free;
            account.quote_token_total -= account.quote_token_free;
            account.base_token_free = 0;
            account.quote_token_free = 0;
        }
        Ok(Signature::default())
    }
}

pub fn session(venue: MockVenue) -> OrderBookSession<MockVenue> {
    OrderBookSession::new(venue, Keypair::new())
}

pub fn session_with_config(venue: MockVenue, config: SessionConfig) -> OrderBookSession<MockVenue> {
    OrderBookSession::with_config(venue, Keypair::new(), config)
}

/// Session that has already loaded the test market.
pub async fn ready_session(venue: MockVenue) -> OrderBookSession<MockVenue> {
    ready_session_with_config(venue, SessionConfig::default()).await
}

pub async fn ready_session_with_config(
    venue: MockVenue,
    config: SessionConfig,
) -> OrderBookSession<MockVenue> {
    let session = session_with_config(venue, config);
    session
        .initialize(&market_address().to_string(), &program_id().to_string())
        .await
        .unwrap();
    session
}
