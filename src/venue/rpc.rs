//! Serum DEX v3 venue over Solana JSON-RPC.
//!
//! # Example
//!
//! ```rust,ignore
//! use serum_session::prelude::*;
//! use solana_keypair::Keypair;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let venue = RpcVenue::new(DEFAULT_RPC_URL);
//!     let session = OrderBookSession::new(venue, Keypair::new());
//!     session
//!         .initialize("9wFFyRfZBsuAha4YcuxcXLKwMxJR43S7fPfQLusDBzvT", &SERUM_DEX_V3_PROGRAM_ID.to_string())
//!         .await?;
//!
//!     let book = session.get_orderbook(10).await?;
//!     println!("Best bid: {:?}", book.best_bid());
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;

use async_trait::async_trait;
use solana_account_decoder_client_types::UiAccountEncoding;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_commitment_config::CommitmentConfig;
use solana_instruction::Instruction;
use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_system_interface::instruction as system_instruction;
use solana_transaction::Transaction;

use crate::dex::constants::{OPEN_ORDERS_MARKET_OFFSET, OPEN_ORDERS_OWNER_OFFSET, OPEN_ORDERS_SIZE};
use crate::dex::{
    build_cancel_order_v2_ix, build_new_order_v3_ix, build_settle_funds_ix, read_mint_decimals,
    DexError, DexResult, EventQueue, MarketState, Slab,
};
use crate::market::Market;
use crate::types::{Fill, NewOrder, OpenOrdersAccount, Order, Side};
use crate::venue::{Venue, VenueError, VenueResult};

impl From<ClientError> for VenueError {
    fn from(err: ClientError) -> Self {
        match err.kind() {
            ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) => {
                VenueError::Transport(err.to_string())
            }
            _ => VenueError::Rejected(err.to_string()),
        }
    }
}

/// Serum DEX v3 venue backed by a Solana RPC node.
pub struct RpcVenue {
    rpc_client: RpcClient,
}

impl RpcVenue {
    /// Create a venue with confirmed commitment.
    pub fn new(rpc_url: &str) -> Self {
        Self::with_commitment(rpc_url, CommitmentConfig::confirmed())
    }

    /// Create a venue with a custom commitment level.
    pub fn with_commitment(rpc_url: &str, commitment: CommitmentConfig) -> Self {
        Self {
            rpc_client: RpcClient::new_with_commitment(rpc_url.to_string(), commitment),
        }
    }

    /// Create a venue from an existing RpcClient.
    pub fn from_rpc_client(rpc_client: RpcClient) -> Self {
        Self { rpc_client }
    }

    pub fn rpc_client(&self) -> &RpcClient {
        &self.rpc_client
    }

    async fn load_side(&self, market: &Market, side: Side) -> VenueResult<Vec<Order>> {
        let address = match side {
            Side::Buy => market.state().bids,
            Side::Sell => market.state().asks,
        };
        let account = self.rpc_client.get_account(&address).await?;
        let slab = Slab::deserialize(&account.data)?;
        let orders = slab
            .leaves()?
            .iter()
            .map(|leaf| market.order_from_leaf(leaf, side))
            .collect::<DexResult<Vec<_>>>()?;
        Ok(orders)
    }

    /// Sign with `signers` (the first pays) and send once.
    async fn send(&self, instructions: &[Instruction], signers: Vec<&Keypair>) -> VenueResult<Signature> {
        let payer = signers
            .first()
            .map(|keypair| keypair.pubkey())
            .ok_or_else(|| VenueError::Rejected("no signer for transaction".to_string()))?;

        let blockhash = self.rpc_client.get_latest_blockhash().await?;
        let mut transaction = Transaction::new_with_payer(instructions, Some(&payer));
        transaction
            .try_sign(&signers, blockhash)
            .map_err(|e| VenueError::Rejected(format!("Signing failed: {}", e)))?;

        let signature = self.rpc_client.send_and_confirm_transaction(&transaction).await?;
        tracing::debug!(%signature, instructions = instructions.len(), "Transaction confirmed");
        Ok(signature)
    }
}

#[async_trait]
impl Venue for RpcVenue {
    async fn load_market(&self, address: &Pubkey, program_id: &Pubkey) -> VenueResult<Market> {
        let account = self.rpc_client.get_account(address).await?;
        if account.owner != *program_id {
            return Err(VenueError::AccountNotFound(format!(
                "Market {} is owned by {}, not {}",
                address, account.owner, program_id
            )));
        }

        let state = MarketState::deserialize(&account.data)?;
        if state.own_address != *address {
            return Err(DexError::InvalidMarket(format!(
                "account {} describes market {}",
                address, state.own_address
            ))
            .into());
        }

        let mints = self
            .rpc_client
            .get_multiple_accounts(&[state.base_mint, state.quote_mint])
            .await?;
        let decimals = |index: usize, mint: &Pubkey| -> VenueResult<u8> {
            let account = mints
                .get(index)
                .and_then(Option::as_ref)
                .ok_or_else(|| VenueError::AccountNotFound(format!("Mint {}", mint)))?;
            Ok(read_mint_decimals(&account.data)?)
        };
        let base_decimals = decimals(0, &state.base_mint)?;
        let quote_decimals = decimals(1, &state.quote_mint)?;

        Ok(Market::new(*address, *program_id, state, base_decimals, quote_decimals)?)
    }

    async fn load_bids(&self, market: &Market) -> VenueResult<Vec<Order>> {
        self.load_side(market, Side::Buy).await
    }

    async fn load_asks(&self, market: &Market) -> VenueResult<Vec<Order>> {
        self.load_side(market, Side::Sell).await
    }

    async fn load_orders_for_owner(
        &self,
        market: &Market,
        owner: &Pubkey,
    ) -> VenueResult<Vec<Order>> {
        let (bids, asks, accounts) = tokio::try_join!(
            self.load_side(market, Side::Buy),
            self.load_side(market, Side::Sell),
            self.find_open_orders_accounts_for_owner(market, owner),
        )?;

        let owned: HashSet<Pubkey> = accounts.iter().map(|account| account.address).collect();
        Ok(bids
            .into_iter()
            .chain(asks)
            .filter(|order| owned.contains(&order.open_orders_address))
            .collect())
    }

    async fn load_fills(&self, market: &Market, limit: usize) -> VenueResult<Vec<Fill>> {
        let account = self.rpc_client.get_account(&market.state().event_queue).await?;
        let queue = EventQueue::deserialize(&account.data, limit)?;
        let fills = queue
            .fills()
            .filter_map(|event| market.fill_from_event(event).transpose())
            .collect::<DexResult<Vec<_>>>()?;
        Ok(fills)
    }

    async fn find_open_orders_accounts_for_owner(
        &self,
        market: &Market,
        owner: &Pubkey,
    ) -> VenueResult<Vec<OpenOrdersAccount>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![
                RpcFilterType::DataSize(OPEN_ORDERS_SIZE as u64),
                RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
                    OPEN_ORDERS_MARKET_OFFSET,
                    market.address().as_ref(),
                )),
                RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
                    OPEN_ORDERS_OWNER_OFFSET,
                    owner.as_ref(),
                )),
            ]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                ..Default::default()
            },
            ..Default::default()
        };

        let accounts = self
            .rpc_client
            .get_program_accounts_with_config(market.program_id(), config)
            .await?;

        let decoded = accounts
            .iter()
            .map(|(address, account)| OpenOrdersAccount::deserialize(*address, &account.data))
            .collect::<DexResult<Vec<_>>>()?;
        Ok(decoded)
    }

    async fn place_order(
        &self,
        market: &Market,
        owner: &Keypair,
        order: &NewOrder,
    ) -> VenueResult<Signature> {
        let params = market.new_order_params(order)?;
        let owner_key = owner.pubkey();
        let accounts = self.find_open_orders_accounts_for_owner(market, &owner_key).await?;

        let mut instructions = Vec::with_capacity(2);
        let mut created: Option<Keypair> = None;
        let open_orders = match accounts.first() {
            Some(account) => account.address,
            None => {
                // First order on this market: create the open orders account in the same transaction
                let account = Keypair::new();
                let lamports = self
                    .rpc_client
                    .get_minimum_balance_for_rent_exemption(OPEN_ORDERS_SIZE)
                    .await?;
                instructions.push(system_instruction::create_account(
                    &owner_key,
                    &account.pubkey(),
                    lamports,
                    OPEN_ORDERS_SIZE as u64,
                    market.program_id(),
                ));
                tracing::debug!(open_orders = %account.pubkey(), "Creating open orders account");
                let address = account.pubkey();
                created = Some(account);
                address
            }
        };

        instructions.push(build_new_order_v3_ix(
            market.program_id(),
            market.state(),
            &open_orders,
            &order.payer,
            &owner_key,
            &params,
        ));

        let mut signers = vec![owner];
        if let Some(account) = created.as_ref() {
            signers.push(account);
        }
        self.send(&instructions, signers).await
    }

    async fn cancel_order(
        &self,
        market: &Market,
        owner: &Keypair,
        order: &Order,
    ) -> VenueResult<Signature> {
        let ix = build_cancel_order_v2_ix(
            market.program_id(),
            market.state(),
            &order.open_orders_address,
            &owner.pubkey(),
            order.side.into(),
            order.order_id,
        );
        self.send(&[ix], vec![owner]).await
    }

    async fn settle_funds(
        &self,
        market: &Market,
        owner: &Keypair,
        open_orders: &OpenOrdersAccount,
        base_wallet: &Pubkey,
        quote_wallet: &Pubkey,
    ) -> VenueResult<Signature> {
        let ix = build_settle_funds_ix(
            market.program_id(),
            market.state(),
            &open_orders.address,
            &owner.pubkey(),
            base_wallet,
            quote_wallet,
        )?;
        self.send(&[ix], vec![owner]).await
    }
}
