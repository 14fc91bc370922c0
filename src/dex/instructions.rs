//! Instruction builders for the Serum DEX v3 instructions used by a trading session.
//!
//! Instruction data is `version (u8 = 0) | tag (u32 LE) | fields...`.

use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;

use crate::dex::accounts::MarketState;
use crate::dex::constants::{instruction, INSTRUCTION_VERSION, TOKEN_PROGRAM_ID};
use crate::dex::error::{DexError, DexResult};

// ============================================================================
// Helper Functions
// ============================================================================

fn signer(pubkey: Pubkey) -> AccountMeta {
    AccountMeta::new_readonly(pubkey, true)
}

fn writable(pubkey: Pubkey) -> AccountMeta {
    AccountMeta::new(pubkey, false)
}

fn readonly(pubkey: Pubkey) -> AccountMeta {
    AccountMeta::new_readonly(pubkey, false)
}

fn instruction_data(tag: u32, capacity: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(5 + capacity);
    data.push(INSTRUCTION_VERSION);
    data.extend_from_slice(&tag.to_le_bytes());
    data
}

/// Derive the vault signer that owns the market's token vaults.
///
/// Seeds: [market, vault_signer_nonce (8 bytes LE)]
pub fn vault_signer_address(
    market: &Pubkey,
    vault_signer_nonce: u64,
    program_id: &Pubkey,
) -> DexResult<Pubkey> {
    Pubkey::create_program_address(
        &[market.as_ref(), &vault_signer_nonce.to_le_bytes()],
        program_id,
    )
    .map_err(|_| DexError::InvalidVaultSignerNonce(vault_signer_nonce))
}

// ============================================================================
// Parameter Types
// ============================================================================

/// Side as encoded on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DexSide {
    Bid = 0,
    Ask = 1,
}

/// Order type as encoded on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DexOrderType {
    Limit = 0,
    ImmediateOrCancel = 1,
    PostOnly = 2,
}

/// Self-trade behavior as encoded on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum SelfTradeBehavior {
    #[default]
    DecrementTake = 0,
    CancelProvide = 1,
    AbortTransaction = 2,
}

/// Fields of a NewOrderV3 instruction, all in lots / native units
#[derive(Debug, Clone)]
pub struct NewOrderV3Params {
    pub side: DexSide,
    pub limit_price: u64,
    pub max_base_quantity: u64,
    pub max_native_quote_quantity_including_fees: u64,
    pub self_trade_behavior: SelfTradeBehavior,
    pub order_type: DexOrderType,
    pub client_order_id: u64,
    pub limit: u16,
}

// ============================================================================
// Instruction Builders
// ============================================================================

/// Build NewOrderV3 instruction.
///
/// Accounts:
/// 0. market (mut)
/// 1. open_orders (mut)
/// 2. request_queue (mut)
/// 3. event_queue (mut)
/// 4. bids (mut)
/// 5. asks (mut)
/// 6. payer (mut) - token account debited for the order
/// 7. owner (signer) - open orders owner
/// 8. base_vault (mut)
/// 9. quote_vault (mut)
/// 10. token_program (readonly)
/// 11. rent sysvar (readonly)
pub fn build_new_order_v3_ix(
    program_id: &Pubkey,
    market: &MarketState,
    open_orders: &Pubkey,
    payer: &Pubkey,
    owner: &Pubkey,
    params: &NewOrderV3Params,
) -> Instruction {
    let accounts = vec![
        writable(market.own_address),
        writable(*open_orders),
        writable(market.request_queue),
        writable(market.event_queue),
        writable(market.bids),
        writable(market.asks),
        writable(*payer),
        signer(*owner),
        writable(market.base_vault),
        writable(market.quote_vault),
        readonly(*TOKEN_PROGRAM_ID),
        readonly(solana_sdk_ids::sysvar::rent::ID),
    ];

    // Data: side (u32), limit_price (u64), max_base_qty (u64), max_quote_qty (u64),
    // self_trade (u32), order_type (u32), client_order_id (u64), limit (u16)
    let mut data = instruction_data(instruction::NEW_ORDER_V3, 46);
    data.extend_from_slice(&(params.side as u32).to_le_bytes());
    data.extend_from_slice(&params.limit_price.to_le_bytes());
    data.extend_from_slice(&params.max_base_quantity.to_le_bytes());
    data.extend_from_slice(&params.max_native_quote_quantity_including_fees.to_le_bytes());
    data.extend_from_slice(&(params.self_trade_behavior as u32).to_le_bytes());
    data.extend_from_slice(&(params.order_type as u32).to_le_bytes());
    data.extend_from_slice(&params.client_order_id.to_le_bytes());
    data.extend_from_slice(&params.limit.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Build CancelOrderV2 instruction.
///
/// Accounts:
/// 0. market (readonly)
/// 1. bids (mut)
/// 2. asks (mut)
/// 3. open_orders (mut)
/// 4. owner (signer)
/// 5. event_queue (mut)
pub fn build_cancel_order_v2_ix(
    program_id: &Pubkey,
    market: &MarketState,
    open_orders: &Pubkey,
    owner: &Pubkey,
    side: DexSide,
    order_id: u128,
) -> Instruction {
    let accounts = vec![
        readonly(market.own_address),
        writable(market.bids),
        writable(market.asks),
        writable(*open_orders),
        signer(*owner),
        writable(market.event_queue),
    ];

    let mut data = instruction_data(instruction::CANCEL_ORDER_V2, 20);
    data.extend_from_slice(&(side as u32).to_le_bytes());
    data.extend_from_slice(&order_id.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Build SettleFunds instruction.
///
/// Accounts:
/// 0. market (mut)
/// 1. open_orders (mut)
/// 2. owner (signer)
/// 3. base_vault (mut)
/// 4. quote_vault (mut)
/// 5. base_wallet (mut)
/// 6. quote_wallet (mut)
/// 7. vault_signer (readonly)
/// 8. token_program (readonly)
pub fn build_settle_funds_ix(
    program_id: &Pubkey,
    market: &MarketState,
    open_orders: &Pubkey,
    owner: &Pubkey,
    base_wallet: &Pubkey,
    quote_wallet: &Pubkey,
) -> DexResult<Instruction> {
    let vault_signer =
        vault_signer_address(&market.own_address, market.vault_signer_nonce, program_id)?;

    let accounts = vec![
        writable(market.own_address),
        writable(*open_orders),
        signer(*owner),
        writable(market.base_vault),
        writable(market.quote_vault),
        writable(*base_wallet),
        writable(*quote_wallet),
        readonly(vault_signer),
        readonly(*TOKEN_PROGRAM_ID),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: instruction_data(instruction::SETTLE_FUNDS, 0),
    })
}
