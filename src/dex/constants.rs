//! Constants for the Serum DEX v3 program.
//!
//! Sizes, offsets and flags match the on-chain account layouts exactly.

use solana_pubkey::Pubkey;
use std::str::FromStr;

// ============================================================================
// Program IDs
// ============================================================================

lazy_static::lazy_static! {
    /// Serum DEX v3 program ID (mainnet-beta)
    pub static ref SERUM_DEX_V3_PROGRAM_ID: Pubkey = Pubkey::from_str("9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin").unwrap();

    /// SPL Token Program ID
    pub static ref TOKEN_PROGRAM_ID: Pubkey = Pubkey::from_str("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA").unwrap();
}

// ============================================================================
// Instruction Tags
// ============================================================================

/// Instruction layout version prefix
pub const INSTRUCTION_VERSION: u8 = 0;

/// Instruction tags (u32 little-endian after the version byte)
pub mod instruction {
    pub const SETTLE_FUNDS: u32 = 5;
    pub const NEW_ORDER_V3: u32 = 10;
    pub const CANCEL_ORDER_V2: u32 = 11;
}

// ============================================================================
// Account Padding & Flags
// ============================================================================

/// Every DEX account starts with these 5 bytes
pub const ACCOUNT_HEAD_PADDING: &[u8; 5] = b"serum";
/// Every DEX account ends with these 7 bytes
pub const ACCOUNT_TAIL_PADDING: &[u8; 7] = b"padding";

/// Account flag bits (u64 right after the head padding)
pub mod account_flag {
    pub const INITIALIZED: u64 = 1 << 0;
    pub const MARKET: u64 = 1 << 1;
    pub const OPEN_ORDERS: u64 = 1 << 2;
    pub const REQUEST_QUEUE: u64 = 1 << 3;
    pub const EVENT_QUEUE: u64 = 1 << 4;
    pub const BIDS: u64 = 1 << 5;
    pub const ASKS: u64 = 1 << 6;
    pub const DISABLED: u64 = 1 << 7;
}

/// Event flag bits (first byte of an event queue entry)
pub mod event_flag {
    pub const FILL: u8 = 1 << 0;
    pub const OUT: u8 = 1 << 1;
    pub const BID: u8 = 1 << 2;
    pub const MAKER: u8 = 1 << 3;
}

// ============================================================================
// Account Sizes
// ============================================================================

/// Market state account size (v2 layout with referrer rebates)
pub const MARKET_STATE_SIZE: usize = 388;
/// Open orders account size
pub const OPEN_ORDERS_SIZE: usize = 3228;
/// Slab header size (after the 13-byte account prefix)
pub const SLAB_HEADER_SIZE: usize = 32;
/// Slab node size (u32 tag + 68 byte body)
pub const SLAB_NODE_SIZE: usize = 72;
/// Event queue header size, including the account prefix
pub const EVENT_QUEUE_HEADER_SIZE: usize = 37;
/// Event queue entry size
pub const EVENT_SIZE: usize = 88;
/// SPL mint account size
pub const MINT_SIZE: usize = 82;

/// Length of the head padding plus the account flags
pub const ACCOUNT_PREFIX_SIZE: usize = 13;

/// Offset of the market pubkey within an open orders account
pub const OPEN_ORDERS_MARKET_OFFSET: usize = 13;
/// Offset of the owner pubkey within an open orders account
pub const OPEN_ORDERS_OWNER_OFFSET: usize = 45;
/// Offset of the decimals byte within an SPL mint account
pub const MINT_DECIMALS_OFFSET: usize = 44;

/// Order slots per open orders account
pub const OPEN_ORDERS_SLOTS: usize = 128;

/// Slab node tags
pub mod node_tag {
    pub const UNINITIALIZED: u32 = 0;
    pub const INNER: u32 = 1;
    pub const LEAF: u32 = 2;
    pub const FREE: u32 = 3;
    pub const LAST_FREE: u32 = 4;
}

/// Default matching limit passed with new orders
pub const DEFAULT_MATCH_LIMIT: u16 = 65535;
