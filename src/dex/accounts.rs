//! Account structures and deserialization for Serum DEX v3.
//!
//! Every DEX account is wrapped as `"serum" | account_flags (u64) | body | "padding"`.
//! Offsets below are absolute within the account data.

use serde::{Deserialize, Serialize};
use solana_pubkey::Pubkey;

use crate::dex::constants::{
    account_flag, event_flag, node_tag, ACCOUNT_HEAD_PADDING, ACCOUNT_PREFIX_SIZE,
    ACCOUNT_TAIL_PADDING, EVENT_QUEUE_HEADER_SIZE, EVENT_SIZE, MARKET_STATE_SIZE,
    MINT_DECIMALS_OFFSET, MINT_SIZE, OPEN_ORDERS_SIZE, OPEN_ORDERS_SLOTS, SLAB_HEADER_SIZE,
    SLAB_NODE_SIZE,
};
use crate::dex::error::{DexError, DexResult};

/// Helper to extract a fixed-size array from a slice
#[inline]
fn read_bytes<const N: usize>(data: &[u8], offset: usize) -> [u8; N] {
    let mut arr = [0u8; N];
    arr.copy_from_slice(&data[offset..offset + N]);
    arr
}

#[inline]
fn read_pubkey(data: &[u8], offset: usize) -> Pubkey {
    Pubkey::new_from_array(read_bytes::<32>(data, offset))
}

#[inline]
fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(read_bytes::<4>(data, offset))
}

#[inline]
fn read_u64(data: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(read_bytes::<8>(data, offset))
}

#[inline]
fn read_u128(data: &[u8], offset: usize) -> u128 {
    u128::from_le_bytes(read_bytes::<16>(data, offset))
}

fn check_len(data: &[u8], expected: usize) -> DexResult<()> {
    if data.len() < expected {
        return Err(DexError::InvalidDataLength {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Validate the head/tail padding and return the account flags.
fn read_account_prefix(data: &[u8], required_flags: u64) -> DexResult<u64> {
    check_len(data, ACCOUNT_PREFIX_SIZE + ACCOUNT_TAIL_PADDING.len())?;
    if &data[..5] != ACCOUNT_HEAD_PADDING || !data.ends_with(ACCOUNT_TAIL_PADDING) {
        return Err(DexError::InvalidPadding);
    }
    let flags = read_u64(data, 5);
    if flags & required_flags != required_flags {
        return Err(DexError::InvalidAccountFlags {
            expected: required_flags,
            actual: flags,
        });
    }
    Ok(flags)
}

// ============================================================================
// Market State (388 bytes)
// ============================================================================

/// Serum market state
///
/// Layout:
/// - [0..5]     "serum"
/// - [5..13]    account_flags
/// - [13..45]   own_address
/// - [45..53]   vault_signer_nonce
/// - [53..85]   base_mint
/// - [85..117]  quote_mint
/// - [117..149] base_vault
/// - [149..157] base_deposits_total
/// - [157..165] base_fees_accrued
/// - [165..197] quote_vault
/// - [197..205] quote_deposits_total
/// - [205..213] quote_fees_accrued
/// - [213..221] quote_dust_threshold
/// - [221..253] request_queue
/// - [253..285] event_queue
/// - [285..317] bids
/// - [317..349] asks
/// - [349..357] base_lot_size
/// - [357..365] quote_lot_size
/// - [365..373] fee_rate_bps
/// - [373..381] referrer_rebates_accrued
/// - [381..388] "padding"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketState {
    pub account_flags: u64,
    pub own_address: Pubkey,
    pub vault_signer_nonce: u64,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_vault: Pubkey,
    pub base_deposits_total: u64,
    pub base_fees_accrued: u64,
    pub quote_vault: Pubkey,
    pub quote_deposits_total: u64,
    pub quote_fees_accrued: u64,
    pub quote_dust_threshold: u64,
    pub request_queue: Pubkey,
    pub event_queue: Pubkey,
    pub bids: Pubkey,
    pub asks: Pubkey,
    pub base_lot_size: u64,
    pub quote_lot_size: u64,
    pub fee_rate_bps: u64,
    pub referrer_rebates_accrued: u64,
}

impl MarketState {
    /// Account size in bytes
    pub const LEN: usize = MARKET_STATE_SIZE;

    /// Deserialize from account data
    pub fn deserialize(data: &[u8]) -> DexResult<Self> {
        check_len(data, Self::LEN)?;
        let account_flags =
            read_account_prefix(data, account_flag::INITIALIZED | account_flag::MARKET)?;

        Ok(Self {
            account_flags,
            own_address: read_pubkey(data, 13),
            vault_signer_nonce: read_u64(data, 45),
            base_mint: read_pubkey(data, 53),
            quote_mint: read_pubkey(data, 85),
            base_vault: read_pubkey(data, 117),
            base_deposits_total: read_u64(data, 149),
            base_fees_accrued: read_u64(data, 157),
            quote_vault: read_pubkey(data, 165),
            quote_deposits_total: read_u64(data, 197),
            quote_fees_accrued: read_u64(data, 205),
            quote_dust_threshold: read_u64(data, 213),
            request_queue: read_pubkey(data, 221),
            event_queue: read_pubkey(data, 253),
            bids: read_pubkey(data, 285),
            asks: read_pubkey(data, 317),
            base_lot_size: read_u64(data, 349),
            quote_lot_size: read_u64(data, 357),
            fee_rate_bps: read_u64(data, 365),
            referrer_rebates_accrued: read_u64(data, 373),
        })
    }

    /// Whether the market has been disabled by its authority
    pub fn is_disabled(&self) -> bool {
        self.account_flags & account_flag::DISABLED != 0
    }
}

// ============================================================================
// Open Orders (3228 bytes)
// ============================================================================

/// Per-owner open orders account holding balances awaiting settlement
///
/// Layout:
/// - [0..5]       "serum"
/// - [5..13]      account_flags
/// - [13..45]     market
/// - [45..77]     owner
/// - [77..85]     base_token_free
/// - [85..93]     base_token_total
/// - [93..101]    quote_token_free
/// - [101..109]   quote_token_total
/// - [109..125]   free_slot_bits
/// - [125..141]   is_bid_bits
/// - [141..2189]  orders (128 x u128)
/// - [2189..3213] client_ids (128 x u64)
/// - [3213..3221] referrer_rebates_accrued
/// - [3221..3228] "padding"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrdersAccount {
    /// Address of this open orders account
    pub address: Pubkey,
    pub market: Pubkey,
    pub owner: Pubkey,
    pub base_token_free: u64,
    pub base_token_total: u64,
    pub quote_token_free: u64,
    pub quote_token_total: u64,
    /// Bit set means the slot is free
    pub free_slot_bits: u128,
    /// Bit set means the slot holds a bid
    pub is_bid_bits: u128,
    pub orders: Vec<u128>,
    pub client_ids: Vec<u64>,
    pub referrer_rebates_accrued: u64,
}

impl OpenOrdersAccount {
    /// Account size in bytes
    pub const LEN: usize = OPEN_ORDERS_SIZE;

    /// Deserialize from account data
    pub fn deserialize(address: Pubkey, data: &[u8]) -> DexResult<Self> {
        check_len(data, Self::LEN)?;
        read_account_prefix(data, account_flag::INITIALIZED | account_flag::OPEN_ORDERS)?;

        let orders = (0..OPEN_ORDERS_SLOTS)
            .map(|slot| read_u128(data, 141 + slot * 16))
            .collect();
        let client_ids = (0..OPEN_ORDERS_SLOTS)
            .map(|slot| read_u64(data, 2189 + slot * 8))
            .collect();

        Ok(Self {
            address,
            market: read_pubkey(data, 13),
            owner: read_pubkey(data, 45),
            base_token_free: read_u64(data, 77),
            base_token_total: read_u64(data, 85),
            quote_token_free: read_u64(data, 93),
            quote_token_total: read_u64(data, 101),
            free_slot_bits: read_u128(data, 109),
            is_bid_bits: read_u128(data, 125),
            orders,
            client_ids,
            referrer_rebates_accrued: read_u64(data, 3213),
        })
    }

    /// Whether any base or quote tokens are free to settle
    pub fn has_free_balance(&self) -> bool {
        self.base_token_free > 0 || self.quote_token_free > 0
    }
}

// ============================================================================
// Slab (bids / asks)
// ============================================================================

/// A resting order in the slab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlabLeaf {
    pub owner_slot: u8,
    pub fee_tier: u8,
    /// Order id: price in lots in the high 64 bits, sequence number in the low 64
    pub key: u128,
    /// Open orders account that owns the order
    pub owner: Pubkey,
    /// Remaining quantity in base lots
    pub quantity: u64,
    pub client_order_id: u64,
}

impl SlabLeaf {
    /// Limit price in quote lots per base lot
    pub fn price_lots(&self) -> u64 {
        (self.key >> 64) as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SlabNode {
    Inner { children: [u32; 2] },
    Leaf(SlabLeaf),
    Free,
}

/// Critbit tree holding one side of the book
///
/// Header (after the 13-byte account prefix):
/// - bump_index (u32), padding (4)
/// - free_list_len (u32), padding (4)
/// - free_list_head (u32)
/// - root (u32)
/// - leaf_count (u32), padding (4)
#[derive(Debug, Clone)]
pub struct Slab {
    pub account_flags: u64,
    pub root: u32,
    pub leaf_count: u32,
    nodes: Vec<SlabNode>,
}

impl Slab {
    /// Deserialize a bids or asks account
    pub fn deserialize(data: &[u8]) -> DexResult<Self> {
        let account_flags = read_account_prefix(data, account_flag::INITIALIZED)?;
        if account_flags & (account_flag::BIDS | account_flag::ASKS) == 0 {
            return Err(DexError::InvalidAccountFlags {
                expected: account_flag::BIDS | account_flag::ASKS,
                actual: account_flags,
            });
        }

        let header = ACCOUNT_PREFIX_SIZE;
        check_len(data, header + SLAB_HEADER_SIZE)?;
        let bump_index = read_u32(data, header);
        let root = read_u32(data, header + 20);
        let leaf_count = read_u32(data, header + 24);

        let nodes_start = header + SLAB_HEADER_SIZE;
        let nodes_end = nodes_start + bump_index as usize * SLAB_NODE_SIZE;
        check_len(data, nodes_end)?;

        let mut nodes = Vec::with_capacity(bump_index as usize);
        for index in 0..bump_index {
            let offset = nodes_start + index as usize * SLAB_NODE_SIZE;
            let node = match read_u32(data, offset) {
                node_tag::INNER => SlabNode::Inner {
                    children: [read_u32(data, offset + 24), read_u32(data, offset + 28)],
                },
                node_tag::LEAF => SlabNode::Leaf(SlabLeaf {
                    owner_slot: data[offset + 4],
                    fee_tier: data[offset + 5],
                    key: read_u128(data, offset + 8),
                    owner: read_pubkey(data, offset + 24),
                    quantity: read_u64(data, offset + 56),
                    client_order_id: read_u64(data, offset + 64),
                }),
                node_tag::UNINITIALIZED | node_tag::FREE | node_tag::LAST_FREE => SlabNode::Free,
                tag => return Err(DexError::InvalidNodeTag { tag, index }),
            };
            nodes.push(node);
        }

        Ok(Self {
            account_flags,
            root,
            leaf_count,
            nodes,
        })
    }

    /// Whether this slab holds bids (otherwise asks)
    pub fn is_bids(&self) -> bool {
        self.account_flags & account_flag::BIDS != 0
    }

    /// All resting orders, sorted ascending by key
    pub fn leaves(&self) -> DexResult<Vec<SlabLeaf>> {
        let mut leaves = Vec::with_capacity(self.leaf_count as usize);
        if self.leaf_count == 0 {
            return Ok(leaves);
        }

        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            let node = self.nodes.get(index as usize).ok_or(DexError::NodeOutOfBounds {
                index,
                len: self.nodes.len(),
            })?;
            match node {
                SlabNode::Inner { children } => {
                    stack.push(children[1]);
                    stack.push(children[0]);
                }
                SlabNode::Leaf(leaf) => leaves.push(leaf.clone()),
                SlabNode::Free => {}
            }
            // A well-formed tree never visits more nodes than it holds
            if leaves.len() > self.nodes.len() || stack.len() > self.nodes.len() {
                return Err(DexError::NodeOutOfBounds {
                    index,
                    len: self.nodes.len(),
                });
            }
        }

        leaves.sort_by_key(|leaf| leaf.key);
        Ok(leaves)
    }
}

// ============================================================================
// Event Queue
// ============================================================================

/// A matching engine event
///
/// Layout (88 bytes):
/// - [0]      event_flags
/// - [1]      open_orders_slot
/// - [2]      fee_tier
/// - [3..8]   padding
/// - [8..16]  native_quantity_released
/// - [16..24] native_quantity_paid
/// - [24..32] native_fee_or_rebate
/// - [32..48] order_id
/// - [48..80] open_orders
/// - [80..88] client_order_id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub event_flags: u8,
    pub open_orders_slot: u8,
    pub fee_tier: u8,
    pub native_quantity_released: u64,
    pub native_quantity_paid: u64,
    pub native_fee_or_rebate: u64,
    pub order_id: u128,
    pub open_orders: Pubkey,
    pub client_order_id: u64,
    /// Queue sequence number assigned when the event was pushed
    pub seq_num: u64,
}

impl Event {
    pub fn is_fill(&self) -> bool {
        self.event_flags & event_flag::FILL != 0
    }

    pub fn is_bid(&self) -> bool {
        self.event_flags & event_flag::BID != 0
    }

    pub fn is_maker(&self) -> bool {
        self.event_flags & event_flag::MAKER != 0
    }

    fn read(data: &[u8], offset: usize, seq_num: u64) -> Self {
        Self {
            event_flags: data[offset],
            open_orders_slot: data[offset + 1],
            fee_tier: data[offset + 2],
            native_quantity_released: read_u64(data, offset + 8),
            native_quantity_paid: read_u64(data, offset + 16),
            native_fee_or_rebate: read_u64(data, offset + 24),
            order_id: read_u128(data, offset + 32),
            open_orders: read_pubkey(data, offset + 48),
            client_order_id: read_u64(data, offset + 80),
            seq_num,
        }
    }
}

/// Decoded event queue ring buffer
///
/// Header (37 bytes): "serum", account_flags, head (u32), pad, count (u32), pad,
/// seq_num (u32), pad.
#[derive(Debug, Clone)]
pub struct EventQueue {
    pub head: u32,
    pub count: u32,
    pub seq_num: u32,
    /// Events ordered newest first, including already-consumed history
    pub events: Vec<Event>,
}

impl EventQueue {
    /// Deserialize up to `history` of the most recent events.
    pub fn deserialize(data: &[u8], history: usize) -> DexResult<Self> {
        read_account_prefix(data, account_flag::INITIALIZED | account_flag::EVENT_QUEUE)?;
        check_len(data, EVENT_QUEUE_HEADER_SIZE)?;

        let head = read_u32(data, 13);
        let count = read_u32(data, 21);
        let seq_num = read_u32(data, 29);

        let capacity = (data.len() - EVENT_QUEUE_HEADER_SIZE) / EVENT_SIZE;
        let mut events = Vec::new();
        if capacity == 0 {
            return Ok(Self {
                head,
                count,
                seq_num,
                events,
            });
        }

        let newest = head as usize + count as usize + capacity - 1;
        for i in 0..history.min(capacity) {
            // Entries older than the first push were never written
            let Some(event_seq) = (seq_num as u64).checked_sub(1 + i as u64) else {
                break;
            };
            let index = (newest - i) % capacity;
            let offset = EVENT_QUEUE_HEADER_SIZE + index * EVENT_SIZE;
            events.push(Event::read(data, offset, event_seq));
        }

        Ok(Self {
            head,
            count,
            seq_num,
            events,
        })
    }

    /// Fill events that moved funds, newest first
    pub fn fills(&self) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(|event| event.is_fill() && event.native_quantity_paid > 0)
    }
}

// ============================================================================
// SPL Mint
// ============================================================================

/// Read the decimals byte from an SPL token mint account
pub fn read_mint_decimals(data: &[u8]) -> DexResult<u8> {
    check_len(data, MINT_SIZE)?;
    Ok(data[MINT_DECIMALS_OFFSET])
}
