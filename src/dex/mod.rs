//! Serum DEX v3 wire formats.
//!
//! Byte-exact account decoding and instruction building for the subset of the
//! DEX a trading session needs: market state, open orders, order book slabs,
//! the event queue, and the NewOrderV3 / CancelOrderV2 / SettleFunds instructions.

pub mod accounts;
pub mod constants;
pub mod error;
pub mod instructions;

pub use accounts::{
    read_mint_decimals, Event, EventQueue, MarketState, OpenOrdersAccount, Slab, SlabLeaf,
};
pub use constants::{SERUM_DEX_V3_PROGRAM_ID, TOKEN_PROGRAM_ID};
pub use error::{DexError, DexResult};
pub use instructions::{
    build_cancel_order_v2_ix, build_new_order_v3_ix, build_settle_funds_ix, vault_signer_address,
    DexOrderType, DexSide, NewOrderV3Params, SelfTradeBehavior,
};
