//! Error types for Serum DEX account decoding and instruction building.

use thiserror::Error;

/// Layout and arithmetic errors raised by the `dex` module
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DexError {
    /// Account data shorter than the layout requires
    #[error("Invalid data length: expected {expected}, got {actual}")]
    InvalidDataLength { expected: usize, actual: usize },

    /// Missing "serum" head padding or "padding" tail
    #[error("Invalid account padding")]
    InvalidPadding,

    /// Account flags do not describe the expected account kind
    #[error("Invalid account flags: expected {expected:#x}, got {actual:#x}")]
    InvalidAccountFlags { expected: u64, actual: u64 },

    /// Market state does not belong to the requested address
    #[error("Invalid market: {0}")]
    InvalidMarket(String),

    /// Unknown slab node tag
    #[error("Invalid slab node tag {tag} at index {index}")]
    InvalidNodeTag { tag: u32, index: u32 },

    /// Slab node index out of bounds
    #[error("Slab node index {index} out of bounds ({len} nodes)")]
    NodeOutOfBounds { index: u32, len: usize },

    /// Lot size of zero or decimals too large to scale
    #[error("Invalid lot size: {0}")]
    InvalidLotSize(String),

    /// Arithmetic overflow
    #[error("Arithmetic overflow")]
    Overflow,

    /// Vault signer could not be derived from the market nonce
    #[error("Invalid vault signer nonce: {0}")]
    InvalidVaultSignerNonce(u64),
}

/// Result type alias for DEX operations
pub type DexResult<T> = Result<T, DexError>;
