//! Solana RPC endpoints.

/// Default Solana RPC URL (mainnet-beta), where Serum DEX v3 markets live.
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Solana devnet RPC URL.
pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";
