//! Common constants used across the dApp client.

/// Decimals of the chain's native currency (wei per ether is 10^18).
pub const NATIVE_DECIMALS: u8 = 18;

/// Largest exponent whose power of ten still fits in a U256.
pub const MAX_DECIMALS: u8 = 77;

/// Fixed gas limit used for the capture-flag mint through the identity contract.
pub const DEFAULT_GAS_LIMIT_MINT: u64 = 1_000_000;
