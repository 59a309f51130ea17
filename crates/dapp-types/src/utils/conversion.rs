//! Conversion utilities for caller-supplied strings.

use alloy_primitives::Address;

/// Parse a hex string into a chain address.
///
/// Accepts the 40 hex characters with or without a "0x" prefix. Mixed-case
/// input is accepted without checksum validation, as wallets commonly hand
/// out lowercase addresses.
///
/// # Returns
/// * `Ok(Address)` if the string is a well-formed 20-byte address
/// * `Err(String)` with the reason otherwise
pub fn parse_address(hex_str: &str) -> Result<Address, String> {
	let trimmed = hex_str.trim();
	if trimmed.is_empty() {
		return Err("Address is empty".to_string());
	}
	trimmed
		.parse::<Address>()
		.map_err(|e| format!("Invalid address '{}': {}", hex_str, e))
}
