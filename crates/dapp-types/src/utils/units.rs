//! Exact conversion between base units and display amounts.
//!
//! Balances are carried as `U256` base units end to end and only turned into
//! decimal strings at the edge. No floating point is involved, so a balance
//! of any size renders exactly.

use super::constants::MAX_DECIMALS;
use alloy_primitives::U256;
use thiserror::Error;

/// Errors produced while converting amounts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitsError {
	/// The amount or exponent is not acceptable input.
	#[error("Invalid input: {0}")]
	InvalidInput(String),
}

fn ten_pow(decimals: u8) -> Result<U256, UnitsError> {
	if decimals > MAX_DECIMALS {
		return Err(UnitsError::InvalidInput(format!(
			"Decimals {} exceed the maximum of {}",
			decimals, MAX_DECIMALS
		)));
	}
	Ok(U256::from(10u8).pow(U256::from(decimals)))
}

/// Formats an amount in base units as `amount / 10^decimals`.
///
/// Trailing fractional zeros are trimmed and whole amounts carry no decimal
/// point, so `1_500_000_000_000_000_000` with 18 decimals renders as `"1.5"`
/// and zero renders as `"0"`.
///
/// # Errors
/// Returns `InvalidInput` if `decimals` exceeds [`MAX_DECIMALS`].
pub fn format_units(amount: U256, decimals: u8) -> Result<String, UnitsError> {
	let divisor = ten_pow(decimals)?;
	let whole = amount / divisor;
	let fractional = amount % divisor;

	if fractional.is_zero() {
		return Ok(whole.to_string());
	}

	let fractional_str = format!(
		"{:0>width$}",
		fractional.to_string(),
		width = decimals as usize
	);
	let trimmed = fractional_str.trim_end_matches('0');

	Ok(format!("{}.{}", whole, trimmed))
}

/// Formats a base-unit amount given as a decimal string.
///
/// # Errors
/// Returns `InvalidInput` if the string is not a non-negative integer that
/// fits in 256 bits.
pub fn format_units_str(amount: &str, decimals: u8) -> Result<String, UnitsError> {
	let amount = parse_base_units(amount)?;
	format_units(amount, decimals)
}

/// Parses a base-unit integer string such as an RPC balance.
pub fn parse_base_units(amount: &str) -> Result<U256, UnitsError> {
	let amount = amount.trim();
	if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
		return Err(UnitsError::InvalidInput(format!(
			"'{}' is not a non-negative integer",
			amount
		)));
	}

	U256::from_str_radix(amount, 10)
		.map_err(|e| UnitsError::InvalidInput(format!("'{}': {}", amount, e)))
}

/// Parses a display amount such as `"0.1"` into base units.
///
/// This is the inverse of [`format_units`]. Input with more fractional
/// digits than `decimals` is rejected rather than rounded.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, UnitsError> {
	let multiplier = ten_pow(decimals)?;
	let amount = amount.trim();

	let (whole_str, fractional_str) = match amount.split_once('.') {
		Some((whole, fractional)) => (whole, fractional),
		None => (amount, ""),
	};

	if whole_str.is_empty() && fractional_str.is_empty() {
		return Err(UnitsError::InvalidInput(format!(
			"'{}' is not an amount",
			amount
		)));
	}
	if fractional_str.len() > decimals as usize {
		return Err(UnitsError::InvalidInput(format!(
			"'{}' has more than {} fractional digits",
			amount, decimals
		)));
	}

	let whole = if whole_str.is_empty() {
		U256::ZERO
	} else {
		parse_base_units(whole_str)?
	};
	let fractional = if fractional_str.is_empty() {
		U256::ZERO
	} else {
		let padded = format!("{:0<width$}", fractional_str, width = decimals as usize);
		parse_base_units(&padded)?
	};

	whole
		.checked_mul(multiplier)
		.and_then(|w| w.checked_add(fractional))
		.ok_or_else(|| UnitsError::InvalidInput(format!("'{}' overflows 256 bits", amount)))
}
