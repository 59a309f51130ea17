//! Utility functions for common type conversions and transformations.
//!
//! This module provides helper functions for converting between base units
//! and display amounts, parsing addresses, and shortening addresses for display.

pub mod constants;
pub mod conversion;
pub mod formatting;
pub mod units;

#[cfg(any(test, feature = "testing"))]
pub mod tests;

pub use constants::{DEFAULT_GAS_LIMIT_MINT, MAX_DECIMALS, NATIVE_DECIMALS};
pub use conversion::parse_address;
pub use formatting::format_address_short;
pub use units::{format_units, format_units_str, parse_base_units, parse_units, UnitsError};
