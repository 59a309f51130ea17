//! Display formatting for addresses.

use alloy_primitives::Address;

/// Format an address for display in shortened form, e.g. `0x1234...7890`.
pub fn format_address_short(address: Address) -> String {
	let full = format!("{:#x}", address);
	if full.len() > 10 {
		format!("{}...{}", &full[0..6], &full[full.len() - 4..])
	} else {
		full
	}
}
