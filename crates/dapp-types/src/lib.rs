//! Common types module for the identity dApp client.
//!
//! This module defines the core data types shared by every crate in the
//! workspace: transactions and receipts, claim records, contract ABIs,
//! the information log, provider events and display utilities.

/// Transaction request and confirmation types.
pub mod account;
/// Claim records and their on-chain hash.
pub mod claim;
/// Contract ABIs, deployed addresses and call encoding.
pub mod contracts;
/// Receipt and log types returned by the delivery layer.
pub mod delivery;
/// Provider change events and user-facing notices.
pub mod events;
/// Session information log with account reconciliation.
pub mod info_log;
/// Secure string type for handling private keys.
pub mod secret_string;
/// Utility functions for formatting and unit conversion.
pub mod utils;

pub use account::{AccountInfo, ConfirmedTransaction, TransactionRequest};
pub use claim::{Claim, ClaimError, ClaimRecord, MINT_PERMISSION_IDENTIFIER};
pub use contracts::{selector, AbiError, ContractCall, ContractKind, EncodedCall};
pub use delivery::{Log, TransactionReceipt};
pub use events::{Notice, NoticeLevel, ProviderEvent};
pub use info_log::{InfoEntry, InfoKind, InformationLog};
pub use secret_string::SecretString;
pub use utils::{
	format_address_short, format_units, format_units_str, parse_address, parse_units, UnitsError,
	NATIVE_DECIMALS,
};
