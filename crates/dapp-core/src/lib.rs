//! Core of the identity dApp client.
//!
//! This crate ties the lower layers together: it owns the session with the
//! connected wallet, the single-writer state for the information log and the
//! chosen identity contract, the notification bus, and the handlers behind
//! every user-facing operation. Handlers report failures both as a returned
//! [`CoreError`] and as an error notice on the bus.

use dapp_account::AccountError;
use dapp_config::ConfigError;
use dapp_delivery::DeliveryError;
use dapp_storage::StorageError;
use dapp_types::{AbiError, ClaimError, UnitsError};
use thiserror::Error;

pub mod engine;
pub mod handlers;
pub mod info;
pub mod registry;
pub mod session;
pub mod state;

pub use engine::{event_bus::EventBus, DappEngine};
pub use registry::IdentityRegistry;
pub use session::Session;
pub use state::{StateHandle, StateSnapshot};

/// Errors surfaced by user-facing operations.
#[derive(Debug, Error)]
pub enum CoreError {
	/// The signer declined a transaction.
	#[error("Transaction rejected: {0}")]
	UserRejected(String),
	/// The user cancelled the wallet connection.
	#[error("Connection cancelled: {0}")]
	UserCancelled(String),
	/// RPC or transport failure.
	#[error("Network error: {0}")]
	Network(String),
	/// The transaction was included but reverted.
	#[error("Transaction failed on chain: {0}")]
	Chain(String),
	/// A simulated call would revert.
	#[error("Execution reverted: {reason}")]
	Revert { reason: String },
	/// The confirmation deadline passed.
	#[error("Timed out: {0}")]
	Timeout(String),
	#[error("Invalid input: {0}")]
	InvalidInput(String),
	#[error("Invalid address: {0}")]
	InvalidAddress(String),
	/// Arguments do not fit the method signature.
	#[error("ABI mismatch: {0}")]
	AbiMismatch(String),
	/// The connected account lacks the ownership an operation requires.
	#[error("Not owner: {0}")]
	NotOwner(String),
	/// No wallet is connected.
	#[error("No provider: {0}")]
	NoProvider(String),
	#[error("Storage error: {0}")]
	Storage(String),
	#[error("Configuration error: {0}")]
	Config(String),
}

impl From<AccountError> for CoreError {
	fn from(err: AccountError) -> Self {
		match err {
			AccountError::UserCancelled(msg) => CoreError::UserCancelled(msg),
			AccountError::UserRejected(msg) => CoreError::UserRejected(msg),
			AccountError::NoProvider(msg) => CoreError::NoProvider(msg),
			AccountError::Network(msg) => CoreError::Network(msg),
			AccountError::InvalidKey(msg) => CoreError::Config(msg),
			AccountError::SigningFailed(msg) => CoreError::InvalidInput(msg),
			AccountError::Storage(msg) => CoreError::Storage(msg),
		}
	}
}

impl From<DeliveryError> for CoreError {
	fn from(err: DeliveryError) -> Self {
		match err {
			DeliveryError::Network(msg) => CoreError::Network(msg),
			DeliveryError::Revert { reason } => CoreError::Revert { reason },
			DeliveryError::TransactionFailed(msg) => CoreError::Chain(msg),
			DeliveryError::Timeout(msg) => CoreError::Timeout(msg),
			DeliveryError::Abi(err) => err.into(),
			DeliveryError::Account(err) => err.into(),
		}
	}
}

impl From<StorageError> for CoreError {
	fn from(err: StorageError) -> Self {
		CoreError::Storage(err.to_string())
	}
}

impl From<AbiError> for CoreError {
	fn from(err: AbiError) -> Self {
		CoreError::AbiMismatch(err.to_string())
	}
}

impl From<UnitsError> for CoreError {
	fn from(err: UnitsError) -> Self {
		match err {
			UnitsError::InvalidInput(msg) => CoreError::InvalidInput(msg),
		}
	}
}

impl From<ClaimError> for CoreError {
	fn from(err: ClaimError) -> Self {
		match err {
			ClaimError::Encoding(msg) => CoreError::InvalidAddress(msg),
		}
	}
}

impl From<ConfigError> for CoreError {
	fn from(err: ConfigError) -> Self {
		CoreError::Config(err.to_string())
	}
}
