//! Transaction delivery module for the identity dApp client.
//!
//! This module reads chain state needed to build transactions (nonce, gas
//! price, gas estimates), hands fully populated requests to the wallet for
//! signing and broadcasting, and waits for them to confirm. A relay variant
//! of the wallet forwards requests to a meta-transaction relay instead.

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use dapp_account::AccountError;
use dapp_types::{AbiError, EncodedCall, TransactionReceipt};
use thiserror::Error;

/// Meta-transaction relay client and relayed wallet.
pub mod relay;
/// Transaction preparation and confirmation tracking.
pub mod submitter;

pub use relay::{HttpRelayClient, RelayClient, RelayedWallet};
pub use submitter::{SubmitterConfig, TransactionSubmitter};

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Errors that can occur during transaction delivery.
#[derive(Debug, Error)]
pub enum DeliveryError {
	/// Error that occurs when talking to the node or relay.
	#[error("Network error: {0}")]
	Network(String),
	/// A simulated call would revert.
	#[error("Execution reverted: {reason}")]
	Revert { reason: String },
	/// The transaction was included but its execution failed.
	#[error("Transaction failed: {0}")]
	TransactionFailed(String),
	/// The transaction did not confirm before the deadline.
	#[error("Timed out: {0}")]
	Timeout(String),
	/// The call could not be encoded.
	#[error(transparent)]
	Abi(#[from] AbiError),
	/// The wallet refused or failed to sign.
	#[error(transparent)]
	Account(#[from] AccountError),
}

/// Trait defining the node-facing reads the submitter needs.
#[async_trait]
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait DeliveryInterface: Send + Sync {
	/// Chain this implementation talks to.
	fn chain_id(&self) -> u64;

	/// Current gas price in wei.
	async fn gas_price(&self) -> Result<u128, DeliveryError>;

	/// Gas needed to execute `call` from `from` with `value` attached.
	///
	/// Fails with `Revert` when the simulation reverts.
	async fn estimate_gas(
		&self,
		from: Address,
		call: &EncodedCall,
		value: U256,
	) -> Result<u64, DeliveryError>;

	/// Next nonce for `address`, including pending transactions.
	async fn nonce(&self, address: Address) -> Result<u64, DeliveryError>;

	/// Receipt of `hash`, or `None` while the transaction is pending.
	async fn receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>, DeliveryError>;

	/// Latest block number.
	async fn block_number(&self) -> Result<u64, DeliveryError>;
}
