//! Wallet access for the identity dApp client.
//!
//! This module defines the provider capability the rest of the client works
//! against: reading accounts, chain and balances, read-only contract calls,
//! and signing plus broadcasting transactions. It also owns the user-consent
//! seam, so a signer that declines a transaction surfaces as
//! [`AccountError::UserRejected`] rather than a transport failure.

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use dapp_types::{ProviderEvent, TransactionRequest};
use thiserror::Error;
use tokio::sync::broadcast;

/// Wallet connector with cached-choice persistence.
pub mod connector;

pub use connector::{WalletConnector, LOCAL_CONNECTOR};

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

pub use implementations::local::LocalWallet;

/// Errors that can occur during wallet operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// The user declined to connect a wallet.
	#[error("Connection cancelled: {0}")]
	UserCancelled(String),
	/// The user declined to sign a transaction.
	#[error("Transaction rejected: {0}")]
	UserRejected(String),
	/// No wallet is available.
	#[error("No provider: {0}")]
	NoProvider(String),
	/// Error that occurs when talking to the RPC endpoint.
	#[error("Network error: {0}")]
	Network(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when persisting the connector choice.
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<dapp_storage::StorageError> for AccountError {
	fn from(err: dapp_storage::StorageError) -> Self {
		AccountError::Storage(err.to_string())
	}
}

/// Trait defining the provider capability handed to the rest of the client.
///
/// Implementations must be cheap to share behind an `Arc`; the session holds
/// one handle and every handler borrows it.
#[async_trait]
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait WalletInterface: Send + Sync {
	/// Accounts exposed by the wallet, the selected one first.
	async fn accounts(&self) -> Result<Vec<Address>, AccountError>;

	/// Chain ID the wallet is currently connected to.
	async fn chain_id(&self) -> Result<u64, AccountError>;

	/// Native balance of `address` in base units.
	async fn balance(&self, address: Address) -> Result<U256, AccountError>;

	/// Performs a read-only call and returns the raw return data.
	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, AccountError>;

	/// Asks the user to approve, signs and broadcasts a transaction.
	///
	/// Returns the transaction hash once the node accepted it.
	async fn sign_and_send(&self, tx: TransactionRequest) -> Result<B256, AccountError>;

	/// Subscribes to account, chain and disconnect notifications.
	fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Trait for asking the user to confirm wallet actions.
#[async_trait]
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait ApprovalInterface: Send + Sync {
	/// Whether the user agrees to connect with the given accounts.
	async fn approve_connection(&self, accounts: &[Address]) -> bool;

	/// Whether the user agrees to sign `tx`.
	async fn approve_transaction(&self, tx: &TransactionRequest) -> bool;
}

/// Approves every request without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl ApprovalInterface for AutoApprove {
	async fn approve_connection(&self, _accounts: &[Address]) -> bool {
		true
	}

	async fn approve_transaction(&self, _tx: &TransactionRequest) -> bool {
		true
	}
}
