//! Building, submitting and confirming transactions.
//!
//! Every submission starts from fresh chain state: the nonce, gas price and
//! gas estimate are read right before the request is handed to the wallet.
//! Nothing is retried. A transaction either confirms, fails on chain, or
//! runs past the deadline.

use crate::{DeliveryError, DeliveryInterface};
use alloy_primitives::{Address, B256, U256};
use dapp_account::WalletInterface;
use dapp_config::DeliveryConfig;
use dapp_types::{ConfirmedTransaction, EncodedCall, TransactionRequest};
use std::sync::Arc;
use std::time::Duration;

/// Confirmation policy for submitted transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitterConfig {
	/// Blocks that must exist on top of, and including, the inclusion block.
	pub confirmations: u64,
	/// Deadline measured from the moment the wallet returns the hash.
	pub timeout: Duration,
	/// Delay between receipt polls.
	pub poll_interval: Duration,
}

impl Default for SubmitterConfig {
	fn default() -> Self {
		Self::from(&DeliveryConfig::default())
	}
}

impl From<&DeliveryConfig> for SubmitterConfig {
	fn from(config: &DeliveryConfig) -> Self {
		Self {
			confirmations: config.confirmations,
			timeout: Duration::from_secs(config.timeout_seconds),
			poll_interval: Duration::from_secs(config.poll_interval_seconds),
		}
	}
}

/// Prepares transactions and tracks them to confirmation.
#[derive(Clone)]
pub struct TransactionSubmitter {
	delivery: Arc<dyn DeliveryInterface>,
	config: SubmitterConfig,
}

impl TransactionSubmitter {
	pub fn new(delivery: Arc<dyn DeliveryInterface>, config: SubmitterConfig) -> Self {
		Self { delivery, config }
	}

	pub fn config(&self) -> &SubmitterConfig {
		&self.config
	}

	/// Current gas price in wei.
	pub async fn current_gas_price(&self) -> Result<u128, DeliveryError> {
		self.delivery.gas_price().await
	}

	/// Gas needed to execute `call`.
	///
	/// There is no internal timeout; callers wrap this if they need one.
	pub async fn estimate_gas_limit(
		&self,
		call: &EncodedCall,
		from: Address,
		value: U256,
	) -> Result<u64, DeliveryError> {
		self.delivery.estimate_gas(from, call, value).await
	}

	/// Builds a fully populated request for `call`.
	///
	/// The gas limit is estimated unless `gas_limit_override` is given.
	pub async fn prepare(
		&self,
		call: &EncodedCall,
		from: Address,
		value: U256,
		gas_limit_override: Option<u64>,
	) -> Result<TransactionRequest, DeliveryError> {
		let nonce = self.delivery.nonce(from).await?;
		let gas_price = self.current_gas_price().await?;
		let gas_limit = match gas_limit_override {
			Some(limit) => limit,
			None => self.estimate_gas_limit(call, from, value).await?,
		};

		tracing::debug!(
			%from,
			to = %call.to,
			nonce,
			gas_price,
			gas_limit,
			"Prepared transaction"
		);

		Ok(TransactionRequest {
			from,
			to: call.to,
			data: call.data.clone(),
			value,
			nonce,
			gas_price,
			gas_limit,
			chain_id: self.delivery.chain_id(),
		})
	}

	/// Signs and broadcasts `request` through `wallet` and waits for it.
	///
	/// # Errors
	/// - `Account(UserRejected)` when the signer declines; nothing is sent.
	/// - `TransactionFailed` when the receipt reports failure.
	/// - `Timeout` when the deadline passes first.
	pub async fn submit(
		&self,
		request: TransactionRequest,
		wallet: &dyn WalletInterface,
	) -> Result<ConfirmedTransaction, DeliveryError> {
		let hash = wallet.sign_and_send(request).await?;
		tracing::info!(tx_hash = %hash, "Transaction sent");

		self.wait_for_confirmation(hash).await
	}

	/// Polls for the receipt of `hash` until it has enough confirmations.
	pub async fn wait_for_confirmation(
		&self,
		hash: B256,
	) -> Result<ConfirmedTransaction, DeliveryError> {
		tracing::info!(
			tx_hash = %hash,
			confirmations = self.config.confirmations,
			timeout_secs = self.config.timeout.as_secs(),
			"Waiting for confirmation"
		);

		match tokio::time::timeout(self.config.timeout, self.poll_until_confirmed(hash)).await {
			Ok(result) => result,
			Err(_) => {
				tracing::warn!(tx_hash = %hash, "Confirmation deadline passed");
				Err(DeliveryError::Timeout(format!(
					"Transaction {} not confirmed within {}s",
					hash,
					self.config.timeout.as_secs()
				)))
			},
		}
	}

	async fn poll_until_confirmed(&self, hash: B256) -> Result<ConfirmedTransaction, DeliveryError> {
		loop {
			match self.delivery.receipt(hash).await {
				Ok(Some(receipt)) => {
					if !receipt.success {
						tracing::error!(tx_hash = %hash, block = receipt.block_number, "Transaction failed");
						return Err(DeliveryError::TransactionFailed(format!(
							"Transaction {} reverted in block {}",
							hash, receipt.block_number
						)));
					}

					let confirmed = match self.delivery.block_number().await {
						Ok(current) => {
							current.saturating_sub(receipt.block_number) + 1
								>= self.config.confirmations
						},
						Err(e) => {
							tracing::debug!(tx_hash = %hash, error = %e, "Block number poll failed");
							false
						},
					};

					if confirmed {
						tracing::info!(tx_hash = %hash, block = receipt.block_number, "Transaction confirmed");
						return Ok(ConfirmedTransaction {
							hash: receipt.hash,
							block_number: receipt.block_number,
							block_hash: receipt.block_hash,
							logs: receipt.logs,
						});
					}
				},
				Ok(None) => {},
				Err(e) => {
					tracing::debug!(tx_hash = %hash, error = %e, "Receipt poll failed");
				},
			}

			tokio::time::sleep(self.config.poll_interval).await;
		}
	}
}
