//! Alloy-based implementation of the delivery reads.
//!
//! The provider here carries no wallet: signing belongs to the connected
//! wallet, this side only reads chain state and receipts.

use crate::{DeliveryError, DeliveryInterface};
use alloy_primitives::{Address, B256, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{Panic, Revert, SolError};
use alloy_transport::TransportError;
use async_trait::async_trait;
use dapp_config::NetworkConfig;
use dapp_types::{EncodedCall, Log, TransactionReceipt};

/// Alloy-based EVM delivery implementation.
pub struct AlloyDelivery {
	provider: DynProvider,
	chain_id: u64,
}

impl AlloyDelivery {
	/// Creates a read-only provider for `rpc_url`.
	pub fn new(rpc_url: &str, chain_id: u64) -> Result<Self, DeliveryError> {
		let url = rpc_url
			.parse()
			.map_err(|e| DeliveryError::Network(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;

		let provider = ProviderBuilder::new().connect_http(url).erased();

		Ok(Self { provider, chain_id })
	}

	pub fn from_config(network: &NetworkConfig) -> Result<Self, DeliveryError> {
		Self::new(&network.rpc_url, network.chain_id)
	}
}

/// Best-effort human readable reason for a reverted simulation.
///
/// `data` is the revert payload returned by the node, if any. Standard
/// `Error(string)` and `Panic(uint256)` payloads are decoded; otherwise the
/// node's message is used with its "execution reverted" prefix removed.
pub(crate) fn revert_reason(message: &str, data: Option<&[u8]>) -> String {
	if let Some(data) = data {
		if let Ok(revert) = Revert::abi_decode(data) {
			return revert.reason;
		}
		if let Ok(panic) = Panic::abi_decode(data) {
			return panic.to_string();
		}
	}

	let trimmed = message
		.strip_prefix("execution reverted")
		.map(|rest| rest.trim_start_matches(':').trim())
		.unwrap_or(message);

	if trimmed.is_empty() {
		"execution reverted".to_string()
	} else {
		trimmed.to_string()
	}
}

fn classify_estimate_error(err: TransportError) -> DeliveryError {
	if let Some(payload) = err.as_error_resp() {
		let data = payload.as_revert_data();
		if data.is_some() || payload.message.contains("revert") {
			return DeliveryError::Revert {
				reason: revert_reason(&payload.message, data.as_ref().map(|b| b.as_ref())),
			};
		}
	}
	DeliveryError::Network(format!("Failed to estimate gas: {}", err))
}

#[async_trait]
impl DeliveryInterface for AlloyDelivery {
	fn chain_id(&self) -> u64 {
		self.chain_id
	}

	async fn gas_price(&self) -> Result<u128, DeliveryError> {
		self.provider
			.get_gas_price()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get gas price: {}", e)))
	}

	async fn estimate_gas(
		&self,
		from: Address,
		call: &EncodedCall,
		value: U256,
	) -> Result<u64, DeliveryError> {
		let request = TransactionRequest::default()
			.from(from)
			.to(call.to)
			.value(value)
			.input(call.data.clone().into());

		self.provider
			.estimate_gas(request)
			.await
			.map_err(classify_estimate_error)
	}

	async fn nonce(&self, address: Address) -> Result<u64, DeliveryError> {
		self.provider
			.get_transaction_count(address)
			.pending()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get nonce: {}", e)))
	}

	async fn receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>, DeliveryError> {
		let receipt = self
			.provider
			.get_transaction_receipt(hash)
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get receipt: {}", e)))?;

		Ok(receipt.map(|receipt| {
			let logs = receipt
				.inner
				.logs()
				.iter()
				.map(|log| Log {
					address: log.address(),
					topics: log.topics().to_vec(),
					data: log.inner.data.data.clone(),
				})
				.collect();

			TransactionReceipt {
				hash: receipt.transaction_hash,
				block_number: receipt.block_number.unwrap_or(0),
				block_hash: receipt.block_hash,
				success: receipt.status(),
				logs,
			}
		}))
	}

	async fn block_number(&self) -> Result<u64, DeliveryError> {
		self.provider
			.get_block_number()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get block number: {}", e)))
	}
}
