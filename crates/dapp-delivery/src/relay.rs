//! Meta-transaction relay.
//!
//! A relayed wallet keeps reading through the wrapped wallet but hands
//! transactions to a relay service, which pays for gas through the
//! configured paymaster. The relay settings are forwarded verbatim.

use crate::DeliveryError;
use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use dapp_account::{AccountError, ApprovalInterface, WalletInterface};
use dapp_types::{ProviderEvent, TransactionRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

pub use dapp_config::RelayConfig;

/// Trait for services that accept transactions on the user's behalf.
#[async_trait]
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait RelayClient: Send + Sync {
	/// Forwards `tx` with `config` and returns the relayed transaction hash.
	async fn relay(
		&self,
		tx: &TransactionRequest,
		config: &RelayConfig,
	) -> Result<B256, DeliveryError>;
}

#[derive(Serialize)]
struct RelayRequestBody<'a> {
	request: &'a TransactionRequest,
	config: &'a RelayConfig,
}

#[derive(Deserialize)]
struct RelayResponseBody {
	tx_hash: B256,
}

/// Relay client posting JSON to `{url}/relay`.
#[derive(Debug, Clone)]
pub struct HttpRelayClient {
	client: Client,
	base_url: String,
}

impl HttpRelayClient {
	pub fn new(base_url: &str) -> Result<Self, DeliveryError> {
		let client = Client::builder()
			.timeout(Duration::from_secs(30))
			.build()
			.map_err(|e| DeliveryError::Network(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
		})
	}
}

#[async_trait]
impl RelayClient for HttpRelayClient {
	async fn relay(
		&self,
		tx: &TransactionRequest,
		config: &RelayConfig,
	) -> Result<B256, DeliveryError> {
		let url = format!("{}/relay", self.base_url);
		let body = RelayRequestBody {
			request: tx,
			config,
		};

		let response = self
			.client
			.post(&url)
			.json(&body)
			.send()
			.await
			.map_err(|e| DeliveryError::Network(format!("Relay request failed: {}", e)))?;

		if !response.status().is_success() {
			let status = response.status();
			let text = response
				.text()
				.await
				.unwrap_or_else(|_| "Unknown error".to_string());
			return Err(DeliveryError::Network(format!(
				"Relay rejected request: {status}: {text}"
			)));
		}

		let body: RelayResponseBody = response
			.json()
			.await
			.map_err(|e| DeliveryError::Network(format!("Invalid relay response: {}", e)))?;

		tracing::info!(tx_hash = %body.tx_hash, relay = %self.base_url, "Transaction relayed");
		Ok(body.tx_hash)
	}
}

/// Wallet that reads through `inner` and sends through a relay.
pub struct RelayedWallet<W: WalletInterface + ?Sized> {
	inner: Arc<W>,
	client: Arc<dyn RelayClient>,
	config: RelayConfig,
	approver: Arc<dyn ApprovalInterface>,
}

impl<W: WalletInterface + ?Sized> RelayedWallet<W> {
	pub fn new(
		inner: Arc<W>,
		client: Arc<dyn RelayClient>,
		config: RelayConfig,
		approver: Arc<dyn ApprovalInterface>,
	) -> Self {
		Self {
			inner,
			client,
			config,
			approver,
		}
	}

	pub fn config(&self) -> &RelayConfig {
		&self.config
	}
}

#[async_trait]
impl<W: WalletInterface + ?Sized> WalletInterface for RelayedWallet<W> {
	async fn accounts(&self) -> Result<Vec<Address>, AccountError> {
		self.inner.accounts().await
	}

	async fn chain_id(&self) -> Result<u64, AccountError> {
		self.inner.chain_id().await
	}

	async fn balance(&self, address: Address) -> Result<U256, AccountError> {
		self.inner.balance(address).await
	}

	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, AccountError> {
		self.inner.call(to, data).await
	}

	async fn sign_and_send(&self, tx: TransactionRequest) -> Result<B256, AccountError> {
		if !self.approver.approve_transaction(&tx).await {
			return Err(AccountError::UserRejected(format!(
				"Relayed transaction to {} was declined",
				tx.to
			)));
		}

		self.client
			.relay(&tx, &self.config)
			.await
			.map_err(|e| AccountError::Network(e.to_string()))
	}

	fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
		self.inner.subscribe()
	}
}
