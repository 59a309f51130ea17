//! Local key wallet backed by an Alloy provider.
//!
//! Each configured private key gets its own provider with an
//! `EthereumWallet` filler, so switching accounts only changes which
//! provider signs. A background task polls the chain ID and reports changes
//! through the wallet's event channel, the way an injected browser wallet
//! reports `chainChanged`.

use crate::{AccountError, ApprovalInterface, WalletInterface};
use alloy_network::EthereumWallet;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use dapp_config::{NetworkConfig, WalletConfig};
use dapp_types::{ProviderEvent, SecretString, TransactionRequest};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Wallet holding one or more private keys in memory.
pub struct LocalWallet {
	/// One signing provider per key, in configuration order.
	providers: Vec<DynProvider>,
	addresses: Vec<Address>,
	selected: AtomicUsize,
	approver: Arc<dyn ApprovalInterface>,
	events: broadcast::Sender<ProviderEvent>,
	watcher: Mutex<Option<JoinHandle<()>>>,
}

impl LocalWallet {
	/// Creates a wallet for `keys` talking to `rpc_url`.
	///
	/// No request is sent until the wallet is used.
	pub fn new(
		rpc_url: &str,
		chain_id: u64,
		keys: &[SecretString],
		approver: Arc<dyn ApprovalInterface>,
	) -> Result<Self, AccountError> {
		if keys.is_empty() {
			return Err(AccountError::InvalidKey(
				"At least one private key is required".to_string(),
			));
		}

		let mut providers = Vec::with_capacity(keys.len());
		let mut addresses = Vec::with_capacity(keys.len());

		for (index, key) in keys.iter().enumerate() {
			let signer = key
				.with_exposed(|k| k.trim().parse::<PrivateKeySigner>())
				.map_err(|e| {
					AccountError::InvalidKey(format!("Invalid private key #{}: {}", index, e))
				})?
				.with_chain_id(Some(chain_id));
			addresses.push(signer.address());

			let url = rpc_url.parse().map_err(|e| {
				AccountError::NoProvider(format!("Invalid RPC URL {}: {}", rpc_url, e))
			})?;

			let provider = ProviderBuilder::new()
				.wallet(EthereumWallet::from(signer))
				.connect_http(url);
			providers.push(provider.erased());
		}

		let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

		Ok(Self {
			providers,
			addresses,
			selected: AtomicUsize::new(0),
			approver,
			events,
			watcher: Mutex::new(None),
		})
	}

	/// Creates a wallet from the network and wallet configuration sections.
	pub fn from_config(
		network: &NetworkConfig,
		wallet: &WalletConfig,
		approver: Arc<dyn ApprovalInterface>,
	) -> Result<Self, AccountError> {
		let local = Self::new(
			&network.rpc_url,
			network.chain_id,
			&wallet.private_keys,
			approver,
		)?;
		local.select_account(wallet.default_account)?;
		Ok(local)
	}

	/// All addresses held by this wallet, in configuration order.
	pub fn addresses(&self) -> &[Address] {
		&self.addresses
	}

	/// The currently selected address.
	pub fn selected_address(&self) -> Address {
		self.addresses[self.selected_index()]
	}

	fn selected_index(&self) -> usize {
		self.selected.load(Ordering::SeqCst)
	}

	fn selected_provider(&self) -> &DynProvider {
		&self.providers[self.selected_index()]
	}

	/// Switches the selected account and emits `AccountsChanged`.
	pub fn select_account(&self, index: usize) -> Result<Address, AccountError> {
		let address = *self.addresses.get(index).ok_or_else(|| {
			AccountError::InvalidKey(format!(
				"Account index {} out of range for {} key(s)",
				index,
				self.addresses.len()
			))
		})?;

		let previous = self.selected.swap(index, Ordering::SeqCst);
		if previous != index {
			tracing::info!(account = %address, "Selected account changed");
			// No subscribers is fine
			let _ = self.events.send(ProviderEvent::AccountsChanged(vec![address]));
		}
		Ok(address)
	}

	/// Starts polling the chain ID every `interval`.
	///
	/// A change is published as `ChainChanged`. Calling this again replaces
	/// the previous watcher.
	pub fn start_chain_watcher(&self, interval: Duration) {
		let provider = self.selected_provider().clone();
		let events = self.events.clone();

		let handle = tokio::spawn(async move {
			let mut last_chain_id: Option<u64> = None;
			let mut ticker = tokio::time::interval(interval);

			loop {
				ticker.tick().await;
				match provider.get_chain_id().await {
					Ok(chain_id) => {
						if last_chain_id.is_some_and(|last| last != chain_id) {
							tracing::info!(chain_id, "Chain changed");
							let _ = events.send(ProviderEvent::ChainChanged(chain_id));
						}
						last_chain_id = Some(chain_id);
					},
					Err(e) => {
						tracing::debug!(error = %e, "Chain ID poll failed");
					},
				}
			}
		});

		if let Ok(mut watcher) = self.watcher.lock() {
			if let Some(previous) = watcher.replace(handle) {
				previous.abort();
			}
		}
	}
}

impl Drop for LocalWallet {
	fn drop(&mut self) {
		if let Ok(mut watcher) = self.watcher.lock() {
			if let Some(handle) = watcher.take() {
				handle.abort();
			}
		}
		let _ = self.events.send(ProviderEvent::Disconnected);
	}
}

#[async_trait]
impl WalletInterface for LocalWallet {
	async fn accounts(&self) -> Result<Vec<Address>, AccountError> {
		let selected = self.selected_index();
		let mut accounts = Vec::with_capacity(self.addresses.len());
		accounts.push(self.addresses[selected]);
		accounts.extend(
			self.addresses
				.iter()
				.enumerate()
				.filter(|(i, _)| *i != selected)
				.map(|(_, address)| *address),
		);
		Ok(accounts)
	}

	async fn chain_id(&self) -> Result<u64, AccountError> {
		self.selected_provider()
			.get_chain_id()
			.await
			.map_err(|e| AccountError::Network(format!("Failed to get chain ID: {}", e)))
	}

	async fn balance(&self, address: Address) -> Result<U256, AccountError> {
		self.selected_provider()
			.get_balance(address)
			.await
			.map_err(|e| AccountError::Network(format!("Failed to get balance: {}", e)))
	}

	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, AccountError> {
		let request = alloy_rpc_types::TransactionRequest::default()
			.from(self.selected_address())
			.to(to)
			.input(data.into());

		self.selected_provider()
			.call(request)
			.await
			.map_err(|e| AccountError::Network(format!("Call to {} failed: {}", to, e)))
	}

	async fn sign_and_send(&self, tx: TransactionRequest) -> Result<B256, AccountError> {
		let signer = self.selected_address();
		if tx.from != signer {
			return Err(AccountError::SigningFailed(format!(
				"Transaction sender {} is not the selected account {}",
				tx.from, signer
			)));
		}

		if !self.approver.approve_transaction(&tx).await {
			tracing::info!(to = %tx.to, "Transaction rejected by user");
			return Err(AccountError::UserRejected(format!(
				"Transaction to {} was declined",
				tx.to
			)));
		}

		let chain_id = tx.chain_id;
		let request: alloy_rpc_types::TransactionRequest = tx.into();

		tracing::debug!(
			chain_id,
			to = ?request.to,
			value = ?request.value,
			gas_limit = ?request.gas,
			"Sending transaction"
		);

		let pending = self
			.selected_provider()
			.send_transaction(request)
			.await
			.map_err(|e| {
				tracing::error!(chain_id, error = %e, "Transaction submission failed");
				AccountError::Network(format!("Failed to send transaction: {}", e))
			})?;

		Ok(*pending.tx_hash())
	}

	fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
		self.events.subscribe()
	}
}
