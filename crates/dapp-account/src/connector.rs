//! Wallet connection flow.
//!
//! Connecting asks the user to approve the accounts being exposed. When
//! caching is enabled the choice is remembered and later connections skip
//! the prompt until the cache is cleared on disconnect.

use crate::{AccountError, ApprovalInterface, LocalWallet};
use dapp_config::{NetworkConfig, WalletConfig};
use dapp_storage::{StorageKey, StorageService};
use std::sync::Arc;
use std::time::Duration;

/// Name under which the local key wallet is cached.
pub const LOCAL_CONNECTOR: &str = "local";

const CACHED_ID: &str = "cached";

/// Creates wallet handles and remembers the user's choice.
pub struct WalletConnector {
	network: NetworkConfig,
	wallet: WalletConfig,
	storage: StorageService,
	approver: Arc<dyn ApprovalInterface>,
}

impl WalletConnector {
	pub fn new(
		network: NetworkConfig,
		wallet: WalletConfig,
		storage: StorageService,
		approver: Arc<dyn ApprovalInterface>,
	) -> Self {
		Self {
			network,
			wallet,
			storage,
			approver,
		}
	}

	/// The connector remembered from an earlier run, if any.
	pub async fn cached_provider(&self) -> Result<Option<String>, AccountError> {
		Ok(self
			.storage
			.retrieve_optional(StorageKey::Connector, CACHED_ID)
			.await?)
	}

	/// Connects the local wallet.
	///
	/// # Errors
	/// Returns `UserCancelled` when the user declines the connection prompt,
	/// and `InvalidKey` when a configured key cannot be parsed.
	pub async fn connect(&self) -> Result<Arc<LocalWallet>, AccountError> {
		let wallet = LocalWallet::from_config(&self.network, &self.wallet, self.approver.clone())?;

		let cached = self.cached_provider().await?;
		if cached.as_deref() == Some(LOCAL_CONNECTOR) {
			tracing::debug!("Using cached connector");
		} else if !self.approver.approve_connection(wallet.addresses()).await {
			return Err(AccountError::UserCancelled(
				"Wallet connection was cancelled".to_string(),
			));
		}

		if self.wallet.cache_provider {
			self.storage
				.store(StorageKey::Connector, CACHED_ID, &LOCAL_CONNECTOR)
				.await?;
		}

		wallet.start_chain_watcher(Duration::from_secs(
			self.network.chain_poll_interval_seconds,
		));

		tracing::info!(
			account = %wallet.selected_address(),
			accounts = wallet.addresses().len(),
			"Wallet connected"
		);
		Ok(Arc::new(wallet))
	}

	/// Forgets the cached connector so the next connect prompts again.
	pub async fn clear_cached_provider(&self) -> Result<(), AccountError> {
		self.storage.remove(StorageKey::Connector, CACHED_ID).await?;
		tracing::debug!("Cleared cached connector");
		Ok(())
	}
}
