//! Configuration builder for creating test and development configurations.
//!
//! This module provides utilities for constructing Config instances with
//! defaults that point at a local Anvil node, particularly useful for tests.

use crate::{
	Config, ContractsConfig, DeliveryConfig, NetworkConfig, RelayConfig, StorageBackend,
	StorageConfig, WalletConfig,
};
use dapp_types::SecretString;

/// First Anvil development key.
const ANVIL_KEY_0: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Builder for creating `Config` instances with a fluent API.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	chain_id: u64,
	rpc_url: String,
	identity: String,
	identity_factory: String,
	capture_flag: String,
	private_keys: Vec<String>,
	cache_provider: bool,
	storage_backend: StorageBackend,
	storage_path: String,
	confirmations: u64,
	timeout_seconds: u64,
	poll_interval_seconds: u64,
	relay: Option<RelayConfig>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	/// Creates a new `ConfigBuilder` with in-memory storage and Anvil defaults.
	pub fn new() -> Self {
		Self {
			chain_id: 31337,
			rpc_url: "http://localhost:8545".to_string(),
			identity: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
			identity_factory: "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512".to_string(),
			capture_flag: "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0".to_string(),
			private_keys: vec![ANVIL_KEY_0.to_string()],
			cache_provider: false,
			storage_backend: StorageBackend::Memory,
			storage_path: "./data".to_string(),
			confirmations: 1,
			timeout_seconds: 1500,
			poll_interval_seconds: 2,
			relay: None,
		}
	}

	pub fn chain_id(mut self, chain_id: u64) -> Self {
		self.chain_id = chain_id;
		self
	}

	pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
		self.rpc_url = url.into();
		self
	}

	/// Sets the template identity contract address.
	pub fn identity(mut self, address: impl Into<String>) -> Self {
		self.identity = address.into();
		self
	}

	pub fn identity_factory(mut self, address: impl Into<String>) -> Self {
		self.identity_factory = address.into();
		self
	}

	pub fn capture_flag(mut self, address: impl Into<String>) -> Self {
		self.capture_flag = address.into();
		self
	}

	/// Replaces the wallet keys.
	pub fn private_keys(mut self, keys: Vec<String>) -> Self {
		self.private_keys = keys;
		self
	}

	pub fn cache_provider(mut self, enabled: bool) -> Self {
		self.cache_provider = enabled;
		self
	}

	/// Uses the file backend rooted at `path`.
	pub fn file_storage(mut self, path: impl Into<String>) -> Self {
		self.storage_backend = StorageBackend::File;
		self.storage_path = path.into();
		self
	}

	pub fn confirmations(mut self, confirmations: u64) -> Self {
		self.confirmations = confirmations;
		self
	}

	pub fn timeout_seconds(mut self, timeout: u64) -> Self {
		self.timeout_seconds = timeout;
		self
	}

	pub fn poll_interval_seconds(mut self, interval: u64) -> Self {
		self.poll_interval_seconds = interval;
		self
	}

	pub fn relay(mut self, relay: RelayConfig) -> Self {
		self.relay = Some(relay);
		self
	}

	/// Builds the `Config` with the configured values.
	///
	/// The result is not validated; call [`Config::validate`] when needed.
	pub fn build(self) -> Config {
		Config {
			network: NetworkConfig {
				chain_id: self.chain_id,
				rpc_url: self.rpc_url,
				name: "Anvil".to_string(),
				native_symbol: "ETH".to_string(),
				chain_poll_interval_seconds: 4,
			},
			contracts: ContractsConfig {
				identity: self.identity,
				identity_factory: self.identity_factory,
				capture_flag: self.capture_flag,
			},
			wallet: WalletConfig {
				private_keys: self.private_keys.into_iter().map(SecretString::from).collect(),
				default_account: 0,
				cache_provider: self.cache_provider,
			},
			storage: StorageConfig {
				backend: self.storage_backend,
				path: self.storage_path,
			},
			delivery: DeliveryConfig {
				confirmations: self.confirmations,
				timeout_seconds: self.timeout_seconds,
				poll_interval_seconds: self.poll_interval_seconds,
				..DeliveryConfig::default()
			},
			relay: self.relay,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_build_is_valid() {
		let config = ConfigBuilder::new().build();
		assert!(config.validate().is_ok());
		assert_eq!(config.network.chain_id, 31337);
		assert_eq!(config.storage.backend, StorageBackend::Memory);
	}

	#[test]
	fn test_builder_overrides() {
		let config = ConfigBuilder::new()
			.chain_id(80001)
			.file_storage("/tmp/dapp")
			.confirmations(3)
			.cache_provider(true)
			.build();

		assert_eq!(config.network.chain_id, 80001);
		assert_eq!(config.storage.backend, StorageBackend::File);
		assert_eq!(config.storage.path, "/tmp/dapp");
		assert_eq!(config.delivery.confirmations, 3);
		assert!(config.wallet.cache_provider);
	}

	#[test]
	fn test_invalid_values_fail_validation() {
		let config = ConfigBuilder::new().identity("0x1234").build();
		assert!(config.validate().is_err());

		let config = ConfigBuilder::new().private_keys(vec![]).build();
		assert!(config.validate().is_err());
	}
}
