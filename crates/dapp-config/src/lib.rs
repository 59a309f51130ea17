//! Configuration module for the identity dApp client.
//!
//! This module provides structures and utilities for loading the client
//! configuration from TOML files. Values may reference environment variables
//! with `${VAR}` or `${VAR:-default}`, which are resolved before parsing, and
//! the parsed configuration is validated before it is handed out.

pub mod builders;

pub use builders::config::ConfigBuilder;

use alloy_primitives::Address;
use dapp_types::utils::DEFAULT_GAS_LIMIT_MINT;
use dapp_types::{parse_address, parse_units, SecretString, NATIVE_DECIMALS};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the identity dApp client.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	/// Chain the client expects to talk to.
	pub network: NetworkConfig,
	/// Deployed contract addresses.
	pub contracts: ContractsConfig,
	/// Local wallet keys and connector caching.
	pub wallet: WalletConfig,
	/// Persistence of the identity address and connector choice.
	#[serde(default)]
	pub storage: StorageConfig,
	/// Transaction submission parameters.
	#[serde(default)]
	pub delivery: DeliveryConfig,
	/// Optional meta-transaction relay.
	#[serde(default)]
	pub relay: Option<RelayConfig>,
}

/// Network the wallet is expected to be connected to.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
	/// Chain ID the contracts are deployed on.
	pub chain_id: u64,
	/// JSON-RPC endpoint.
	pub rpc_url: String,
	/// Display name, e.g. "Mumbai".
	#[serde(default = "default_network_name")]
	pub name: String,
	/// Symbol of the native currency.
	#[serde(default = "default_native_symbol")]
	pub native_symbol: String,
	/// How often the wallet watcher polls the chain ID.
	#[serde(default = "default_chain_poll_interval_seconds")]
	pub chain_poll_interval_seconds: u64,
}

fn default_network_name() -> String {
	"Mumbai".to_string()
}

fn default_native_symbol() -> String {
	"MATIC".to_string()
}

fn default_chain_poll_interval_seconds() -> u64 {
	4
}

/// Addresses of the contracts the dApp talks to.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractsConfig {
	/// Template identity contract whose owner may deploy new identities.
	pub identity: String,
	/// Identity factory contract.
	pub identity_factory: String,
	/// Capture-the-flag NFT contract.
	pub capture_flag: String,
}

/// Parsed contract addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
	pub identity: Address,
	pub identity_factory: Address,
	pub capture_flag: Address,
}

impl ContractsConfig {
	/// Parses all three addresses.
	pub fn addresses(&self) -> Result<ContractAddresses, ConfigError> {
		let parse = |name: &str, value: &str| {
			parse_address(value)
				.map_err(|e| ConfigError::Validation(format!("contracts.{name}: {e}")))
		};
		Ok(ContractAddresses {
			identity: parse("identity", &self.identity)?,
			identity_factory: parse("identity_factory", &self.identity_factory)?,
			capture_flag: parse("capture_flag", &self.capture_flag)?,
		})
	}
}

/// Local wallet configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
	/// Hex-encoded private keys, one per selectable account.
	pub private_keys: Vec<SecretString>,
	/// Index of the account selected on connect.
	#[serde(default)]
	pub default_account: usize,
	/// Whether the chosen connector is remembered across runs.
	#[serde(default = "default_true")]
	pub cache_provider: bool,
}

fn default_true() -> bool {
	true
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
	File,
	Memory,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
	#[serde(default = "default_storage_backend")]
	pub backend: StorageBackend,
	/// Directory used by the file backend.
	#[serde(default = "default_storage_path")]
	pub path: String,
}

fn default_storage_backend() -> StorageBackend {
	StorageBackend::File
}

fn default_storage_path() -> String {
	"./data".to_string()
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			backend: default_storage_backend(),
			path: default_storage_path(),
		}
	}
}

/// Configuration for transaction submission.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
	/// Blocks to wait for after inclusion.
	#[serde(default = "default_confirmations")]
	pub confirmations: u64,
	/// Deadline for a transaction to confirm.
	#[serde(default = "default_timeout_seconds")]
	pub timeout_seconds: u64,
	/// Receipt polling interval.
	#[serde(default = "default_poll_interval_seconds")]
	pub poll_interval_seconds: u64,
	/// Native value forwarded by `execute` when minting, in display units.
	#[serde(default = "default_mint_value")]
	pub mint_value: String,
	/// Fixed gas limit of the mint transaction.
	#[serde(default = "default_mint_gas_limit")]
	pub mint_gas_limit: u64,
}

fn default_confirmations() -> u64 {
	1
}

fn default_timeout_seconds() -> u64 {
	1500
}

fn default_poll_interval_seconds() -> u64 {
	2
}

fn default_mint_value() -> String {
	"0.1".to_string()
}

fn default_mint_gas_limit() -> u64 {
	DEFAULT_GAS_LIMIT_MINT
}

impl Default for DeliveryConfig {
	fn default() -> Self {
		Self {
			confirmations: default_confirmations(),
			timeout_seconds: default_timeout_seconds(),
			poll_interval_seconds: default_poll_interval_seconds(),
			mint_value: default_mint_value(),
			mint_gas_limit: default_mint_gas_limit(),
		}
	}
}

/// Meta-transaction relay settings.
///
/// Everything except `url` is forwarded to the relay untouched.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RelayConfig {
	/// Relay endpoint that accepts transaction requests.
	#[serde(skip_serializing)]
	pub url: String,
	pub paymaster_address: String,
	#[serde(default = "default_relay_log_level")]
	pub log_level: String,
	#[serde(default = "default_relay_window")]
	pub relay_lookup_window_blocks: u64,
	#[serde(default = "default_relay_window")]
	pub relay_registration_lookup_blocks: u64,
	#[serde(default = "default_relay_window")]
	pub past_events_query_max_page_size: u64,
}

fn default_relay_log_level() -> String {
	"error".to_string()
}

fn default_relay_window() -> u64 {
	1000
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {e}")))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let var_name = name.as_str();

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{var_name}' not found"
					)))
				},
			},
		};

		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a TOML file.
	///
	/// Environment variables referenced by the file must already be set; the
	/// binary loads `.env` before calling this.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path.as_ref()).await?;
		content.parse()
	}

	/// Validates the configuration.
	///
	/// - the RPC URL is present and uses an http(s) or ws(s) scheme
	/// - all contract addresses are well formed
	/// - at least one private key is configured and the default index exists
	/// - confirmations, timeout and poll interval are non-zero
	/// - the mint value is a valid native amount
	pub fn validate(&self) -> Result<(), ConfigError> {
		let rpc_url = self.network.rpc_url.trim();
		if rpc_url.is_empty() {
			return Err(ConfigError::Validation(
				"network.rpc_url cannot be empty".into(),
			));
		}
		if !["http://", "https://", "ws://", "wss://"]
			.iter()
			.any(|scheme| rpc_url.starts_with(scheme))
		{
			return Err(ConfigError::Validation(format!(
				"network.rpc_url '{rpc_url}' must be an http(s) or ws(s) URL"
			)));
		}
		if self.network.chain_poll_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"network.chain_poll_interval_seconds must be greater than 0".into(),
			));
		}

		self.contracts.addresses()?;

		if self.wallet.private_keys.is_empty() {
			return Err(ConfigError::Validation(
				"wallet.private_keys must contain at least one key".into(),
			));
		}
		if self.wallet.private_keys.iter().any(|key| key.is_empty()) {
			return Err(ConfigError::Validation(
				"wallet.private_keys cannot contain empty keys".into(),
			));
		}
		if self.wallet.default_account >= self.wallet.private_keys.len() {
			return Err(ConfigError::Validation(format!(
				"wallet.default_account {} is out of range for {} key(s)",
				self.wallet.default_account,
				self.wallet.private_keys.len()
			)));
		}

		if self.storage.backend == StorageBackend::File && self.storage.path.trim().is_empty() {
			return Err(ConfigError::Validation(
				"storage.path cannot be empty for the file backend".into(),
			));
		}

		if self.delivery.confirmations == 0 {
			return Err(ConfigError::Validation(
				"delivery.confirmations must be at least 1".into(),
			));
		}
		if self.delivery.timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"delivery.timeout_seconds must be greater than 0".into(),
			));
		}
		if self.delivery.poll_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"delivery.poll_interval_seconds must be greater than 0".into(),
			));
		}
		parse_units(&self.delivery.mint_value, NATIVE_DECIMALS).map_err(|e| {
			ConfigError::Validation(format!("delivery.mint_value: {e}"))
		})?;

		Ok(())
	}
}

/// Implementation of FromStr trait for Config to enable parsing from string.
///
/// Environment variables are resolved and the configuration is validated
/// after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
