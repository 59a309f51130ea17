//! Handlers for user-facing operations.
//!
//! Each handler reads through the connected wallet, builds and submits
//! transactions through the submitter, and records results in the session
//! state. Failures are caught at the handler boundary: they are published as
//! error notices and returned unchanged to the caller. Nothing is retried.

pub mod factory;
pub mod flag;
pub mod identity;
pub mod registry;

pub use factory::FactoryHandler;
pub use flag::FlagHandler;
pub use identity::{IdentityHandler, IdentityState};
pub use registry::RegistryHandler;

use crate::engine::event_bus::EventBus;
use crate::registry::IdentityRegistry;
use crate::session::Session;
use crate::CoreError;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use dapp_config::ContractAddresses;
use dapp_delivery::TransactionSubmitter;
use dapp_types::{parse_address, ConfirmedTransaction, ContractCall, EncodedCall, Notice};

/// Values handlers need from configuration.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
	/// Native value the identity forwards when minting the flag.
	pub mint_value: U256,
	/// Fixed gas limit for the mint call.
	pub mint_gas_limit: u64,
	/// Symbol of the native currency, for notices.
	pub native_symbol: String,
}

/// Services shared by all handlers.
#[derive(Clone)]
pub struct HandlerContext {
	pub session: Session,
	pub registry: IdentityRegistry,
	pub submitter: TransactionSubmitter,
	pub event_bus: EventBus,
	pub contracts: ContractAddresses,
	pub settings: HandlerSettings,
}

impl HandlerContext {
	/// Runs a read-only contract call through the wallet.
	pub(crate) async fn read(&self, call: ContractCall) -> Result<Vec<DynSolValue>, CoreError> {
		let wallet = self.session.wallet().await?;
		let encoded = call.encode()?;
		let output = wallet.call(encoded.to, encoded.data).await?;
		Ok(call.decode_output(&output)?)
	}

	/// Reads a call expected to return a single address.
	pub(crate) async fn read_address(&self, call: ContractCall) -> Result<Address, CoreError> {
		let method = call.method.clone();
		self.read(call)
			.await?
			.first()
			.and_then(DynSolValue::as_address)
			.ok_or_else(|| CoreError::AbiMismatch(format!("{method} did not return an address")))
	}

	/// Prepares, signs and waits for a transaction from the active account.
	pub(crate) async fn send(
		&self,
		call: &EncodedCall,
		value: U256,
		gas_limit_override: Option<u64>,
	) -> Result<ConfirmedTransaction, CoreError> {
		let (wallet, account) = self.session.wallet_and_account().await?;
		let request = self
			.submitter
			.prepare(call, account, value, gas_limit_override)
			.await?;
		Ok(self.submitter.submit(request, wallet.as_ref()).await?)
	}

	/// The identity contract operations act on.
	///
	/// The stored choice wins; otherwise the oldest identity contract in the
	/// information log is used.
	///
	/// # Errors
	/// Returns `InvalidInput` when neither is available.
	pub(crate) async fn identity_address(&self) -> Result<Address, CoreError> {
		let stored = self.registry.get().await?;
		let candidate = if stored.is_empty() {
			self.session
				.state()
				.snapshot()
				.log
				.identity_contracts()
				.first()
				.map(|s| s.to_string())
		} else {
			Some(stored)
		};

		let address = candidate
			.ok_or_else(|| CoreError::InvalidInput("No identity contract provided".to_string()))?;
		parse_address(&address).map_err(CoreError::InvalidAddress)
	}

	pub(crate) fn notify(&self, notice: Notice) {
		// Nobody listening is not an error for the operation.
		let _ = self.event_bus.publish(notice);
	}

	/// Publishes an error notice for a failed operation and passes the result on.
	pub(crate) fn report<T>(
		&self,
		operation: &str,
		result: Result<T, CoreError>,
	) -> Result<T, CoreError> {
		if let Err(e) = &result {
			tracing::warn!(operation, error = %e, "Operation failed");
			self.notify(Notice::error(e.to_string()));
		}
		result
	}
}
