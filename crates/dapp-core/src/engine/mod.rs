//! Wiring of the client from configuration.
//!
//! [`DappEngine`] builds every service once: storage, the state writer, the
//! session, the delivery stack and, when configured, the relay. Front ends
//! connect through it and obtain handlers that share one context.

pub mod event_bus;

use self::event_bus::EventBus;
use crate::handlers::{
	FactoryHandler, FlagHandler, HandlerContext, HandlerSettings, IdentityHandler,
	RegistryHandler,
};
use crate::registry::IdentityRegistry;
use crate::session::Session;
use crate::state::StateHandle;
use crate::CoreError;
use alloy_primitives::Address;
use dapp_account::{ApprovalInterface, WalletConnector, WalletInterface};
use dapp_config::Config;
use dapp_delivery::implementations::evm::alloy::AlloyDelivery;
use dapp_delivery::{
	HttpRelayClient, RelayClient, RelayedWallet, SubmitterConfig, TransactionSubmitter,
};
use dapp_storage::{create_storage_backend, StorageService};
use dapp_types::{parse_units, AccountInfo, Notice, NATIVE_DECIMALS};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const NOTICE_CAPACITY: usize = 100;

/// Entry point owning all client services.
pub struct DappEngine {
	config: Config,
	connector: WalletConnector,
	approver: Arc<dyn ApprovalInterface>,
	relay_client: Option<Arc<dyn RelayClient>>,
	context: HandlerContext,
	writer: JoinHandle<()>,
}

impl DappEngine {
	/// Builds the engine from a validated configuration.
	pub async fn from_config(
		config: Config,
		approver: Arc<dyn ApprovalInterface>,
	) -> Result<Self, CoreError> {
		let contracts = config.contracts.addresses()?;
		let storage = StorageService::new(create_storage_backend(&config.storage));

		let stored_identity = IdentityRegistry::new(storage.clone()).get().await?;
		let (state, writer) = StateHandle::spawn(stored_identity);
		let registry = IdentityRegistry::new(storage.clone()).with_state(state.clone());

		let event_bus = EventBus::new(NOTICE_CAPACITY);
		let session = Session::new(
			state,
			registry.clone(),
			event_bus.clone(),
			config.network.chain_id,
			config.network.name.clone(),
		);

		let delivery = AlloyDelivery::from_config(&config.network)?;
		let submitter = TransactionSubmitter::new(
			Arc::new(delivery),
			SubmitterConfig::from(&config.delivery),
		);

		let settings = HandlerSettings {
			mint_value: parse_units(&config.delivery.mint_value, NATIVE_DECIMALS)?,
			mint_gas_limit: config.delivery.mint_gas_limit,
			native_symbol: config.network.native_symbol.clone(),
		};

		let relay_client = match &config.relay {
			Some(relay) => {
				let client: Arc<dyn RelayClient> = Arc::new(HttpRelayClient::new(&relay.url)?);
				tracing::info!(relay = %relay.url, "Transactions go through the relay");
				Some(client)
			},
			None => None,
		};

		let connector = WalletConnector::new(
			config.network.clone(),
			config.wallet.clone(),
			storage,
			approver.clone(),
		);

		tracing::info!(
			chain_id = config.network.chain_id,
			network = %config.network.name,
			"Engine ready"
		);

		Ok(Self {
			config,
			connector,
			approver,
			relay_client,
			context: HandlerContext {
				session,
				registry,
				submitter,
				event_bus,
				contracts,
				settings,
			},
			writer,
		})
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn session(&self) -> &Session {
		&self.context.session
	}

	pub fn registry(&self) -> &IdentityRegistry {
		&self.context.registry
	}

	/// Subscribes to user-facing notices.
	pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
		self.context.event_bus.subscribe()
	}

	/// Connects the wallet and starts the session.
	///
	/// With a relay configured, the wallet's transactions are relayed.
	pub async fn connect(&self) -> Result<Address, CoreError> {
		let result = self.connect_inner().await;
		self.context.report("connect", result)
	}

	async fn connect_inner(&self) -> Result<Address, CoreError> {
		let local = self.connector.connect().await?;

		let wallet: Arc<dyn WalletInterface> = match (&self.config.relay, &self.relay_client) {
			(Some(relay), Some(client)) => Arc::new(RelayedWallet::new(
				local,
				client.clone(),
				relay.clone(),
				self.approver.clone(),
			)),
			_ => local,
		};

		self.context.session.connect(wallet).await
	}

	/// Ends the session and forgets the cached connector.
	pub async fn disconnect(&self) -> Result<(), CoreError> {
		let result = async {
			self.connector.clear_cached_provider().await?;
			self.context.session.disconnect().await
		}
		.await;
		self.context.report("disconnect", result)
	}

	/// Reads and remembers the active account's info.
	pub async fn account_info(&self) -> Result<AccountInfo, CoreError> {
		let result = self.context.session.refresh().await;
		self.context.report("account_info", result)
	}

	pub fn flag(&self) -> FlagHandler {
		FlagHandler::new(self.context.clone())
	}

	pub fn identity(&self) -> IdentityHandler {
		IdentityHandler::new(self.context.clone())
	}

	pub fn factory(&self) -> FactoryHandler {
		FactoryHandler::new(self.context.clone())
	}

	pub fn identity_registry(&self) -> RegistryHandler {
		RegistryHandler::new(self.context.clone())
	}
}

impl Drop for DappEngine {
	fn drop(&mut self) {
		self.writer.abort();
	}
}
