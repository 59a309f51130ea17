//! Wallet session lifecycle.
//!
//! A session exists between `connect` and `disconnect`. Connecting reads the
//! wallet's accounts, appends the stored identity contract and the active
//! account to the information log, and starts a watcher on the wallet's
//! change notifications. Account changes re-run that initialization; chain
//! changes refresh the account info and warn when the wallet left the
//! expected chain. The log outlives sessions: reconnecting appends to it and
//! reconciliation keeps one entry per account.

use crate::engine::event_bus::EventBus;
use crate::registry::IdentityRegistry;
use crate::state::StateHandle;
use crate::{info, CoreError};
use alloy_primitives::Address;
use dapp_account::WalletInterface;
use dapp_types::{AccountInfo, InfoEntry, Notice, ProviderEvent};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

#[derive(Clone)]
struct Connected {
	wallet: Arc<dyn WalletInterface>,
	account: Address,
}

/// The connected wallet and what is known about it.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct Session {
	current: Arc<RwLock<Option<Connected>>>,
	last_info: Arc<RwLock<Option<AccountInfo>>>,
	watcher: Arc<Mutex<Option<JoinHandle<()>>>>,
	state: StateHandle,
	registry: IdentityRegistry,
	event_bus: EventBus,
	expected_chain_id: u64,
	network_name: String,
}

impl Session {
	pub fn new(
		state: StateHandle,
		registry: IdentityRegistry,
		event_bus: EventBus,
		expected_chain_id: u64,
		network_name: impl Into<String>,
	) -> Self {
		Self {
			current: Arc::new(RwLock::new(None)),
			last_info: Arc::new(RwLock::new(None)),
			watcher: Arc::new(Mutex::new(None)),
			state,
			registry,
			event_bus,
			expected_chain_id,
			network_name: network_name.into(),
		}
	}

	pub async fn is_connected(&self) -> bool {
		self.current.read().await.is_some()
	}

	/// Active account, if connected.
	pub async fn account(&self) -> Option<Address> {
		self.current.read().await.as_ref().map(|c| c.account)
	}

	/// The wallet handle.
	///
	/// # Errors
	/// Returns `NoProvider` when no wallet is connected.
	pub async fn wallet(&self) -> Result<Arc<dyn WalletInterface>, CoreError> {
		Ok(self.connected().await?.wallet)
	}

	/// Wallet handle together with the active account.
	pub async fn wallet_and_account(
		&self,
	) -> Result<(Arc<dyn WalletInterface>, Address), CoreError> {
		let connected = self.connected().await?;
		Ok((connected.wallet, connected.account))
	}

	async fn connected(&self) -> Result<Connected, CoreError> {
		self.current
			.read()
			.await
			.clone()
			.ok_or_else(|| CoreError::NoProvider("No wallet connected".to_string()))
	}

	pub fn state(&self) -> &StateHandle {
		&self.state
	}

	pub fn expected_chain_id(&self) -> u64 {
		self.expected_chain_id
	}

	/// Attaches `wallet`, initializes the session and starts watching it.
	///
	/// A previous session is torn down first.
	pub async fn connect(&self, wallet: Arc<dyn WalletInterface>) -> Result<Address, CoreError> {
		if self.is_connected().await {
			self.disconnect().await?;
		}

		let events = wallet.subscribe();
		let account = self.init(wallet).await?;
		self.spawn_watcher(events);
		Ok(account)
	}

	/// Re-reads accounts and appends them to the information log.
	async fn init(&self, wallet: Arc<dyn WalletInterface>) -> Result<Address, CoreError> {
		let accounts = wallet.accounts().await?;
		let account = *accounts
			.first()
			.ok_or_else(|| CoreError::NoProvider("Wallet exposed no accounts".to_string()))?;

		let stored = self.registry.get().await?;
		let mut entries = Vec::with_capacity(2);
		if !stored.is_empty() {
			entries.push(InfoEntry::identity_added(stored));
		}
		entries.push(InfoEntry::account(account.to_string()));

		*self.current.write().await = Some(Connected { wallet, account });
		*self.last_info.write().await = None;
		self.state.switch_account(Some(account), entries).await?;

		tracing::info!(%account, "Session initialized");
		Ok(account)
	}

	/// Stops watching and drops the wallet handle.
	pub async fn disconnect(&self) -> Result<(), CoreError> {
		if let Ok(mut watcher) = self.watcher.lock() {
			if let Some(handle) = watcher.take() {
				handle.abort();
			}
		}
		self.teardown().await
	}

	async fn teardown(&self) -> Result<(), CoreError> {
		let previous = self.current.write().await.take();
		*self.last_info.write().await = None;
		self.state.switch_account(None, Vec::new()).await?;

		if let Some(previous) = previous {
			tracing::info!(account = %previous.account, "Session closed");
		}
		Ok(())
	}

	/// Reads account info and remembers it.
	pub async fn refresh(&self) -> Result<AccountInfo, CoreError> {
		let info = info::read_account_info(self).await?;
		*self.last_info.write().await = Some(info.clone());
		Ok(info)
	}

	/// Account info from the latest refresh.
	pub async fn last_account_info(&self) -> Option<AccountInfo> {
		self.last_info.read().await.clone()
	}

	fn spawn_watcher(&self, mut events: broadcast::Receiver<ProviderEvent>) {
		let session = self.clone();
		let handle = tokio::spawn(async move {
			loop {
				match events.recv().await {
					Ok(event) => {
						if !session.handle_event(event).await {
							break;
						}
					},
					Err(broadcast::error::RecvError::Lagged(skipped)) => {
						tracing::warn!(skipped, "Missed provider events");
					},
					Err(broadcast::error::RecvError::Closed) => break,
				}
			}
			tracing::debug!("Session watcher stopped");
		});

		if let Ok(mut watcher) = self.watcher.lock() {
			if let Some(previous) = watcher.replace(handle) {
				previous.abort();
			}
		}
	}

	/// Reacts to one provider event. Returns false once the session ended.
	async fn handle_event(&self, event: ProviderEvent) -> bool {
		match event {
			ProviderEvent::AccountsChanged(accounts) => {
				tracing::info!(account = ?accounts.first(), "Accounts changed");
				let Ok(wallet) = self.wallet().await else {
					return false;
				};
				if let Err(e) = self.init(wallet).await {
					tracing::warn!(error = %e, "Re-initialization failed");
					let _ = self.event_bus.publish(Notice::error(e.to_string()));
					return true;
				}
				self.refresh_quietly().await;
				true
			},
			ProviderEvent::ChainChanged(chain_id) => {
				if chain_id != self.expected_chain_id {
					tracing::warn!(
						chain_id,
						expected = self.expected_chain_id,
						"Wallet switched to an unexpected chain"
					);
					let _ = self.event_bus.publish(Notice::warning(format!(
						"Please use {} network",
						self.network_name
					)));
				}
				self.refresh_quietly().await;
				true
			},
			ProviderEvent::Disconnected => {
				tracing::info!("Wallet disconnected");
				if let Err(e) = self.teardown().await {
					tracing::warn!(error = %e, "Teardown after disconnect failed");
				}
				false
			},
		}
	}

	async fn refresh_quietly(&self) {
		if let Err(e) = self.refresh().await {
			tracing::debug!(error = %e, "Account info refresh failed");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, U256};
	use dapp_account::MockWalletInterface;
	use dapp_storage::implementations::memory::MemoryStorage;
	use dapp_storage::StorageService;
	use dapp_types::{InfoKind, NoticeLevel};
	use std::time::Duration;
	use tokio::sync::watch;

	const ALICE: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
	const BOB: Address = address!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");
	const IDENTITY: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
	const DEPLOYED: &str = "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0";

	struct Fixture {
		session: Session,
		registry: IdentityRegistry,
		event_bus: EventBus,
	}

	fn fixture() -> Fixture {
		let (state, _writer) = StateHandle::spawn(String::new());
		let registry = IdentityRegistry::new(StorageService::new(Arc::new(MemoryStorage::new())))
			.with_state(state.clone());
		let event_bus = EventBus::new(16);
		let session = Session::new(state, registry.clone(), event_bus.clone(), 80001, "Mumbai");
		Fixture {
			session,
			registry,
			event_bus,
		}
	}

	/// Mock wallet whose active account can be switched from the test.
	fn wallet(
		active: watch::Receiver<Address>,
		events: &broadcast::Sender<ProviderEvent>,
	) -> MockWalletInterface {
		let mut wallet = MockWalletInterface::new();
		let receiver = events.subscribe();
		wallet.expect_subscribe().return_once(move || receiver);
		wallet.expect_accounts().returning(move || {
			let account = *active.borrow();
			Box::pin(async move { Ok(vec![account]) })
		});
		wallet
			.expect_chain_id()
			.returning(|| Box::pin(async { Ok(80001) }));
		wallet
			.expect_balance()
			.returning(|_| Box::pin(async { Ok(U256::from(1_500_000_000_000_000_000u128)) }));
		wallet
	}

	async fn wait_for_account(session: &Session, expected: Option<Address>) {
		let mut snapshots = session.state().watch();
		tokio::time::timeout(Duration::from_secs(5), async {
			while snapshots.borrow_and_update().account != expected {
				snapshots.changed().await.unwrap();
			}
		})
		.await
		.expect("state did not reach expected account");
	}

	#[tokio::test]
	async fn test_connect_initializes_log_with_stored_identity() {
		let fx = fixture();
		fx.registry.set(IDENTITY).await.unwrap();

		let (_active_tx, active) = watch::channel(ALICE);
		let (events, _) = broadcast::channel(8);
		let account = fx
			.session
			.connect(Arc::new(wallet(active, &events)))
			.await
			.unwrap();

		assert_eq!(account, ALICE);
		assert!(fx.session.is_connected().await);

		let snapshot = fx.session.state().snapshot();
		let kinds: Vec<_> = snapshot.log.entries().iter().map(|e| e.kind.clone()).collect();
		assert_eq!(kinds, vec![InfoKind::IdentityAdded, InfoKind::Account]);
		assert_eq!(snapshot.log.entries()[0].content, IDENTITY);
		assert_eq!(snapshot.log.entries()[1].content, ALICE.to_string());
	}

	#[tokio::test]
	async fn test_connect_without_identity_logs_only_account() {
		let fx = fixture();
		let (_active_tx, active) = watch::channel(ALICE);
		let (events, _) = broadcast::channel(8);
		fx.session
			.connect(Arc::new(wallet(active, &events)))
			.await
			.unwrap();

		let snapshot = fx.session.state().snapshot();
		assert_eq!(snapshot.log.entries(), &[InfoEntry::account(ALICE.to_string())]);
	}

	#[tokio::test]
	async fn test_wallet_without_accounts() {
		let fx = fixture();
		let mut wallet = MockWalletInterface::new();
		let (events, _) = broadcast::channel::<ProviderEvent>(8);
		let receiver = events.subscribe();
		wallet.expect_subscribe().return_once(move || receiver);
		wallet
			.expect_accounts()
			.returning(|| Box::pin(async { Ok(vec![]) }));

		let result = fx.session.connect(Arc::new(wallet)).await;
		assert!(matches!(result, Err(CoreError::NoProvider(_))));
		assert!(!fx.session.is_connected().await);
	}

	#[tokio::test]
	async fn test_accounts_changed_reinitializes() {
		let fx = fixture();
		let (active_tx, active) = watch::channel(ALICE);
		let (events, _) = broadcast::channel(8);
		fx.session
			.connect(Arc::new(wallet(active, &events)))
			.await
			.unwrap();

		active_tx.send(BOB).unwrap();
		events.send(ProviderEvent::AccountsChanged(vec![BOB])).unwrap();

		wait_for_account(&fx.session, Some(BOB)).await;
		assert_eq!(fx.session.account().await, Some(BOB));
		assert_eq!(
			fx.session.state().snapshot().log.entries(),
			&[
				InfoEntry::account(ALICE.to_string()),
				InfoEntry::account(BOB.to_string())
			]
		);
	}

	#[tokio::test]
	async fn test_deployed_identity_survives_account_switch_and_reconnect() {
		let fx = fixture();
		fx.registry.set(IDENTITY).await.unwrap();
		let (active_tx, active) = watch::channel(ALICE);
		let (events, _) = broadcast::channel(8);
		fx.session
			.connect(Arc::new(wallet(active.clone(), &events)))
			.await
			.unwrap();
		fx.session
			.state()
			.append(InfoEntry::identity_deployed(DEPLOYED))
			.await
			.unwrap();

		active_tx.send(BOB).unwrap();
		events.send(ProviderEvent::AccountsChanged(vec![BOB])).unwrap();
		wait_for_account(&fx.session, Some(BOB)).await;

		fx.session.disconnect().await.unwrap();
		let (events, _) = broadcast::channel(8);
		fx.session
			.connect(Arc::new(wallet(active, &events)))
			.await
			.unwrap();

		let log = fx.session.state().snapshot().log;
		assert_eq!(
			log.entries(),
			&[
				InfoEntry::identity_added(IDENTITY),
				InfoEntry::account(ALICE.to_string()),
				InfoEntry::identity_deployed(DEPLOYED),
				InfoEntry::account(BOB.to_string()),
			]
		);
		assert_eq!(log.identity_contracts(), vec![IDENTITY, DEPLOYED]);
	}

	#[tokio::test]
	async fn test_unexpected_chain_warns() {
		let fx = fixture();
		let mut notices = fx.event_bus.subscribe();
		let (_active_tx, active) = watch::channel(ALICE);
		let (events, _) = broadcast::channel(8);
		fx.session
			.connect(Arc::new(wallet(active, &events)))
			.await
			.unwrap();

		events.send(ProviderEvent::ChainChanged(1)).unwrap();

		let notice = tokio::time::timeout(Duration::from_secs(5), notices.recv())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(notice.level, NoticeLevel::Warning);
		assert_eq!(notice.message, "Please use Mumbai network");
	}

	#[tokio::test]
	async fn test_disconnected_event_tears_down() {
		let fx = fixture();
		let (_active_tx, active) = watch::channel(ALICE);
		let (events, _) = broadcast::channel(8);
		fx.session
			.connect(Arc::new(wallet(active, &events)))
			.await
			.unwrap();

		events.send(ProviderEvent::Disconnected).unwrap();

		wait_for_account(&fx.session, None).await;
		assert!(!fx.session.is_connected().await);
		assert_eq!(
			fx.session.state().snapshot().log.entries(),
			&[InfoEntry::account(ALICE.to_string())]
		);
	}

	#[tokio::test]
	async fn test_disconnect_without_connection() {
		let fx = fixture();
		fx.session.disconnect().await.unwrap();
		assert!(matches!(
			fx.session.wallet().await,
			Err(CoreError::NoProvider(_))
		));
	}
}
