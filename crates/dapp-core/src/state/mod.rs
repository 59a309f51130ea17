//! Single-writer session state.
//!
//! The information log, the chosen identity contract and the current account
//! are owned by one writer task. Every mutation is a command on an mpsc
//! channel, applied in arrival order; readers see consistent snapshots
//! through a `watch` channel. Handlers finishing concurrently therefore
//! always leave the log in the order their commands arrived.

use crate::CoreError;
use alloy_primitives::Address;
use dapp_types::{InfoEntry, InformationLog};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

const COMMAND_BUFFER: usize = 64;

/// Read-only view of the session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSnapshot {
	pub log: InformationLog,
	/// Identity contract the user chose; empty when unset.
	pub identity: String,
	pub account: Option<Address>,
}

impl StateSnapshot {
	fn account_string(&self) -> Option<String> {
		self.account.map(|account| account.to_string())
	}
}

enum StateCommand {
	Append(InfoEntry),
	SwitchAccount {
		account: Option<Address>,
		entries: Vec<InfoEntry>,
	},
	SetIdentity(String),
}

/// Cloneable handle to the state writer.
///
/// The writer task stops once every handle is dropped.
#[derive(Clone)]
pub struct StateHandle {
	commands: mpsc::Sender<(StateCommand, oneshot::Sender<()>)>,
	snapshot: watch::Receiver<StateSnapshot>,
}

impl StateHandle {
	/// Spawns the writer task with `identity` as the stored identity contract.
	pub fn spawn(identity: String) -> (Self, JoinHandle<()>) {
		let initial = StateSnapshot {
			identity,
			..Default::default()
		};
		let (snapshot_tx, snapshot_rx) = watch::channel(initial.clone());
		let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);

		let writer = tokio::spawn(run_writer(initial, commands_rx, snapshot_tx));

		(
			Self {
				commands: commands_tx,
				snapshot: snapshot_rx,
			},
			writer,
		)
	}

	/// Appends an entry, reconciling against the current account.
	pub async fn append(&self, entry: InfoEntry) -> Result<(), CoreError> {
		self.send(StateCommand::Append(entry)).await
	}

	/// Sets the current account, then appends `entries` against it.
	///
	/// Identity contract entries already in the log are not repeated.
	pub async fn switch_account(
		&self,
		account: Option<Address>,
		entries: Vec<InfoEntry>,
	) -> Result<(), CoreError> {
		self.send(StateCommand::SwitchAccount { account, entries }).await
	}

	pub async fn set_identity(&self, identity: String) -> Result<(), CoreError> {
		self.send(StateCommand::SetIdentity(identity)).await
	}

	/// The latest state.
	pub fn snapshot(&self) -> StateSnapshot {
		self.snapshot.borrow().clone()
	}

	/// A receiver notified after every applied command.
	pub fn watch(&self) -> watch::Receiver<StateSnapshot> {
		self.snapshot.clone()
	}

	/// Sends a command and waits until the writer applied it.
	async fn send(&self, command: StateCommand) -> Result<(), CoreError> {
		let (ack_tx, ack_rx) = oneshot::channel();
		self.commands
			.send((command, ack_tx))
			.await
			.map_err(|_| CoreError::Storage("State writer stopped".to_string()))?;
		ack_rx
			.await
			.map_err(|_| CoreError::Storage("State writer dropped command".to_string()))
	}
}

async fn run_writer(
	mut state: StateSnapshot,
	mut commands: mpsc::Receiver<(StateCommand, oneshot::Sender<()>)>,
	snapshot: watch::Sender<StateSnapshot>,
) {
	while let Some((command, ack)) = commands.recv().await {
		match command {
			StateCommand::Append(entry) => {
				let account = state.account_string();
				state.log.append(entry, account.as_deref());
			},
			StateCommand::SwitchAccount { account, entries } => {
				state.account = account;
				let account = state.account_string();
				for entry in entries {
					if entry.kind.is_identity_contract() && state.log.contains(&entry) {
						continue;
					}
					state.log.append(entry, account.as_deref());
				}
			},
			StateCommand::SetIdentity(identity) => {
				state.identity = identity;
			},
		}

		tracing::trace!(entries = state.log.len(), "State updated");
		snapshot.send_replace(state.clone());
		let _ = ack.send(());
	}

	tracing::debug!("State writer stopped");
}
