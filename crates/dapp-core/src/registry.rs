//! Persisted identity contract choice.
//!
//! The user's identity contract is a single string stored under the
//! `identity` key. An empty string means nothing is chosen. Writes go to
//! storage first and then to the session state, so a failed write leaves
//! both untouched. Writes are serialized so storage and state always agree
//! on the last value.

use crate::state::StateHandle;
use crate::CoreError;
use dapp_storage::{StorageKey, StorageService};
use dapp_types::parse_address;
use std::sync::Arc;
use tokio::sync::Mutex;

// Stored under the bare `identity` key.
const IDENTITY_ID: &str = "";

/// Reads and writes the chosen identity contract address.
#[derive(Clone)]
pub struct IdentityRegistry {
	storage: StorageService,
	state: Option<StateHandle>,
	write_lock: Arc<Mutex<()>>,
}

impl IdentityRegistry {
	pub fn new(storage: StorageService) -> Self {
		Self {
			storage,
			state: None,
			write_lock: Arc::new(Mutex::new(())),
		}
	}

	/// Mirrors every write into the session state.
	pub fn with_state(mut self, state: StateHandle) -> Self {
		self.state = Some(state);
		self
	}

	/// The stored address, or `""` when unset.
	pub async fn get(&self) -> Result<String, CoreError> {
		Ok(self
			.storage
			.retrieve_optional::<String>(StorageKey::Identity, IDENTITY_ID)
			.await?
			.unwrap_or_default())
	}

	/// Validates and persists `address`, returning its checksummed form.
	///
	/// # Errors
	/// Returns `InvalidAddress` for a malformed address; the stored value is
	/// left as it was.
	pub async fn set(&self, address: &str) -> Result<String, CoreError> {
		let parsed = parse_address(address.trim()).map_err(CoreError::InvalidAddress)?;
		let normalized = parsed.to_string();

		self.write(normalized.clone()).await?;
		tracing::info!(identity = %normalized, "Identity contract stored");
		Ok(normalized)
	}

	/// Persists `""`.
	pub async fn clear(&self) -> Result<(), CoreError> {
		self.write(String::new()).await?;
		tracing::info!("Identity contract cleared");
		Ok(())
	}

	async fn write(&self, value: String) -> Result<(), CoreError> {
		let _guard = self.write_lock.lock().await;
		self.storage
			.store(StorageKey::Identity, IDENTITY_ID, &value)
			.await?;
		if let Some(state) = &self.state {
			state.set_identity(value).await?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use dapp_storage::implementations::memory::MemoryStorage;
	use dapp_storage::{MockStorageInterface, StorageError, StorageInterface};

	const IDENTITY: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

	fn registry() -> IdentityRegistry {
		IdentityRegistry::new(StorageService::new(Arc::new(MemoryStorage::new())))
	}

	#[tokio::test]
	async fn test_get_defaults_to_empty() {
		assert_eq!(registry().get().await.unwrap(), "");
	}

	#[tokio::test]
	async fn test_set_normalizes_and_persists() {
		let registry = registry();
		let stored = registry.set(&IDENTITY.to_lowercase()).await.unwrap();
		assert_eq!(stored, IDENTITY);
		assert_eq!(registry.get().await.unwrap(), IDENTITY);
	}

	#[tokio::test]
	async fn test_invalid_address_keeps_prior_value() {
		let registry = registry();
		registry.set(IDENTITY).await.unwrap();

		let result = registry.set("not-an-address").await;
		assert!(matches!(result, Err(CoreError::InvalidAddress(_))));
		assert_eq!(registry.get().await.unwrap(), IDENTITY);
	}

	#[tokio::test]
	async fn test_clear() {
		let registry = registry();
		registry.set(IDENTITY).await.unwrap();
		registry.clear().await.unwrap();
		assert_eq!(registry.get().await.unwrap(), "");
	}

	#[tokio::test]
	async fn test_writes_mirror_into_state() {
		let (state, _writer) = StateHandle::spawn(String::new());
		let registry = registry().with_state(state.clone());

		registry.set(IDENTITY).await.unwrap();
		assert_eq!(state.snapshot().identity, IDENTITY);

		registry.clear().await.unwrap();
		assert_eq!(state.snapshot().identity, "");
	}

	#[tokio::test]
	async fn test_persists_under_identity_key() {
		let backend = Arc::new(MemoryStorage::new());
		let registry = IdentityRegistry::new(StorageService::new(backend.clone()));
		registry.set(IDENTITY).await.unwrap();

		let bytes = backend.get_bytes("identity").await.unwrap();
		assert_eq!(bytes, format!("\"{IDENTITY}\"").into_bytes());
	}

	#[tokio::test]
	async fn test_concurrent_writes_keep_storage_and_state_in_sync() {
		let (state, _writer) = StateHandle::spawn(String::new());
		let registry = registry().with_state(state.clone());

		for round in 0..20u8 {
			let first = format!("0x{}", hex_address(round, 0xaa));
			let second = format!("0x{}", hex_address(round, 0xbb));
			let a = registry.clone();
			let b = registry.clone();
			let (ra, rb) = tokio::join!(
				tokio::spawn(async move { a.set(&first).await }),
				tokio::spawn(async move { b.set(&second).await }),
			);
			ra.unwrap().unwrap();
			rb.unwrap().unwrap();

			assert_eq!(registry.get().await.unwrap(), state.snapshot().identity);
		}
	}

	fn hex_address(round: u8, fill: u8) -> String {
		let mut bytes = [fill; 20];
		bytes[19] = round;
		bytes.iter().map(|b| format!("{b:02x}")).collect()
	}

	#[tokio::test]
	async fn test_storage_failure_leaves_state_untouched() {
		let mut mock = MockStorageInterface::new();
		mock.expect_set_bytes()
			.returning(|_, _| Box::pin(async { Err(StorageError::Backend("read-only".into())) }));

		let (state, _writer) = StateHandle::spawn("0x1".to_string());
		let registry = IdentityRegistry::new(StorageService::new(Arc::new(mock)))
			.with_state(state.clone());

		let result = registry.set(IDENTITY).await;
		assert!(matches!(result, Err(CoreError::Storage(_))));
		assert_eq!(state.snapshot().identity, "0x1");
	}
}
