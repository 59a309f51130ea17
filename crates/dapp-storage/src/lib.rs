//! Storage module for the identity dApp client.
//!
//! This module provides a small key-value abstraction used to persist the
//! user's identity contract address and the cached wallet connector between
//! runs. Two backends are bundled: a file backend for real use and an
//! in-memory backend for tests and throwaway sessions.

use async_trait::async_trait;
use dapp_config::{StorageBackend, StorageConfig};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found: {0}")]
	NotFound(String),
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Namespaces of the values the client persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// The identity contract address chosen by the user.
	Identity,
	/// The wallet connector remembered for the next run.
	Connector,
}

impl StorageKey {
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Identity => "identity",
			StorageKey::Connector => "connector",
		}
	}
}

impl fmt::Display for StorageKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Trait defining the low-level interface for storage backends.
#[async_trait]
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, replacing any previous value.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key.
	///
	/// Deleting a missing key is not an error.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// Creates the backend selected by the storage configuration.
pub fn create_storage_backend(config: &StorageConfig) -> Arc<dyn StorageInterface> {
	match config.backend {
		StorageBackend::File => {
			tracing::debug!(path = %config.path, "Using file storage");
			Arc::new(implementations::file::FileStorage::new(PathBuf::from(
				&config.path,
			)))
		},
		StorageBackend::Memory => {
			tracing::debug!("Using in-memory storage");
			Arc::new(implementations::memory::MemoryStorage::new())
		},
	}
}

/// High-level storage service that provides typed operations.
///
/// The StorageService wraps a low-level storage backend and provides
/// methods for storing and retrieving typed data with JSON serialization.
#[derive(Clone)]
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Arc<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Arc<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	/// `namespace:id`, or the bare namespace when `id` is empty.
	fn key(namespace: StorageKey, id: &str) -> String {
		if id.is_empty() {
			namespace.to_string()
		} else {
			format!("{}:{}", namespace, id)
		}
	}

	/// Stores a serializable value.
	///
	/// The namespace and id are combined to form a unique key.
	pub async fn store<T: Serialize>(
		&self,
		namespace: StorageKey,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&Self::key(namespace, id), bytes).await
	}

	/// Retrieves and deserializes a value from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: StorageKey,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Retrieves a value, mapping `NotFound` to `None`.
	pub async fn retrieve_optional<T: DeserializeOwned>(
		&self,
		namespace: StorageKey,
		id: &str,
	) -> Result<Option<T>, StorageError> {
		match self.retrieve(namespace, id).await {
			Ok(value) => Ok(Some(value)),
			Err(StorageError::NotFound(_)) => Ok(None),
			Err(e) => Err(e),
		}
	}

	/// Removes a value from storage.
	pub async fn remove(&self, namespace: StorageKey, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}

	/// Checks whether a value is stored.
	pub async fn exists(&self, namespace: StorageKey, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::memory::MemoryStorage;
	use serde::Deserialize;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Choice {
		connector: String,
	}

	fn service() -> StorageService {
		StorageService::new(Arc::new(MemoryStorage::new()))
	}

	#[tokio::test]
	async fn test_store_and_retrieve() {
		let storage = service();
		let choice = Choice {
			connector: "local".into(),
		};

		storage
			.store(StorageKey::Connector, "cached", &choice)
			.await
			.unwrap();
		let loaded: Choice = storage
			.retrieve(StorageKey::Connector, "cached")
			.await
			.unwrap();
		assert_eq!(loaded, choice);
		assert!(storage.exists(StorageKey::Connector, "cached").await.unwrap());
	}

	#[tokio::test]
	async fn test_namespaces_do_not_collide() {
		let storage = service();
		storage
			.store(StorageKey::Identity, "current", &"0xabc")
			.await
			.unwrap();

		let other: Option<String> = storage
			.retrieve_optional(StorageKey::Connector, "current")
			.await
			.unwrap();
		assert_eq!(other, None);
	}

	#[tokio::test]
	async fn test_retrieve_missing_and_remove() {
		let storage = service();
		let missing = storage
			.retrieve::<String>(StorageKey::Identity, "current")
			.await;
		assert!(matches!(missing, Err(StorageError::NotFound(_))));

		storage
			.store(StorageKey::Identity, "current", &"0xabc")
			.await
			.unwrap();
		storage.remove(StorageKey::Identity, "current").await.unwrap();
		assert!(!storage.exists(StorageKey::Identity, "current").await.unwrap());
	}

	#[tokio::test]
	async fn test_retrieve_wrong_type_is_serialization_error() {
		let storage = service();
		storage
			.store(StorageKey::Identity, "current", &42u32)
			.await
			.unwrap();
		let result = storage
			.retrieve::<Choice>(StorageKey::Identity, "current")
			.await;
		assert!(matches!(result, Err(StorageError::Serialization(_))));
	}

	#[tokio::test]
	async fn test_empty_id_uses_bare_namespace_key() {
		let backend = Arc::new(MemoryStorage::new());
		let storage = StorageService::new(backend.clone());

		storage
			.store(StorageKey::Identity, "", &"0xabc")
			.await
			.unwrap();

		assert_eq!(backend.get_bytes("identity").await.unwrap(), b"\"0xabc\"".to_vec());
		assert!(!backend.exists("identity:").await.unwrap());
	}

	#[test]
	fn test_create_backend_from_config() {
		let config = StorageConfig {
			backend: StorageBackend::Memory,
			path: String::new(),
		};
		let _backend = create_storage_backend(&config);
	}
}
