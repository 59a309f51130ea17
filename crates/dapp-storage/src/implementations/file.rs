//! File-based storage backend implementation.
//!
//! Each key is stored in its own file under the base directory. Writes go to
//! a temporary file that is renamed into place while an exclusive `fs2` lock
//! is held, so a crash never leaves a half-written value behind and two
//! processes sharing the directory do not interleave writes.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use fs2::FileExt;
use std::path::{Path, PathBuf};
use tokio::fs;

/// File-based storage implementation.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
}

impl FileStorage {
	/// Creates a new FileStorage instance rooted at `base_path`.
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Converts a storage key to a filesystem-safe file path.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', '\\', ':'], "_");
		self.base_path.join(format!("{safe_key}.json"))
	}

	/// Executes an operation while holding an exclusive lock next to `path`.
	async fn with_lock<F, Fut, R>(path: &Path, operation: F) -> Result<R, StorageError>
	where
		F: FnOnce() -> Fut,
		Fut: std::future::Future<Output = Result<R, StorageError>>,
	{
		let lock_path = path.with_extension("lock");

		if let Some(parent) = lock_path.parent() {
			fs::create_dir_all(parent).await.map_err(|e| {
				StorageError::Backend(format!("Failed to create storage directory: {e}"))
			})?;
		}

		let lock_file = tokio::task::spawn_blocking(move || {
			let lock_file = std::fs::OpenOptions::new()
				.create(true)
				.truncate(true)
				.write(true)
				.open(&lock_path)
				.map_err(|e| StorageError::Backend(format!("Failed to open lock file: {e}")))?;

			FileExt::lock_exclusive(&lock_file)
				.map_err(|e| StorageError::Backend(format!("Failed to acquire lock: {e}")))?;

			Ok::<_, StorageError>(lock_file)
		})
		.await
		.map_err(|e| StorageError::Backend(format!("Failed to spawn blocking task: {e}")))??;

		let result = operation().await;
		drop(lock_file);
		result
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);

		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				Err(StorageError::NotFound(key.to_string()))
			},
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		Self::with_lock(&path, || async {
			let temp_path = path.with_extension("tmp");
			fs::write(&temp_path, value)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;

			fs::rename(&temp_path, &path)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))
		})
		.await?;

		tracing::trace!(key, path = %path.display(), "Stored value");
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		Self::with_lock(&path, || async {
			match fs::remove_file(&path).await {
				Ok(_) => Ok(()),
				Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
				Err(e) => Err(StorageError::Backend(e.to_string())),
			}
		})
		.await
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let path = self.get_file_path(key);
		fs::try_exists(&path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}
