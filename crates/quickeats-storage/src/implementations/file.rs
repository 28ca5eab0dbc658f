//! File-based storage backend implementation for the order service.
//!
//! This module stores one file per key under a base directory, writing via a
//! temp file followed by a rename. The conditional primitives are serialized
//! by an internal async mutex, so concurrent compare-and-swap or
//! put-if-absent calls on the same instance observe a consistent read-check-
//! write sequence.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use quickeats_types::{ConfigSchema, Field, FieldType, Schema, ValidationError};
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

/// File-based storage implementation.
///
/// This implementation stores data as binary files on the filesystem,
/// providing simple persistence without requiring external dependencies.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
	/// Serializes conditional writes; plain reads bypass it.
	write_lock: Mutex<()>,
}

impl FileStorage {
	/// Creates a new FileStorage instance with the specified base path.
	pub fn new(base_path: PathBuf) -> Self {
		Self {
			base_path,
			write_lock: Mutex::new(()),
		}
	}

	/// Converts a storage key to a filesystem-safe file path.
	///
	/// Sanitizes the key by replacing problematic characters and
	/// appending a .bin extension.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', ':'], "_");
		self.base_path.join(format!("{}.bin", safe_key))
	}

	/// Reads the current bytes for a key, mapping a missing file to None.
	async fn read_current(&self, path: &PathBuf) -> Result<Option<Vec<u8>>, StorageError> {
		match fs::read(path).await {
			Ok(data) => Ok(Some(data)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	/// Writes bytes atomically via a temp file and rename.
	async fn write_atomic(&self, path: &PathBuf, value: Vec<u8>) -> Result<(), StorageError> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);
		self.read_current(&path).await?.ok_or(StorageError::NotFound)
	}

	async fn put_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);
		let _guard = self.write_lock.lock().await;
		self.write_atomic(&path, value).await
	}

	async fn compare_and_swap(
		&self,
		key: &str,
		expected: Option<&[u8]>,
		value: Vec<u8>,
	) -> Result<(), StorageError> {
		let path = self.get_file_path(key);
		let _guard = self.write_lock.lock().await;

		let current = self.read_current(&path).await?;
		if current.as_deref() != expected {
			return Err(StorageError::Conflict);
		}
		self.write_atomic(&path, value).await
	}

	async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);
		let _guard = self.write_lock.lock().await;

		if self.read_current(&path).await?.is_some() {
			return Err(StorageError::AlreadyExists);
		}
		self.write_atomic(&path, value).await
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.get_file_path(key);
		let _guard = self.write_lock.lock().await;

		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let path = self.get_file_path(key);
		Ok(path.exists())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![], // No required fields
			vec![Field::new("storage_path", FieldType::String)],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage")
		.to_string();

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn storage() -> (tempfile::TempDir, FileStorage) {
		let dir = tempfile::tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());
		(dir, storage)
	}

	#[tokio::test]
	async fn test_basic_operations() {
		let (_dir, storage) = storage();

		let key = "orders:abc";
		let value = b"payload".to_vec();
		storage.put_bytes(key, value.clone()).await.unwrap();

		assert_eq!(storage.get_bytes(key).await.unwrap(), value);
		assert!(storage.exists(key).await.unwrap());

		storage.delete(key).await.unwrap();
		assert!(!storage.exists(key).await.unwrap());
		assert!(matches!(
			storage.get_bytes(key).await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_compare_and_swap() {
		let (_dir, storage) = storage();
		let key = "orders:cas";

		storage
			.compare_and_swap(key, None, b"v1".to_vec())
			.await
			.unwrap();

		storage
			.compare_and_swap(key, Some(b"v1".as_slice()), b"v2".to_vec())
			.await
			.unwrap();

		let result = storage.compare_and_swap(key, Some(b"v1".as_slice()), b"v3".to_vec()).await;
		assert!(matches!(result, Err(StorageError::Conflict)));
		assert_eq!(storage.get_bytes(key).await.unwrap(), b"v2".to_vec());
	}

	#[tokio::test]
	async fn test_put_if_absent() {
		let (_dir, storage) = storage();
		let key = "idempotency:k1";

		storage.put_if_absent(key, b"first".to_vec()).await.unwrap();
		let result = storage.put_if_absent(key, b"second".to_vec()).await;
		assert!(matches!(result, Err(StorageError::AlreadyExists)));
		assert_eq!(storage.get_bytes(key).await.unwrap(), b"first".to_vec());
	}

	#[tokio::test]
	async fn test_key_sanitization() {
		let (dir, storage) = storage();

		storage
			.put_bytes("orders:with/slash", b"x".to_vec())
			.await
			.unwrap();

		// No nested directories are created for key separators
		let mut entries = std::fs::read_dir(dir.path()).unwrap();
		let entry = entries.next().unwrap().unwrap();
		assert!(entry.file_type().unwrap().is_file());
	}
}
