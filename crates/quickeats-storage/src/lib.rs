//! Storage module for the QuickEats order system.
//!
//! This module provides abstractions for persistent storage of order data,
//! supporting different backend implementations such as in-memory or
//! file-based storage. Beyond plain key-value operations, every backend must
//! provide two atomic primitives the rest of the system is built on: a
//! compare-and-swap write (the serialization point for optimistic
//! concurrency control) and a put-if-absent write (the uniqueness constraint
//! behind the idempotency ledger).

use async_trait::async_trait;
use quickeats_types::ConfigSchema;
use serde::{de::DeserializeOwned, Serialize};
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
	#[error("Not found")]
	NotFound,
	/// Error that occurs when a conditional write loses against a
	/// concurrent writer: the stored value no longer matches the
	/// caller's expected snapshot.
	#[error("Conditional write conflict")]
	Conflict,
	/// Error that occurs when a put-if-absent write finds the key
	/// already present.
	#[error("Key already exists")]
	AlreadyExists,
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the low-level interface for storage backends.
///
/// This trait must be implemented by any storage backend that wants to
/// integrate with the order system. `compare_and_swap` and `put_if_absent`
/// must be atomic with respect to concurrent calls on the same backend
/// instance; everything else in the system assumes that guarantee instead
/// of holding its own locks.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes unconditionally, creating or overwriting.
	async fn put_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Atomically replaces the value for `key` only if the stored bytes
	/// still equal `expected`.
	///
	/// `expected = None` asserts the key must not exist yet. On mismatch
	/// the write is discarded and `StorageError::Conflict` is returned;
	/// exactly one of any number of concurrent callers holding the same
	/// expected snapshot can commit.
	async fn compare_and_swap(
		&self,
		key: &str,
		expected: Option<&[u8]>,
		value: Vec<u8>,
	) -> Result<(), StorageError>;

	/// Atomically stores a value only if the key is absent.
	///
	/// Returns `StorageError::AlreadyExists` when the key is present;
	/// concurrent first writers race and exactly one wins.
	async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
///
/// This is the function signature that all storage implementations must
/// provide to create instances of their storage interface.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage
/// implementations, used by the service to wire up the configured backend.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		("file", file::create_storage as StorageFactory),
		("memory", memory::create_storage as StorageFactory),
	]
}

/// High-level storage service that provides typed operations.
///
/// The StorageService wraps a low-level storage backend and provides
/// convenient methods for storing and retrieving typed data with
/// automatic JSON serialization/deserialization. Keys are namespaced as
/// `namespace:id`.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: &str, id: &str) -> String {
		format!("{}:{}", namespace, id)
	}

	fn to_bytes<T: Serialize>(data: &T) -> Result<Vec<u8>, StorageError> {
		serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Stores a serializable value only if the key is absent.
	///
	/// Returns `StorageError::AlreadyExists` when a value is already
	/// stored under the key; exactly one concurrent caller wins.
	pub async fn create<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		self.backend
			.put_if_absent(&Self::key(namespace, id), Self::to_bytes(data)?)
			.await
	}

	/// Retrieves and deserializes a value from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Atomically replaces a stored value only if it still equals the
	/// caller's expected snapshot.
	///
	/// Both values are serialized to JSON; the comparison is on the
	/// serialized form, so the expected snapshot must be exactly the value
	/// previously read. A lost race surfaces as `StorageError::Conflict`.
	pub async fn compare_and_swap<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		expected: &T,
		data: &T,
	) -> Result<(), StorageError> {
		let expected_bytes = Self::to_bytes(expected)?;
		self.backend
			.compare_and_swap(
				&Self::key(namespace, id),
				Some(&expected_bytes),
				Self::to_bytes(data)?,
			)
			.await
	}

}
