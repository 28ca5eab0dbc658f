//! Idempotency interceptor.
//!
//! Wraps a mutating operation at the outermost layer. When the caller
//! supplies an idempotency key, the first successful outcome for that key is
//! recorded in the ledger; any replay returns the stored outcome verbatim
//! without re-executing the operation. Two physically concurrent first
//! attempts race on a put-if-absent insert; exactly one wins and both
//! callers observe the winner's outcome.
//!
//! Non-success outcomes (failed guard, illegal transition) are not recorded,
//! so a failed attempt may be retried with the same key.

use crate::OrderError;
use chrono::Utc;
use quickeats_storage::{StorageError, StorageService};
use quickeats_types::{IdempotencyRecord, StorageKey};
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

/// An HTTP-shaped operation outcome: status code plus JSON body.
pub type Outcome = (u16, serde_json::Value);

/// Deduplicates retried operations keyed by a client-supplied UUID.
pub struct IdempotencyLayer {
	storage: Arc<StorageService>,
}

impl IdempotencyLayer {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Runs `op` under idempotency control.
	///
	/// With no key, the operation executes with no dedup guarantee. A
	/// malformed key fails before the operation runs. A known key replays
	/// the recorded outcome. Otherwise the operation executes and, if it
	/// produced a success-class status, its outcome is recorded.
	pub async fn execute<F, Fut>(&self, raw_key: Option<&str>, op: F) -> Result<Outcome, OrderError>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Outcome>,
	{
		let Some(raw) = raw_key else {
			return Ok(op().await);
		};

		let key = Uuid::parse_str(raw.trim())
			.map_err(|_| OrderError::InvalidIdempotencyKey(raw.to_string()))?;

		if let Some(record) = self.lookup(&key).await? {
			tracing::debug!(key = %key, "Replaying recorded idempotent outcome");
			return Ok((record.response_status, record.response_body));
		}

		let (status, body) = op().await;
		if !(200..300).contains(&status) {
			// A failure here can mean a concurrent attempt with the same
			// key won the underlying write race. If that attempt has
			// recorded its outcome by now, adopt it; otherwise surface
			// the failure, which stays retryable under the same key.
			if let Some(record) = self.lookup(&key).await? {
				tracing::debug!(key = %key, "Adopting concurrent winner's outcome after local failure");
				return Ok((record.response_status, record.response_body));
			}
			return Ok((status, body));
		}

		let record = IdempotencyRecord {
			key,
			response_status: status,
			response_body: body.clone(),
			created_at: Utc::now(),
		};

		match self
			.storage
			.create(StorageKey::Idempotency.as_str(), &key.to_string(), &record)
			.await
		{
			Ok(()) => Ok((status, body)),
			Err(StorageError::AlreadyExists) => {
				// A concurrent attempt with the same key recorded first;
				// its outcome wins.
				let winner = self
					.lookup(&key)
					.await?
					.ok_or_else(|| OrderError::Storage("ledger record vanished".to_string()))?;
				tracing::debug!(key = %key, "Lost idempotency insert race, adopting winner");
				Ok((winner.response_status, winner.response_body))
			},
			Err(e) => Err(OrderError::Storage(e.to_string())),
		}
	}

	async fn lookup(&self, key: &Uuid) -> Result<Option<IdempotencyRecord>, OrderError> {
		match self
			.storage
			.retrieve::<IdempotencyRecord>(StorageKey::Idempotency.as_str(), &key.to_string())
			.await
		{
			Ok(record) => Ok(Some(record)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(OrderError::Storage(e.to_string())),
		}
	}
}
