//! Idempotency ledger record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded outcome for one client-supplied idempotency key.
///
/// At most one record per key ever exists; the uniqueness constraint is
/// enforced by the storage layer's put-if-absent primitive. Records are
/// written once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
	/// Client-supplied key identifying one logical attempt.
	pub key: Uuid,
	/// HTTP status code of the first-seen outcome.
	pub response_status: u16,
	/// Response body of the first-seen outcome, returned verbatim on replay.
	pub response_body: serde_json::Value,
	/// When the record was written, for retention and audit.
	pub created_at: DateTime<Utc>,
}
