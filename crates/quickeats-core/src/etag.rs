//! Concurrency token (ETag) codec.
//!
//! Derives an opaque token from an order's identity and version counter.
//! The token is a pure function of `(id, version)`: deterministic, and
//! distinct whenever the version changes. It is compared for equality only
//! and carries no authentication value.

use sha3::{Digest, Keccak256};

/// Computes the concurrency token for an order at a given version.
pub fn compute(id: &str, version: u64) -> String {
	let mut hasher = Keccak256::new();
	hasher.update(format!("order-{}-v{}", id, version).as_bytes());
	hex::encode(hasher.finalize())
}

/// Checks a client-presented token against the current `(id, version)`.
///
/// Accepts the token quoted (as sent in an `If-Match` header) or bare.
pub fn matches(presented: &str, id: &str, version: u64) -> bool {
	presented.trim().trim_matches('"') == compute(id, version)
}
