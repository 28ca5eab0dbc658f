//! Core engine for the QuickEats order system.
//!
//! This crate holds the mechanics the service is built around: the order
//! state machine, the optimistic concurrency guard backed by the storage
//! layer's compare-and-swap primitive, the ETag codec that derives the
//! concurrency token, and the idempotency interceptor that deduplicates
//! retried requests.

use quickeats_types::{OrderAction, OrderStatus};
use thiserror::Error;

pub mod engine;
pub mod etag;
pub mod idempotency;
pub mod machine;

pub use engine::OrderEngine;
pub use idempotency::IdempotencyLayer;

/// Errors that can occur while executing an order operation.
#[derive(Debug, Error)]
pub enum OrderError {
	/// The order id does not resolve to a stored order.
	#[error("Order not found: {0}")]
	NotFound(String),
	/// A mutating call arrived without a concurrency token.
	#[error("A concurrency token (If-Match) is required for this operation")]
	PreconditionRequired,
	/// The presented concurrency token does not match the current version.
	/// Recoverable: the caller should re-read and retry with a fresh token.
	#[error("Stale concurrency token; the order is now at version {current_version}")]
	PreconditionFailed { current_version: u64 },
	/// The requested action is not legal from the current status.
	#[error("Action '{action}' is not allowed while the order is '{status}'")]
	InvalidTransition {
		status: OrderStatus,
		action: OrderAction,
	},
	/// The client-supplied idempotency key is not a valid UUID.
	#[error("Invalid idempotency key '{0}': must be a UUID")]
	InvalidIdempotencyKey(String),
	/// A storage-level failure that is not a concurrency conflict.
	#[error("Storage error: {0}")]
	Storage(String),
}
