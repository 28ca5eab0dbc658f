//! Common types module for the QuickEats order system.
//!
//! This module defines the core data types and structures shared across the
//! order service: the order entity and its lifecycle states, idempotency
//! records, API request/response types, and configuration validation.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Idempotency ledger record types.
pub mod idempotency;
/// Order entity, lifecycle states, and actions.
pub mod order;
/// Storage namespace types for persistent data.
pub mod storage;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use idempotency::*;
pub use order::*;
pub use storage::*;
pub use validation::*;
