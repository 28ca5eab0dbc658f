//! Order entity and lifecycle types.
//!
//! An order moves through a fixed set of states via named actions. The
//! `version` counter is the basis of optimistic concurrency control: it is
//! bumped exactly once per committed transition and never regresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of an order.
///
/// `Delivered`, `Cancelled` and `Rejected` are terminal: no action is legal
/// from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
	/// Initial state, waiting for the customer to pay.
	PendingPayment,
	/// Paid, waiting for the merchant to accept or reject.
	PendingAcceptance,
	/// Accepted by the merchant, food is being prepared.
	Preparing,
	/// Preparation finished, waiting for a rider.
	ReadyForPickup,
	/// Picked up by a rider.
	InTransit,
	/// Delivered to the customer (terminal).
	Delivered,
	/// Cancelled by the customer (terminal).
	Cancelled,
	/// Rejected by the merchant (terminal).
	Rejected,
}

impl OrderStatus {
	/// Returns the wire representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::PendingPayment => "pending_payment",
			OrderStatus::PendingAcceptance => "pending_acceptance",
			OrderStatus::Preparing => "preparing",
			OrderStatus::ReadyForPickup => "ready_for_pickup",
			OrderStatus::InTransit => "in_transit",
			OrderStatus::Delivered => "delivered",
			OrderStatus::Cancelled => "cancelled",
			OrderStatus::Rejected => "rejected",
		}
	}

	/// Returns true if no transition is defined out of this state.
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Rejected
		)
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Actions a caller may request against an order.
///
/// Each action maps to exactly one target state; the allowed source states
/// are defined by the state machine in the core crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
	Pay,
	Cancel,
	Accept,
	Reject,
	CompletePreparation,
	Pickup,
	Deliver,
}

impl OrderAction {
	/// Returns the wire representation of the action.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderAction::Pay => "pay",
			OrderAction::Cancel => "cancel",
			OrderAction::Accept => "accept",
			OrderAction::Reject => "reject",
			OrderAction::CompletePreparation => "complete_preparation",
			OrderAction::Pickup => "pickup",
			OrderAction::Deliver => "deliver",
		}
	}

	/// Returns an iterator over all action variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Pay,
			Self::Cancel,
			Self::Accept,
			Self::Reject,
			Self::CompletePreparation,
			Self::Pickup,
			Self::Deliver,
		]
		.into_iter()
	}
}

impl fmt::Display for OrderAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The order entity under contention.
///
/// Domain attributes (restaurant, rider) are opaque payload to the
/// concurrency logic; they are carried but never interpreted by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Stable identifier, assigned at creation, immutable.
	pub id: String,
	/// Current lifecycle state.
	pub status: OrderStatus,
	/// Monotonically increasing version counter, starts at 1.
	pub version: u64,
	/// Restaurant the order was placed with.
	pub restaurant_name: String,
	/// Rider assigned to the order, if any.
	pub rider_name: Option<String>,
	/// Creation timestamp.
	pub created_at: DateTime<Utc>,
}
