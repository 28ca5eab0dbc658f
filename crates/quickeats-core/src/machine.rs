//! Order state machine.
//!
//! Defines which actions are legal from which states and where each action
//! leads. The mapping is a static, exhaustive match over the action enum, so
//! adding an action without declaring its sources and target does not
//! compile. Every `(status, action)` pair outside the table is illegal.

use quickeats_types::{OrderAction, OrderStatus};

/// Returns the states from which the given action may be taken.
pub fn allowed_sources(action: OrderAction) -> &'static [OrderStatus] {
	match action {
		OrderAction::Pay => &[OrderStatus::PendingPayment],
		OrderAction::Cancel => &[OrderStatus::PendingPayment, OrderStatus::PendingAcceptance],
		OrderAction::Accept => &[OrderStatus::PendingAcceptance],
		OrderAction::Reject => &[OrderStatus::PendingAcceptance],
		OrderAction::CompletePreparation => &[OrderStatus::Preparing],
		OrderAction::Pickup => &[OrderStatus::ReadyForPickup],
		OrderAction::Deliver => &[OrderStatus::InTransit],
	}
}

/// Returns the state the given action transitions into.
pub fn target(action: OrderAction) -> OrderStatus {
	match action {
		OrderAction::Pay => OrderStatus::PendingAcceptance,
		OrderAction::Cancel => OrderStatus::Cancelled,
		OrderAction::Accept => OrderStatus::Preparing,
		OrderAction::Reject => OrderStatus::Rejected,
		OrderAction::CompletePreparation => OrderStatus::ReadyForPickup,
		OrderAction::Pickup => OrderStatus::InTransit,
		OrderAction::Deliver => OrderStatus::Delivered,
	}
}

/// Resolves the target state for an action taken from `current`.
///
/// Returns `None` when the pair is not in the transition table.
pub fn target_for(action: OrderAction, current: OrderStatus) -> Option<OrderStatus> {
	allowed_sources(action)
		.contains(&current)
		.then(|| target(action))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn happy_path_chain() {
		assert_eq!(
			target_for(OrderAction::Pay, OrderStatus::PendingPayment),
			Some(OrderStatus::PendingAcceptance)
		);
		assert_eq!(
			target_for(OrderAction::Accept, OrderStatus::PendingAcceptance),
			Some(OrderStatus::Preparing)
		);
		assert_eq!(
			target_for(OrderAction::CompletePreparation, OrderStatus::Preparing),
			Some(OrderStatus::ReadyForPickup)
		);
		assert_eq!(
			target_for(OrderAction::Pickup, OrderStatus::ReadyForPickup),
			Some(OrderStatus::InTransit)
		);
		assert_eq!(
			target_for(OrderAction::Deliver, OrderStatus::InTransit),
			Some(OrderStatus::Delivered)
		);
	}

	#[test]
	fn side_branches() {
		assert_eq!(
			target_for(OrderAction::Cancel, OrderStatus::PendingPayment),
			Some(OrderStatus::Cancelled)
		);
		assert_eq!(
			target_for(OrderAction::Cancel, OrderStatus::PendingAcceptance),
			Some(OrderStatus::Cancelled)
		);
		assert_eq!(
			target_for(OrderAction::Reject, OrderStatus::PendingAcceptance),
			Some(OrderStatus::Rejected)
		);
	}

	#[test]
	fn terminal_states_reject_every_action() {
		let terminals = [
			OrderStatus::Delivered,
			OrderStatus::Cancelled,
			OrderStatus::Rejected,
		];
		for status in terminals {
			for action in OrderAction::all() {
				assert_eq!(target_for(action, status), None, "{action} from {status}");
			}
		}
	}

	#[test]
	fn table_matches_allowed_sources() {
		// Every (status, action) pair is legal exactly when the status is
		// in the action's allowed-source set.
		let statuses = [
			OrderStatus::PendingPayment,
			OrderStatus::PendingAcceptance,
			OrderStatus::Preparing,
			OrderStatus::ReadyForPickup,
			OrderStatus::InTransit,
			OrderStatus::Delivered,
			OrderStatus::Cancelled,
			OrderStatus::Rejected,
		];
		for status in statuses {
			for action in OrderAction::all() {
				let legal = allowed_sources(action).contains(&status);
				assert_eq!(target_for(action, status).is_some(), legal);
			}
		}
	}

	#[test]
	fn cancel_is_illegal_once_preparing() {
		assert_eq!(target_for(OrderAction::Cancel, OrderStatus::Preparing), None);
		assert_eq!(
			target_for(OrderAction::Cancel, OrderStatus::InTransit),
			None
		);
	}
}
