//! Order engine: optimistic-concurrency-controlled transitions.
//!
//! The engine composes the state machine with the storage layer's
//! compare-and-swap primitive. The ETag pre-check is a fast path that turns
//! most stale writers away before any write is attempted; the CAS commit
//! against the unmodified snapshot is the actual serialization point, so two
//! writers that both pass the pre-check still resolve to exactly one
//! committed transition.

use crate::{etag, machine, OrderError};
use chrono::Utc;
use quickeats_storage::{StorageError, StorageService};
use quickeats_types::{Order, OrderAction, OrderStatus, StorageKey};
use std::sync::Arc;
use uuid::Uuid;

/// Executes order operations against a storage backend.
///
/// Holds no locks of its own; all coordination happens through the
/// backend's conditional writes.
pub struct OrderEngine {
	storage: Arc<StorageService>,
}

impl OrderEngine {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Creates a new order in the initial state at version 1.
	pub async fn create_order(
		&self,
		restaurant_name: String,
		rider_name: Option<String>,
	) -> Result<Order, OrderError> {
		let order = Order {
			id: Uuid::new_v4().to_string(),
			status: OrderStatus::PendingPayment,
			version: 1,
			restaurant_name,
			rider_name,
			created_at: Utc::now(),
		};

		self.storage
			.create(StorageKey::Orders.as_str(), &order.id, &order)
			.await
			.map_err(|e| OrderError::Storage(e.to_string()))?;

		tracing::info!(order_id = %order.id, "Created order");
		Ok(order)
	}

	/// Loads an order by id. Never mutates the stored record.
	pub async fn get_order(&self, order_id: &str) -> Result<Order, OrderError> {
		self.storage
			.retrieve(StorageKey::Orders.as_str(), order_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => OrderError::NotFound(order_id.to_string()),
				other => OrderError::Storage(other.to_string()),
			})
	}

	/// Computes the current concurrency token for an order.
	pub fn token_for(&self, order: &Order) -> String {
		etag::compute(&order.id, order.version)
	}

	/// Applies one action to an order under optimistic locking.
	///
	/// Requires the caller to present the concurrency token it last read.
	/// On success the order's status moves to the action's target and the
	/// version is bumped by exactly one. On any failure nothing is written.
	pub async fn submit(
		&self,
		order_id: &str,
		action: OrderAction,
		if_match: Option<&str>,
	) -> Result<Order, OrderError> {
		let presented = if_match.ok_or(OrderError::PreconditionRequired)?;

		let snapshot = self.get_order(order_id).await?;

		// Fast-path staleness check; the CAS below remains authoritative.
		if !etag::matches(presented, &snapshot.id, snapshot.version) {
			return Err(OrderError::PreconditionFailed {
				current_version: snapshot.version,
			});
		}

		let target = machine::target_for(action, snapshot.status).ok_or(
			OrderError::InvalidTransition {
				status: snapshot.status,
				action,
			},
		)?;

		let mut updated = snapshot.clone();
		updated.status = target;
		updated.version += 1;

		match self
			.storage
			.compare_and_swap(StorageKey::Orders.as_str(), order_id, &snapshot, &updated)
			.await
		{
			Ok(()) => {
				tracing::info!(
					order_id = %order_id,
					action = %action,
					from = %snapshot.status,
					to = %target,
					version = updated.version,
					"Order transition committed"
				);
				Ok(updated)
			},
			Err(StorageError::Conflict) => {
				// Lost the commit race; report the authoritative version.
				let current = self.get_order(order_id).await?;
				tracing::debug!(
					order_id = %order_id,
					action = %action,
					current_version = current.version,
					"Order transition lost conditional write"
				);
				Err(OrderError::PreconditionFailed {
					current_version: current.version,
				})
			},
			Err(e) => Err(OrderError::Storage(e.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use quickeats_storage::implementations::memory::MemoryStorage;

	fn engine() -> OrderEngine {
		let storage = StorageService::new(Box::new(MemoryStorage::new()));
		OrderEngine::new(Arc::new(storage))
	}

	async fn paid_order(engine: &OrderEngine) -> Order {
		let order = engine
			.create_order("Golden Fried Chicken".to_string(), None)
			.await
			.unwrap();
		let token = engine.token_for(&order);
		engine
			.submit(&order.id, OrderAction::Pay, Some(&token))
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn version_counts_successful_transitions() {
		let engine = engine();
		let order = engine
			.create_order("Golden Fried Chicken".to_string(), Some("Minji".to_string()))
			.await
			.unwrap();
		assert_eq!(order.version, 1);
		assert_eq!(order.status, OrderStatus::PendingPayment);

		let chain = [
			OrderAction::Pay,
			OrderAction::Accept,
			OrderAction::CompletePreparation,
			OrderAction::Pickup,
			OrderAction::Deliver,
		];

		let mut current = order;
		for (i, action) in chain.iter().enumerate() {
			let token = engine.token_for(&current);
			current = engine
				.submit(&current.id, *action, Some(&token))
				.await
				.unwrap();
			assert_eq!(current.version, 2 + i as u64);
		}
		assert_eq!(current.status, OrderStatus::Delivered);
	}

	#[tokio::test]
	async fn file_backed_chain_commits_without_spurious_conflicts() {
		use quickeats_storage::implementations::file::FileStorage;

		let dir = tempfile::tempdir().unwrap();
		let storage = StorageService::new(Box::new(FileStorage::new(dir.path().to_path_buf())));
		let engine = OrderEngine::new(Arc::new(storage));

		let order = engine
			.create_order("Golden Fried Chicken".to_string(), None)
			.await
			.unwrap();

		// Every re-read snapshot must serialize back to the stored bytes,
		// so an uncontended writer always passes the conditional write.
		let chain = [
			OrderAction::Pay,
			OrderAction::Accept,
			OrderAction::CompletePreparation,
			OrderAction::Pickup,
			OrderAction::Deliver,
		];

		let mut current = order;
		for action in chain {
			let snapshot = engine.get_order(&current.id).await.unwrap();
			let token = engine.token_for(&snapshot);
			current = engine
				.submit(&snapshot.id, action, Some(&token))
				.await
				.unwrap();
		}
		assert_eq!(current.status, OrderStatus::Delivered);
		assert_eq!(current.version, 6);
	}

	#[tokio::test]
	async fn missing_token_is_rejected() {
		let engine = engine();
		let order = engine
			.create_order("Golden Fried Chicken".to_string(), None)
			.await
			.unwrap();

		let result = engine.submit(&order.id, OrderAction::Pay, None).await;
		assert!(matches!(result, Err(OrderError::PreconditionRequired)));

		// Nothing was written
		let stored = engine.get_order(&order.id).await.unwrap();
		assert_eq!(stored.version, 1);
	}

	#[tokio::test]
	async fn stale_token_is_rejected_after_any_mutation() {
		let engine = engine();
		let order = engine
			.create_order("Golden Fried Chicken".to_string(), None)
			.await
			.unwrap();
		let old_token = engine.token_for(&order);

		engine
			.submit(&order.id, OrderAction::Pay, Some(&old_token))
			.await
			.unwrap();

		let result = engine
			.submit(&order.id, OrderAction::Cancel, Some(&old_token))
			.await;
		assert!(matches!(
			result,
			Err(OrderError::PreconditionFailed { current_version: 2 })
		));
	}

	#[tokio::test]
	async fn illegal_transition_leaves_order_untouched() {
		let engine = engine();
		let order = engine
			.create_order("Golden Fried Chicken".to_string(), None)
			.await
			.unwrap();
		let token = engine.token_for(&order);

		// Deliver is not legal from PendingPayment
		let result = engine
			.submit(&order.id, OrderAction::Deliver, Some(&token))
			.await;
		assert!(matches!(
			result,
			Err(OrderError::InvalidTransition {
				status: OrderStatus::PendingPayment,
				action: OrderAction::Deliver,
			})
		));

		let stored = engine.get_order(&order.id).await.unwrap();
		assert_eq!(stored.status, OrderStatus::PendingPayment);
		assert_eq!(stored.version, 1);
	}

	#[tokio::test]
	async fn terminal_states_reject_actions() {
		let engine = engine();
		let order = engine
			.create_order("Golden Fried Chicken".to_string(), None)
			.await
			.unwrap();
		let token = engine.token_for(&order);
		let cancelled = engine
			.submit(&order.id, OrderAction::Cancel, Some(&token))
			.await
			.unwrap();
		assert_eq!(cancelled.status, OrderStatus::Cancelled);

		let token = engine.token_for(&cancelled);
		for action in OrderAction::all() {
			let result = engine.submit(&order.id, action, Some(&token)).await;
			assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));
		}
	}

	#[tokio::test]
	async fn concurrent_cancel_and_accept_have_one_winner() {
		let engine = Arc::new(engine());
		let order = paid_order(&engine).await;
		assert_eq!(order.status, OrderStatus::PendingAcceptance);
		let base_version = order.version;

		// Both callers read the same snapshot before either writes.
		let token = engine.token_for(&order);

		let cancel = {
			let engine = Arc::clone(&engine);
			let id = order.id.clone();
			let token = token.clone();
			tokio::spawn(
				async move { engine.submit(&id, OrderAction::Cancel, Some(&token)).await },
			)
		};
		let accept = {
			let engine = Arc::clone(&engine);
			let id = order.id.clone();
			let token = token.clone();
			tokio::spawn(
				async move { engine.submit(&id, OrderAction::Accept, Some(&token)).await },
			)
		};

		let results = [cancel.await.unwrap(), accept.await.unwrap()];
		let winners: Vec<_> = results.iter().filter(|r| r.is_ok()).collect();
		assert_eq!(winners.len(), 1);

		let winner = winners[0].as_ref().unwrap();
		assert!(matches!(
			winner.status,
			OrderStatus::Cancelled | OrderStatus::Preparing
		));
		assert_eq!(winner.version, base_version + 1);

		let loser = results.iter().find(|r| r.is_err()).unwrap();
		match loser {
			Err(OrderError::PreconditionFailed { current_version }) => {
				assert_eq!(*current_version, base_version + 1);
			},
			other => panic!("expected PreconditionFailed, got {:?}", other),
		}

		// The committed state is the winner's, at exactly one version bump.
		let stored = engine.get_order(&order.id).await.unwrap();
		assert_eq!(stored.version, base_version + 1);
		assert_eq!(stored.status, winner.status);
	}
}
