//! HTTP server for the QuickEats order API.
//!
//! This module provides the router and server infrastructure for the order
//! API: one read endpoint, one creation endpoint, and one POST endpoint per
//! state-machine action, all dispatched statically.

use crate::apis;
use axum::{
	routing::{get, post},
	Router,
};
use quickeats_config::ApiConfig;
use quickeats_core::{IdempotencyLayer, OrderEngine};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the order engine for executing transitions.
	pub engine: Arc<OrderEngine>,
	/// Idempotency interceptor wrapping every mutating endpoint.
	pub idempotency: Arc<IdempotencyLayer>,
}

/// Builds the router with the /api base path and all order endpoints.
pub fn build_router(state: AppState) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/orders", post(apis::order::create_order))
				.route("/orders/{id}", get(apis::order::get_order))
				.route("/orders/{id}/payment", post(apis::order::payment))
				.route("/orders/{id}/cancellation", post(apis::order::cancellation))
				.route("/orders/{id}/acceptance", post(apis::order::acceptance))
				.route("/orders/{id}/rejection", post(apis::order::rejection))
				.route(
					"/orders/{id}/preparation-complete",
					post(apis::order::preparation_complete),
				)
				.route("/orders/{id}/pickup", post(apis::order::pickup))
				.route("/orders/{id}/delivery", post(apis::order::delivery)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

/// Starts the HTTP server for the API.
pub async fn start_server(api_config: ApiConfig, state: AppState) -> Result<(), std::io::Error> {
	let app = build_router(state);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("QuickEats order API server starting on {}", bind_address);

	axum::serve(listener, app).await
}
