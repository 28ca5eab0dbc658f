//! Order endpoint implementations.
//!
//! One handler per state-machine action plus creation and readback. Every
//! mutating handler runs inside the idempotency interceptor and presents the
//! caller's `If-Match` token to the engine; successful responses carry a
//! fresh `ETag` header derived from the committed version.

use crate::server::AppState;
use axum::{
	extract::{Path, State},
	http::{header, HeaderMap, HeaderValue, StatusCode},
	response::{IntoResponse, Json, Response},
};
use quickeats_core::{etag, OrderError};
use quickeats_types::{ApiError, CreateOrderRequest, Order, OrderAction};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Handles POST /api/orders requests.
pub async fn create_order(
	State(state): State<AppState>,
	Json(request): Json<CreateOrderRequest>,
) -> Result<Response, ApiError> {
	let order = state
		.engine
		.create_order(request.restaurant_name, request.rider_name)
		.await
		.map_err(api_error)?;

	info!(order_id = %order.id, "Created order via API");
	Ok(order_response(StatusCode::CREATED, &order))
}

/// Handles GET /api/orders/{id} requests.
///
/// Returns the current order state together with its concurrency token in
/// the `ETag` header. Never mutates the stored record.
pub async fn get_order(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Response, ApiError> {
	let order = state.engine.get_order(&id).await.map_err(api_error)?;
	Ok(order_response(StatusCode::OK, &order))
}

/// Handles POST /api/orders/{id}/payment requests.
pub async fn payment(
	State(state): State<AppState>,
	Path(id): Path<String>,
	headers: HeaderMap,
) -> Response {
	transition(state, id, OrderAction::Pay, headers).await
}

/// Handles POST /api/orders/{id}/cancellation requests.
pub async fn cancellation(
	State(state): State<AppState>,
	Path(id): Path<String>,
	headers: HeaderMap,
) -> Response {
	transition(state, id, OrderAction::Cancel, headers).await
}

/// Handles POST /api/orders/{id}/acceptance requests.
pub async fn acceptance(
	State(state): State<AppState>,
	Path(id): Path<String>,
	headers: HeaderMap,
) -> Response {
	transition(state, id, OrderAction::Accept, headers).await
}

/// Handles POST /api/orders/{id}/rejection requests.
pub async fn rejection(
	State(state): State<AppState>,
	Path(id): Path<String>,
	headers: HeaderMap,
) -> Response {
	transition(state, id, OrderAction::Reject, headers).await
}

/// Handles POST /api/orders/{id}/preparation-complete requests.
pub async fn preparation_complete(
	State(state): State<AppState>,
	Path(id): Path<String>,
	headers: HeaderMap,
) -> Response {
	transition(state, id, OrderAction::CompletePreparation, headers).await
}

/// Handles POST /api/orders/{id}/pickup requests.
pub async fn pickup(
	State(state): State<AppState>,
	Path(id): Path<String>,
	headers: HeaderMap,
) -> Response {
	transition(state, id, OrderAction::Pickup, headers).await
}

/// Handles POST /api/orders/{id}/delivery requests.
pub async fn delivery(
	State(state): State<AppState>,
	Path(id): Path<String>,
	headers: HeaderMap,
) -> Response {
	transition(state, id, OrderAction::Deliver, headers).await
}

/// Executes one state-machine action under the idempotency interceptor.
///
/// The request body is opaque domain payload and is deliberately not
/// extracted; the mechanics only read the `If-Match` and `Idempotency-Key`
/// headers.
async fn transition(
	state: AppState,
	id: String,
	action: OrderAction,
	headers: HeaderMap,
) -> Response {
	let if_match = header_string(&headers, header::IF_MATCH.as_str());
	let idempotency_key = header_string(&headers, "Idempotency-Key");

	let engine = Arc::clone(&state.engine);
	let result = state
		.idempotency
		.execute(idempotency_key.as_deref(), move || async move {
			outcome_of(engine.submit(&id, action, if_match.as_deref()).await)
		})
		.await;

	match result {
		Ok((status, body)) => render(status, body),
		Err(e) => {
			warn!(action = %action, "Order transition rejected: {}", e);
			api_error(e).into_response()
		},
	}
}

/// Extracts a header value as an owned string.
fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
	headers
		.get(name)
		.and_then(|v| v.to_str().ok())
		.map(str::to_owned)
}

/// Converts an engine result into an HTTP-shaped outcome for the
/// idempotency ledger.
fn outcome_of(result: Result<Order, OrderError>) -> (u16, serde_json::Value) {
	match result {
		Ok(order) => match serde_json::to_value(&order) {
			Ok(body) => (StatusCode::OK.as_u16(), body),
			Err(e) => {
				let api = ApiError::InternalServerError {
					message: e.to_string(),
				};
				(api.status_code(), error_body(&api))
			},
		},
		Err(e) => {
			let api = api_error(e);
			(api.status_code(), error_body(&api))
		},
	}
}

/// Maps core errors to their API representation and status code.
fn api_error(err: OrderError) -> ApiError {
	match err {
		OrderError::NotFound(id) => ApiError::NotFound {
			message: format!("Order not found: {}", id),
		},
		OrderError::PreconditionRequired => ApiError::PreconditionRequired {
			message: "The If-Match header is required for this operation".to_string(),
		},
		OrderError::PreconditionFailed { current_version } => ApiError::PreconditionFailed {
			message: "The order has been modified by another request".to_string(),
			current_version,
		},
		OrderError::InvalidTransition { status, action } => ApiError::BadRequest {
			error_type: "INVALID_STATE_TRANSITION".to_string(),
			message: format!(
				"Action '{}' is not allowed while the order is '{}'",
				action, status
			),
			details: Some(json!({ "status": status, "action": action })),
		},
		OrderError::InvalidIdempotencyKey(raw) => ApiError::BadRequest {
			error_type: "INVALID_IDEMPOTENCY_KEY".to_string(),
			message: format!("Invalid idempotency key '{}': must be a UUID", raw),
			details: None,
		},
		OrderError::Storage(message) => ApiError::InternalServerError { message },
	}
}

fn error_body(api: &ApiError) -> serde_json::Value {
	serde_json::to_value(api.to_error_response()).unwrap_or(serde_json::Value::Null)
}

/// Builds a response from a recorded or fresh outcome, attaching the
/// concurrency token header when the body is a successful order snapshot.
fn render(status: u16, body: serde_json::Value) -> Response {
	let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

	let token = if status.is_success() {
		match (
			body.get("id").and_then(|v| v.as_str()),
			body.get("version").and_then(|v| v.as_u64()),
		) {
			(Some(id), Some(version)) => Some(etag::compute(id, version)),
			_ => None,
		}
	} else {
		None
	};

	let mut response = (status, Json(body)).into_response();
	if let Some(token) = token {
		if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", token)) {
			response.headers_mut().insert(header::ETAG, value);
		}
	}
	response
}

/// Builds a success response for an order, with its `ETag` header.
fn order_response(status: StatusCode, order: &Order) -> Response {
	let token = etag::compute(&order.id, order.version);
	let mut response = (status, Json(order)).into_response();
	if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", token)) {
		response.headers_mut().insert(header::ETAG, value);
	}
	response
}
