//! API types for the QuickEats order HTTP API.
//!
//! This module defines the request and response types for the order API
//! endpoints, plus the structured error type with its HTTP status mapping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Request body for creating a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
	/// Restaurant the order is placed with.
	pub restaurant_name: String,
	/// Rider assigned to the order, if known at creation.
	#[serde(default)]
	pub rider_name: Option<String>,
}

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
	/// Authoritative version of the entity at the time of a concurrency
	/// conflict, so the caller can re-read and retry.
	#[serde(rename = "currentVersion", skip_serializing_if = "Option::is_none")]
	pub current_version: Option<u64>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum ApiError {
	/// Bad request: malformed input or an illegal state transition (400)
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Mutating call without a concurrency token (428)
	PreconditionRequired { message: String },
	/// Stale concurrency token (412)
	PreconditionFailed {
		message: String,
		current_version: u64,
	},
	/// Unknown entity (404)
	NotFound { message: String },
	/// Internal server error (500)
	InternalServerError { message: String },
}

impl ApiError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			ApiError::BadRequest { .. } => 400,
			ApiError::NotFound { .. } => 404,
			ApiError::PreconditionFailed { .. } => 412,
			ApiError::PreconditionRequired { .. } => 428,
			ApiError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			ApiError::BadRequest {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
				current_version: None,
			},
			ApiError::PreconditionRequired { message } => ErrorResponse {
				error: "PRECONDITION_REQUIRED".to_string(),
				message: message.clone(),
				details: None,
				current_version: None,
			},
			ApiError::PreconditionFailed {
				message,
				current_version,
			} => ErrorResponse {
				error: "PRECONDITION_FAILED".to_string(),
				message: message.clone(),
				details: None,
				current_version: Some(*current_version),
			},
			ApiError::NotFound { message } => ErrorResponse {
				error: "ORDER_NOT_FOUND".to_string(),
				message: message.clone(),
				details: None,
				current_version: None,
			},
			ApiError::InternalServerError { message } => ErrorResponse {
				error: "INTERNAL_ERROR".to_string(),
				message: message.clone(),
				details: None,
				current_version: None,
			},
		}
	}
}

impl fmt::Display for ApiError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ApiError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			ApiError::PreconditionRequired { message } => {
				write!(f, "Precondition Required: {}", message)
			},
			ApiError::PreconditionFailed { message, .. } => {
				write!(f, "Precondition Failed: {}", message)
			},
			ApiError::NotFound { message } => write!(f, "Not Found: {}", message),
			ApiError::InternalServerError { message } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for ApiError {}

impl axum::response::IntoResponse for ApiError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		let error_response = self.to_error_response();
		(status, Json(error_response)).into_response()
	}
}
