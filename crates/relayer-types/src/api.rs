//! API types for the relayer HTTP surface.
//!
//! The request shape converges on `{orderId, proofIndex}`; the historical
//! field names `assetIndex` and `index` are still accepted as aliases.

use crate::{BatchResult, ExecutionOutcome, PendingOrder};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /run`.
///
/// Both fields are optional at the wire level so that a missing field is
/// reported as a validation error by the orchestrator instead of a generic
/// deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
	#[serde(rename = "orderId", default)]
	pub order_id: Option<u64>,
	#[serde(
		rename = "proofIndex",
		alias = "assetIndex",
		alias = "index",
		default
	)]
	pub proof_index: Option<u64>,
}

impl RunRequest {
	pub fn new(order_id: u64, proof_index: u64) -> Self {
		Self {
			order_id: Some(order_id),
			proof_index: Some(proof_index),
		}
	}
}

/// Success body of `POST /run`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
	pub status: String,
	#[serde(rename = "txHash")]
	pub tx_hash: String,
}

impl From<ExecutionOutcome> for RunResponse {
	fn from(outcome: ExecutionOutcome) -> Self {
		Self {
			status: "success".to_string(),
			tx_hash: outcome.tx_hash.unwrap_or_default(),
		}
	}
}

/// Success body of `GET /execute-all`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteAllResponse {
	pub status: String,
	pub executed: Vec<ExecutionOutcome>,
}

impl From<BatchResult> for ExecuteAllResponse {
	fn from(result: BatchResult) -> Self {
		Self {
			status: "success".to_string(),
			executed: result.executed,
		}
	}
}

/// Body of `GET /orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOrdersResponse {
	pub orders: Vec<PendingOrder>,
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Always `"error"`.
	pub status: String,
	/// Machine-readable error code.
	pub error: String,
	/// Human-readable description.
	pub message: String,
}

/// Structured API error type with HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Missing or malformed request fields (400).
	BadRequest { error_type: String, message: String },
	/// Order absent on the ledger (404).
	NotFound { error_type: String, message: String },
	/// Upstream proof service failure (502).
	BadGateway { error_type: String, message: String },
	/// Submission or ledger failure (500).
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	pub fn status_code(&self) -> StatusCode {
		match self {
			APIError::BadRequest { .. } => StatusCode::BAD_REQUEST,
			APIError::NotFound { .. } => StatusCode::NOT_FOUND,
			APIError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
			APIError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	pub fn to_error_response(&self) -> ErrorResponse {
		let (error_type, message) = match self {
			APIError::BadRequest {
				error_type,
				message,
			}
			| APIError::NotFound {
				error_type,
				message,
			}
			| APIError::BadGateway {
				error_type,
				message,
			}
			| APIError::InternalServerError {
				error_type,
				message,
			} => (error_type, message),
		};

		ErrorResponse {
			status: "error".to_string(),
			error: error_type.clone(),
			message: message.clone(),
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let response = self.to_error_response();
		write!(f, "{} ({}): {}", self.status_code(), response.error, response.message)
	}
}

impl std::error::Error for APIError {}

impl IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		(self.status_code(), Json(self.to_error_response())).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_run_request_canonical_shape() {
		let request: RunRequest = serde_json::from_str(r#"{"orderId": 42, "proofIndex": 7}"#).unwrap();
		assert_eq!(request, RunRequest::new(42, 7));
	}

	#[test]
	fn test_run_request_legacy_aliases() {
		let asset: RunRequest = serde_json::from_str(r#"{"orderId": 1, "assetIndex": 3}"#).unwrap();
		assert_eq!(asset.proof_index, Some(3));

		let index: RunRequest = serde_json::from_str(r#"{"orderId": 1, "index": 4}"#).unwrap();
		assert_eq!(index.proof_index, Some(4));
	}

	#[test]
	fn test_run_request_missing_fields_deserialize_as_none() {
		let request: RunRequest = serde_json::from_str(r#"{"orderId": 42}"#).unwrap();
		assert_eq!(request.order_id, Some(42));
		assert!(request.proof_index.is_none());
	}

	#[test]
	fn test_api_error_status_mapping() {
		let err = APIError::BadGateway {
			error_type: "ORACLE_ERROR".to_string(),
			message: "no proof".to_string(),
		};
		assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

		let body = err.to_error_response();
		assert_eq!(body.status, "error");
		assert_eq!(body.error, "ORACLE_ERROR");
	}
}
