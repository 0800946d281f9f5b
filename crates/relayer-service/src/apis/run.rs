//! Execution endpoints.
//!
//! `POST /run` relays one caller-specified order and fails with the first
//! error it meets. `GET /execute-all` relays every pending order and only
//! fails when the pending set itself cannot be read.

use crate::server::AppState;
use axum::{
	extract::{rejection::JsonRejection, State},
	Json,
};
use relayer_types::{APIError, ExecuteAllResponse, RunRequest, RunResponse};

/// Handles POST /run requests.
pub async fn handle_run(
	State(state): State<AppState>,
	payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Json<RunResponse>, APIError> {
	let Json(request) = payload.map_err(|rejection| APIError::BadRequest {
		error_type: "VALIDATION_ERROR".to_string(),
		message: rejection.body_text(),
	})?;

	match state.relayer.execute_order(&request).await {
		Ok(outcome) => Ok(Json(RunResponse::from(outcome))),
		Err(e) => {
			tracing::warn!(code = e.code(), "Run request failed: {}", e);
			Err(APIError::from(e))
		},
	}
}

/// Handles GET /execute-all requests.
pub async fn handle_execute_all(
	State(state): State<AppState>,
) -> Result<Json<ExecuteAllResponse>, APIError> {
	match state.relayer.execute_all().await {
		Ok(result) => Ok(Json(ExecuteAllResponse::from(result))),
		Err(e) => {
			tracing::error!(code = e.code(), "Batch execution failed: {}", e);
			Err(APIError::from(e))
		},
	}
}
